#![allow(dead_code)]

use chrono::NaiveDate;
use crisiswatch::domain::error::FetchError;
use crisiswatch::domain::history::{ClosePoint, PriceHistory};
pub use crisiswatch::domain::indicator::Indicator;
use crisiswatch::domain::snapshot::SnapshotFragment;
use crisiswatch::ports::source_port::IndicatorSource;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source returning a fixed fragment or error, counting fetches and
/// invalidations.
pub struct MockSource {
    pub name: String,
    pub result: Result<SnapshotFragment, FetchError>,
    pub fetches: AtomicUsize,
    pub invalidations: AtomicUsize,
}

impl MockSource {
    pub fn with_values(name: &str, values: &[(Indicator, f64)]) -> Self {
        Self::with_fragment(name, SnapshotFragment::from_values(values.to_vec()))
    }

    pub fn with_fragment(name: &str, fragment: SnapshotFragment) -> Self {
        Self {
            name: name.to_string(),
            result: Ok(fragment),
            fetches: AtomicUsize::new(0),
            invalidations: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            result: Err(FetchError::Network {
                source_name: name.to_string(),
                reason: "connection refused".into(),
            }),
            fetches: AtomicUsize::new(0),
            invalidations: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl IndicatorSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<SnapshotFragment, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }

    fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

/// Values that satisfy all four built-in Pre triggers and nothing above.
pub fn pre_stage_values() -> Vec<(Indicator, f64)> {
    vec![
        (Indicator::TreasuryYield10y, 4.6),
        (Indicator::Breakeven10y, 3.1),
        (Indicator::Gold, 3300.0),
        (Indicator::ForeignHoldingsChange, -5.0),
        (Indicator::ForeignHoldings, 9245.0),
        (Indicator::Dxy, 99.0),
        (Indicator::Bitcoin, 89_500.0),
        (Indicator::UraniumEtf, 49.0),
        (Indicator::Cameco, 93.0),
    ]
}

pub fn history_for(indicator: Indicator, start: &str, closes: &[f64]) -> PriceHistory {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    let points = closes
        .iter()
        .zip(start.iter_days())
        .map(|(close, date)| ClosePoint {
            date,
            close: *close,
        })
        .collect();
    PriceHistory::from_series(vec![(indicator, points)])
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
