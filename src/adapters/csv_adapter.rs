//! Offline CSV data adapter.
//!
//! Reads one `<KEY>.csv` file per indicator from a directory, each with a
//! `date,close` header. Blank closes mark days without an observation. Lets
//! the monitor run against recorded data with no network access.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::error::FetchError;
use crate::domain::history::{ClosePoint, PriceHistory};
use crate::domain::indicator::Indicator;
use crate::domain::snapshot::{SnapshotFragment, round2};
use crate::ports::source_port::IndicatorSource;

const SOURCE_NAME: &str = "csv";

pub struct CsvQuoteSource {
    base_path: PathBuf,
    indicators: Vec<Indicator>,
}

impl CsvQuoteSource {
    pub fn new(base_path: PathBuf, indicators: Vec<Indicator>) -> Self {
        Self {
            base_path,
            indicators,
        }
    }

    pub fn csv_path(&self, indicator: Indicator) -> PathBuf {
        self.base_path.join(format!("{}.csv", indicator.key()))
    }
}

/// Parse a `date,close` file body into points sorted by date.
pub fn parse_close_series(path: &Path, content: &str) -> Result<Vec<ClosePoint>, FetchError> {
    let parse_err = |reason: String| FetchError::Parse {
        source_name: SOURCE_NAME.into(),
        reason: format!("{}: {}", path.display(), reason),
    };

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut points = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| parse_err(format!("CSV parse error: {}", e)))?;

        let date_str = record
            .get(0)
            .ok_or_else(|| parse_err("missing date column".into()))?
            .trim();
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|e| parse_err(format!("invalid date format: {}", e)))?;

        let raw = record.get(1).unwrap_or("").trim();
        if raw.is_empty() {
            continue;
        }
        let close: f64 = raw
            .parse()
            .map_err(|e| parse_err(format!("invalid close value '{}': {}", raw, e)))?;

        points.push(ClosePoint { date, close });
    }

    points.sort_by_key(|p| p.date);
    Ok(points)
}

impl IndicatorSource for CsvQuoteSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn fetch(&self) -> Result<SnapshotFragment, FetchError> {
        let mut series = Vec::new();
        let mut values = Vec::new();

        for &indicator in &self.indicators {
            let path = self.csv_path(indicator);
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %path.display(), "no data file");
                    continue;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "data file unreadable");
                    continue;
                }
            };

            let points = match parse_close_series(&path, &content) {
                Ok(points) => points,
                Err(e) => {
                    warn!(error = %e, "data file skipped");
                    continue;
                }
            };

            if let Some(last) = points.last() {
                values.push((indicator, round2(last.close)));
            }
            if indicator.ticker().is_some() {
                series.push((indicator, points));
            }
        }

        if values.is_empty() {
            return Err(FetchError::MissingField {
                source_name: SOURCE_NAME.into(),
                field: format!("any readable series in {}", self.base_path.display()),
            });
        }

        info!(series = values.len(), dir = %self.base_path.display(), "offline data loaded");
        let history = (!series.is_empty()).then(|| PriceHistory::from_series(series));
        Ok(SnapshotFragment { values, history })
    }
}
