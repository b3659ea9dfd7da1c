//! Economic-data adapter: one FRED series downloaded as CSV.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use tracing::{info, instrument};

use crate::adapters::http;
use crate::domain::error::FetchError;
use crate::domain::indicator::Indicator;
use crate::domain::snapshot::{SnapshotFragment, round2};
use crate::ports::source_port::IndicatorSource;

pub const DEFAULT_BASE_URL: &str = "https://fred.stlouisfed.org";
pub const BREAKEVEN_SERIES: &str = "T10YIE";
const SOURCE_NAME: &str = "fred";

/// Latest non-missing observation of `series_id` in a fredgraph CSV.
///
/// FRED writes `.` for days without an observation. The value column is
/// located by header name, falling back to the second column.
pub fn parse_latest_observation(
    series_id: &str,
    body: &str,
) -> Result<(NaiveDate, f64), FetchError> {
    let parse_err = |reason: String| FetchError::Parse {
        source_name: SOURCE_NAME.into(),
        reason,
    };

    let mut rdr = csv::Reader::from_reader(body.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| parse_err(format!("CSV header error: {}", e)))?
        .clone();
    let column = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(series_id))
        .unwrap_or(1);
    if headers.len() <= column {
        return Err(parse_err(format!(
            "expected a value column for {}, got headers {:?}",
            series_id,
            headers.iter().collect::<Vec<_>>()
        )));
    }

    let mut latest: Option<(NaiveDate, f64)> = None;
    for result in rdr.records() {
        let record = result.map_err(|e| parse_err(format!("CSV parse error: {}", e)))?;
        let raw = record.get(column).unwrap_or("").trim();
        if raw.is_empty() || raw == "." {
            continue;
        }
        let date_str = record.get(0).unwrap_or("").trim();
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|e| parse_err(format!("invalid date '{}': {}", date_str, e)))?;
        let value: f64 = raw
            .parse()
            .map_err(|e| parse_err(format!("invalid value '{}' on {}: {}", raw, date, e)))?;

        if latest.is_none_or(|(d, _)| date >= d) {
            latest = Some((date, value));
        }
    }

    latest.ok_or_else(|| FetchError::MissingField {
        source_name: SOURCE_NAME.into(),
        field: series_id.to_string(),
    })
}

pub struct FredSeriesSource {
    client: Client,
    base_url: String,
    series_id: String,
    indicator: Indicator,
}

impl FredSeriesSource {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        series_id: impl Into<String>,
        indicator: Indicator,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            series_id: series_id.into(),
            indicator,
        }
    }

    fn csv_url(&self) -> String {
        format!(
            "{}/graph/fredgraph.csv?id={}",
            self.base_url.trim_end_matches('/'),
            self.series_id
        )
    }
}

impl IndicatorSource for FredSeriesSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    #[instrument(skip(self), fields(series = %self.series_id), name = "fred::fetch")]
    fn fetch(&self) -> Result<SnapshotFragment, FetchError> {
        let body = http::get_text(&self.client, SOURCE_NAME, &self.csv_url())?;
        let (date, value) = parse_latest_observation(&self.series_id, &body)?;
        info!(%date, value, "series fetched");
        Ok(SnapshotFragment::from_values(vec![(
            self.indicator,
            round2(value),
        )]))
    }
}
