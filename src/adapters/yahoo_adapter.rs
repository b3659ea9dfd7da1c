//! Quote-provider adapter (Yahoo Finance chart API).
//!
//! Fetches daily closes for each configured instrument over a bounded range
//! (`2y` by default), aligns them into a [`PriceHistory`], and reduces each
//! instrument to its most recent close.

use chrono::DateTime;
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::adapters::http;
use crate::domain::error::FetchError;
use crate::domain::history::{ClosePoint, PriceHistory};
use crate::domain::indicator::Indicator;
use crate::domain::snapshot::{SnapshotFragment, round2};
use crate::ports::source_port::IndicatorSource;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_RANGE: &str = "2y";
const SOURCE_NAME: &str = "quotes";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Decode a chart response into dated closes, oldest first.
///
/// Timestamps are shifted by the exchange's GMT offset so a session's close
/// lands on its local trading date. Null closes are skipped.
pub fn parse_chart_response(ticker: &str, body: &str) -> Result<Vec<ClosePoint>, FetchError> {
    let envelope: ChartEnvelope = serde_json::from_str(body).map_err(|e| FetchError::Parse {
        source_name: SOURCE_NAME.into(),
        reason: format!("{}: {}", ticker, e),
    })?;

    if let Some(err) = envelope.chart.error {
        return Err(FetchError::Parse {
            source_name: SOURCE_NAME.into(),
            reason: format!("{}: {} ({})", ticker, err.description, err.code),
        });
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::MissingField {
            source_name: SOURCE_NAME.into(),
            field: format!("{}: chart.result", ticker),
        })?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .ok_or_else(|| FetchError::MissingField {
            source_name: SOURCE_NAME.into(),
            field: format!("{}: indicators.quote", ticker),
        })?;

    if closes.len() != result.timestamp.len() {
        return Err(FetchError::Parse {
            source_name: SOURCE_NAME.into(),
            reason: format!(
                "{}: {} timestamps but {} closes",
                ticker,
                result.timestamp.len(),
                closes.len()
            ),
        });
    }

    let offset = result.meta.map(|m| m.gmtoffset).unwrap_or(0);
    let mut points: Vec<ClosePoint> = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let close = close.filter(|c| c.is_finite())?;
            let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
            Some(ClosePoint { date, close })
        })
        .collect();

    // An intraday bar for today can share a date with the last daily bar.
    points.dedup_by(|later, earlier| {
        if later.date == earlier.date {
            earlier.close = later.close;
            true
        } else {
            false
        }
    });

    Ok(points)
}

pub struct YahooQuoteSource {
    client: Client,
    base_url: String,
    range: String,
    instruments: Vec<Indicator>,
}

impl YahooQuoteSource {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        range: impl Into<String>,
        instruments: Vec<Indicator>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            range: range.into(),
            instruments,
        }
    }

    fn chart_url(&self, ticker: &str) -> Result<Url, FetchError> {
        let invalid = |reason: String| FetchError::Network {
            source_name: SOURCE_NAME.into(),
            reason,
        };
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("invalid base url {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("base url {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", ticker]);
        url.query_pairs_mut()
            .append_pair("range", &self.range)
            .append_pair("interval", "1d");
        Ok(url)
    }

    fn fetch_one(&self, ticker: &str) -> Result<Vec<ClosePoint>, FetchError> {
        let url = self.chart_url(ticker)?;
        let body = http::get_text(&self.client, SOURCE_NAME, url.as_str())?;
        parse_chart_response(ticker, &body)
    }
}

impl IndicatorSource for YahooQuoteSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    #[instrument(skip(self), name = "quotes::fetch")]
    fn fetch(&self) -> Result<SnapshotFragment, FetchError> {
        let mut series = Vec::with_capacity(self.instruments.len());
        let mut first_error = None;

        for &indicator in &self.instruments {
            let Some(ticker) = indicator.ticker() else {
                continue;
            };
            match self.fetch_one(ticker) {
                Ok(points) => series.push((indicator, points)),
                Err(e) => {
                    warn!(ticker, error = %e, "instrument unavailable");
                    first_error.get_or_insert(e);
                }
            }
        }

        if series.is_empty() {
            return Err(first_error.unwrap_or_else(|| FetchError::MissingField {
                source_name: SOURCE_NAME.into(),
                field: "instruments".into(),
            }));
        }

        let history = PriceHistory::from_series(series);
        let values: Vec<(Indicator, f64)> = history
            .instruments()
            .filter_map(|ind| history.latest(ind).map(|p| (ind, round2(p.close))))
            .collect();
        info!(
            instruments = values.len(),
            rows = history.len(),
            "quotes fetched"
        );

        Ok(SnapshotFragment {
            values,
            history: Some(history),
        })
    }
}
