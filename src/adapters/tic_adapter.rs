//! Treasury International Capital adapter: foreign holdings of US Treasuries.

use reqwest::blocking::Client;
use tracing::{info, instrument};

use crate::adapters::http;
use crate::domain::error::FetchError;
use crate::domain::holdings_report::parse_grand_total;
use crate::domain::indicator::Indicator;
use crate::domain::snapshot::{SnapshotFragment, round2};
use crate::ports::source_port::IndicatorSource;

pub const DEFAULT_REPORT_URL: &str = "https://ticdata.treasury.gov/Publish/mfh.txt";
const SOURCE_NAME: &str = "tic";

pub struct TicHoldingsSource {
    client: Client,
    report_url: String,
}

impl TicHoldingsSource {
    pub fn new(client: Client, report_url: impl Into<String>) -> Self {
        Self {
            client,
            report_url: report_url.into(),
        }
    }
}

/// Turn a report body into the holdings level and its month-over-month change.
pub fn holdings_fragment(report: &str) -> Result<SnapshotFragment, FetchError> {
    let holdings = parse_grand_total(report).map_err(|e| FetchError::Parse {
        source_name: SOURCE_NAME.into(),
        reason: e.to_string(),
    })?;
    Ok(SnapshotFragment::from_values(vec![
        (Indicator::ForeignHoldings, round2(holdings.latest)),
        (Indicator::ForeignHoldingsChange, round2(holdings.change())),
    ]))
}

impl IndicatorSource for TicHoldingsSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    #[instrument(skip(self), name = "tic::fetch")]
    fn fetch(&self) -> Result<SnapshotFragment, FetchError> {
        let body = http::get_text(&self.client, SOURCE_NAME, &self.report_url)?;
        let fragment = holdings_fragment(&body)?;
        info!(values = ?fragment.values, "holdings fetched");
        Ok(fragment)
    }
}
