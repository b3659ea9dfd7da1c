//! Parser for the Treasury's "Major Foreign Holders" text report.
//!
//! The report is a fixed-width table. Only the `Grand Total` row matters: its
//! first numeric column is the most recent month and the second is the month
//! before, both in billions of dollars.

use crate::domain::error::HoldingsParseError;

const ROW_LABEL: &str = "Grand Total";
/// Label words plus at least four columns of figures.
const MIN_ROW_TOKENS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForeignHoldings {
    pub latest: f64,
    pub previous: f64,
}

impl ForeignHoldings {
    /// Month-over-month change in billions.
    pub fn change(&self) -> f64 {
        self.latest - self.previous
    }
}

/// Locate the first readable `Grand Total` row and return its two most
/// recent monthly figures.
///
/// Rows that carry the label but whose figures do not parse are skipped, so a
/// header or footnote mentioning "Grand Total" cannot shadow the real row.
pub fn parse_grand_total(report: &str) -> Result<ForeignHoldings, HoldingsParseError> {
    let mut last_failure = None;

    for (idx, line) in report.lines().enumerate() {
        if !line.contains(ROW_LABEL) {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < MIN_ROW_TOKENS {
            continue;
        }

        match (parse_figure(tokens[2]), parse_figure(tokens[3])) {
            (Some(latest), Some(previous)) => return Ok(ForeignHoldings { latest, previous }),
            _ => {
                last_failure = Some(HoldingsParseError::InvalidRow {
                    line: idx + 1,
                    reason: format!("cannot read '{}' '{}' as figures", tokens[2], tokens[3]),
                });
            }
        }
    }

    Err(last_failure.unwrap_or(HoldingsParseError::MissingRow))
}

fn parse_figure(token: &str) -> Option<f64> {
    let cleaned: String = token.chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
