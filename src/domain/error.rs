//! Domain error types.

use crate::domain::indicator::Indicator;

/// A parse error with position information for rule conditions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Failure at a fetcher boundary. Collapses to "indicator unavailable" in the
/// snapshot; never aborts a cycle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("{source_name}: network error: {reason}")]
    Network { source_name: String, reason: String },

    #[error("{source_name}: HTTP status {status}")]
    Status { source_name: String, status: u16 },

    #[error("{source_name}: malformed response: {reason}")]
    Parse { source_name: String, reason: String },

    #[error("{source_name}: missing field {field}")]
    MissingField { source_name: String, field: String },
}

impl FetchError {
    pub fn source_name(&self) -> &str {
        match self {
            FetchError::Network { source_name, .. }
            | FetchError::Status { source_name, .. }
            | FetchError::Parse { source_name, .. }
            | FetchError::MissingField { source_name, .. } => source_name,
        }
    }
}

/// Failure to locate or read the "Grand Total" row of a holdings report.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HoldingsParseError {
    #[error("no \"Grand Total\" row found")]
    MissingRow,

    #[error("\"Grand Total\" row on line {line} has no readable values: {reason}")]
    InvalidRow { line: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValuationError {
    #[error("current price unavailable for held instrument {instrument}")]
    PriceUnavailable { instrument: Indicator },
}

/// Top-level error type for crisiswatch.
#[derive(Debug, thiserror::Error)]
pub enum CrisisWatchError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    /// `context` is the expression with a caret under the failing position.
    #[error("failed to parse [{section}] {key}:\n{context}")]
    RuleParse {
        section: String,
        key: String,
        context: String,
    },

    #[error("invalid rule: {reason}")]
    RuleInvalid { reason: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Valuation(#[from] ValuationError),

    #[error("invalid position {instrument}: {reason}")]
    InvalidPosition { instrument: String, reason: String },

    #[error("report rendering failed: {reason}")]
    Render { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&CrisisWatchError> for std::process::ExitCode {
    fn from(err: &CrisisWatchError) -> Self {
        let code: u8 = match err {
            CrisisWatchError::Io(_) | CrisisWatchError::Render { .. } => 1,
            CrisisWatchError::ConfigParse { .. }
            | CrisisWatchError::ConfigMissing { .. }
            | CrisisWatchError::ConfigInvalid { .. }
            | CrisisWatchError::InvalidPosition { .. } => 2,
            CrisisWatchError::Fetch(_) => 3,
            CrisisWatchError::RuleParse { .. } | CrisisWatchError::RuleInvalid { .. } => 4,
            CrisisWatchError::Valuation(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
