//! Configuration validation.
//!
//! Checks every scalar setting up front so a bad config fails before any
//! network traffic. Trigger expressions and position lists are checked when
//! they are parsed.

use chrono::NaiveDate;

use crate::domain::error::CrisisWatchError;
use crate::domain::stage::Stage;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), CrisisWatchError> {
    validate_mode(config)?;
    validate_positive_int(config, "sources", "timeout_secs")?;
    validate_non_negative_int(config, "sources", "market_ttl_secs")?;
    validate_non_negative_int(config, "sources", "holdings_ttl_secs")?;
    validate_positive_int(config, "stages", "activation_threshold")?;
    validate_holdings_floor(config)?;
    for section in Stage::ALL.into_iter().filter_map(Stage::config_section) {
        validate_positive_int(config, section, "threshold")?;
    }
    validate_start_date(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> CrisisWatchError {
    CrisisWatchError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_mode(config: &dyn ConfigPort) -> Result<(), CrisisWatchError> {
    let mode = config
        .get_string("sources", "mode")
        .unwrap_or_else(|| "live".into());
    match mode.trim().to_lowercase().as_str() {
        "live" => Ok(()),
        "offline" => match config.get_string("sources", "data_dir") {
            Some(dir) if !dir.trim().is_empty() => Ok(()),
            _ => Err(CrisisWatchError::ConfigMissing {
                section: "sources".into(),
                key: "data_dir".into(),
            }),
        },
        other => Err(invalid(
            "sources",
            "mode",
            format!("'{}' is not one of live, offline", other),
        )),
    }
}

/// Absent keys pass; present keys must be integers.
fn read_int(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<i64>, CrisisWatchError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("'{}' is not an integer", raw.trim()))),
    }
}

fn validate_positive_int(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), CrisisWatchError> {
    match read_int(config, section, key)? {
        Some(v) if v < 1 => Err(invalid(section, key, format!("{} must be at least 1", key))),
        _ => Ok(()),
    }
}

fn validate_non_negative_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), CrisisWatchError> {
    match read_int(config, section, key)? {
        Some(v) if v < 0 => Err(invalid(section, key, format!("{} must be non-negative", key))),
        _ => Ok(()),
    }
}

fn validate_holdings_floor(config: &dyn ConfigPort) -> Result<(), CrisisWatchError> {
    let Some(raw) = config.get_string("stages", "foreign_holdings_floor") else {
        return Ok(());
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(()),
        _ => Err(invalid(
            "stages",
            "foreign_holdings_floor",
            "foreign_holdings_floor must be a positive number of billions",
        )),
    }
}

fn validate_start_date(config: &dyn ConfigPort) -> Result<(), CrisisWatchError> {
    let Some(raw) = config.get_string("portfolio", "start_date") else {
        return Ok(());
    };
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| invalid("portfolio", "start_date", "invalid start_date format, expected YYYY-MM-DD"))
}
