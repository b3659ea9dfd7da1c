//! Core domain types and logic.

pub mod config_validation;
pub mod cycle;
pub mod error;
pub mod history;
pub mod holdings_report;
pub mod indicator;
pub mod portfolio;
pub mod rule;
pub mod rule_eval;
pub mod rule_parser;
pub mod snapshot;
pub mod stage;
pub mod stage_eval;
