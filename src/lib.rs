//! crisiswatch: macro-financial crisis stage monitor.
//!
//! Fetches market and macro indicators, evaluates configurable trigger rules
//! into a crisis stage, and values a fixed hedge portfolio. Hexagonal
//! architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
