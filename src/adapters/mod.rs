//! Concrete adapter implementations for ports.

pub mod cached_source;
pub mod chart_svg;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod fred_adapter;
pub mod html_report_adapter;
pub mod http;
pub mod status_json;
pub mod tic_adapter;
#[cfg(feature = "web")]
pub mod web;
pub mod yahoo_adapter;
