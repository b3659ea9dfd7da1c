//! Web server adapter.
//!
//! Serves the dashboard, its chart, a JSON status endpoint and a refresh
//! action over axum. Sources perform blocking I/O, so every evaluation runs
//! on tokio's blocking pool.

mod error;
mod handlers;
mod templates;

pub use error::WebError;
pub use handlers::*;
pub use templates::*;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::adapters::html_report_adapter::DashboardOptions;
use crate::domain::portfolio::PortfolioPosition;
use crate::domain::stage::StageDefinition;
use crate::ports::source_port::SharedSource;

pub struct AppState {
    pub sources: Vec<SharedSource>,
    pub stages: Vec<StageDefinition>,
    pub positions: Vec<PortfolioPosition>,
    pub options: DashboardOptions,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/chart.svg", get(handlers::chart_svg))
        .route("/api/status", get(handlers::api_status))
        .route("/refresh", post(handlers::refresh))
        .fallback(handlers::not_found)
        .with_state(state)
}
