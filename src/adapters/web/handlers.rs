//! HTTP request handlers for the web adapter.

use axum::{
    Json,
    extract::State,
    http::{Uri, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::info;

use crate::adapters::chart_svg::format_history_chart;
use crate::adapters::html_report_adapter::{DashboardOptions, render_dashboard};
use crate::adapters::status_json::cycle_json;
use crate::domain::cycle::{Cycle, run_cycle};
use crate::domain::indicator::Indicator;
use crate::ports::source_port::IndicatorSource;

use super::{AppState, WebError};

/// Run one evaluation cycle off the async executor.
pub async fn current_cycle(state: &Arc<AppState>) -> Result<Cycle, WebError> {
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || run_cycle(&state.sources, &state.stages, &state.positions))
        .await
        .map_err(|e| WebError::internal(format!("evaluation task failed: {}", e)))
}

pub async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Html<String>, WebError> {
    let cycle = current_cycle(&state).await?;
    let options = DashboardOptions {
        live: true,
        ..state.options.clone()
    };
    Ok(Html(render_dashboard(&cycle, &options)?))
}

pub async fn chart_svg(State(state): State<Arc<AppState>>) -> Result<Response, WebError> {
    let cycle = current_cycle(&state).await?;
    let svg = format_history_chart(&cycle.history, &Indicator::CHARTED);
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

pub async fn api_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, WebError> {
    let cycle = current_cycle(&state).await?;
    Ok(Json(cycle_json(&cycle)))
}

/// Drop cached source data, then send the browser back to the dashboard.
pub async fn refresh(State(state): State<Arc<AppState>>) -> Result<Redirect, WebError> {
    let cleared = Arc::clone(&state);
    tokio::task::spawn_blocking(move || {
        for source in &cleared.sources {
            source.invalidate();
        }
    })
    .await
    .map_err(|e| WebError::internal(format!("refresh task failed: {}", e)))?;

    info!(sources = state.sources.len(), "caches invalidated");
    Ok(Redirect::to("/"))
}

pub async fn not_found(uri: Uri) -> WebError {
    WebError::not_found(format!("No page at {}", uri.path()))
}
