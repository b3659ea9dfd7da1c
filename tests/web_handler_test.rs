#![cfg(feature = "web")]
//! Web handler integration tests: each route driven through the router with
//! in-memory sources.

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use crisiswatch::adapters::html_report_adapter::DashboardOptions;
use crisiswatch::adapters::web::{AppState, build_router};
use crisiswatch::domain::portfolio::{DEFAULT_POSITIONS, parse_positions};
use crisiswatch::domain::snapshot::SnapshotFragment;
use crisiswatch::domain::stage::{StageParams, default_stages};
use crisiswatch::ports::source_port::SharedSource;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use common::*;

fn create_test_app(sources: Vec<Arc<MockSource>>) -> Router {
    let state = AppState {
        sources: sources
            .into_iter()
            .map(|s| s as SharedSource)
            .collect(),
        stages: default_stages(&StageParams::default()),
        positions: parse_positions(DEFAULT_POSITIONS).unwrap(),
        options: DashboardOptions {
            title: "Test Watch".into(),
            portfolio_start: None,
            show_chart: true,
            live: false,
        },
    };
    build_router(Arc::new(state))
}

fn pre_stage_source() -> Arc<MockSource> {
    let mut fragment = SnapshotFragment::from_values(pre_stage_values());
    fragment.history = Some(history_for(
        Indicator::Gold,
        "2025-12-01",
        &[3200.0, 3250.0, 3300.0],
    ));
    Arc::new(MockSource::with_fragment("quotes", fragment))
}

async fn body_string(response: axum::response::Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&body).into_owned()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

mod dashboard_tests {
    use super::*;

    #[tokio::test]
    async fn dashboard_shows_current_stage() {
        let app = create_test_app(vec![pre_stage_source()]);

        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_string(response).await;
        assert!(html.contains("<title>Test Watch</title>"));
        assert!(html.contains("Pre — Cracks Visible"));
        assert!(html.contains(r#"<form method="post" action="/refresh""#));
    }

    #[tokio::test]
    async fn dashboard_survives_failing_source() {
        let app = create_test_app(vec![
            pre_stage_source(),
            Arc::new(MockSource::failing("fred")),
        ]);

        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_string(response).await;
        assert!(html.contains("fred: network error: connection refused"));
    }

    #[tokio::test]
    async fn each_request_fetches_once_per_source() {
        let source = pre_stage_source();
        let app = create_test_app(vec![Arc::clone(&source)]);

        app.oneshot(get("/")).await.unwrap();
        assert_eq!(source.fetches(), 1);
    }
}

mod api_tests {
    use super::*;

    #[tokio::test]
    async fn status_endpoint_returns_json() {
        let app = create_test_app(vec![pre_stage_source()]);

        let response = app.oneshot(get("/api/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("application/json")
        );

        let value: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(value["current_stage"], "Pre");
        assert_eq!(value["indicators"]["TNX"], 4.6);
        assert_eq!(value["active_stages"], serde_json::json!(["Pre"]));
    }

    #[tokio::test]
    async fn chart_is_svg() {
        let app = create_test_app(vec![pre_stage_source()]);

        let response = app.oneshot(get("/chart.svg")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");

        let svg = body_string(response).await;
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("polyline"));
    }

    #[tokio::test]
    async fn chart_without_history_shows_placeholder() {
        let app = create_test_app(vec![Arc::new(MockSource::with_values(
            "quotes",
            &pre_stage_values(),
        ))]);

        let response = app.oneshot(get("/chart.svg")).await.unwrap();
        let svg = body_string(response).await;
        assert!(svg.contains("No price history available."));
    }
}

mod refresh_tests {
    use super::*;

    #[tokio::test]
    async fn refresh_invalidates_and_redirects() {
        let quotes = pre_stage_source();
        let fred = Arc::new(MockSource::failing("fred"));
        let app = create_test_app(vec![Arc::clone(&quotes), Arc::clone(&fred)]);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/refresh")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert_eq!(quotes.invalidations(), 1);
        assert_eq!(fred.invalidations(), 1);
        assert_eq!(quotes.fetches(), 0);
    }

    #[tokio::test]
    async fn refresh_rejects_get() {
        let app = create_test_app(vec![pre_stage_source()]);

        let response = app.oneshot(get("/refresh")).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

mod error_tests {
    use super::*;

    #[tokio::test]
    async fn unknown_path_is_404_page() {
        let app = create_test_app(vec![pre_stage_source()]);

        let response = app.oneshot(get("/history")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let html = body_string(response).await;
        assert!(html.contains("Error 404"));
        assert!(html.contains("No page at"));
    }
}
