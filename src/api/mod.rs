//! REST API for the xDR dashboard
//!
//! Serves the dashboard page and JSON endpoints over one shared,
//! preloaded DashboardService.

pub mod handlers;
pub mod service;

pub use service::DashboardService;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_router(service: Arc<DashboardService>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/v1/health", get(handlers::health))
        // Page selection
        .route("/api/v1/pages", get(handlers::get_pages))
        .route("/api/v1/pages/:page", get(handlers::get_page))
        // Table access
        .route("/api/v1/table", get(handlers::get_table))
        .route("/api/v1/aggregate", get(handlers::get_aggregate))
        // State and middleware
        .with_state(service)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SessionRecord, SessionTable};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let record = |m: &str, t: &str| SessionRecord {
            handset_manufacturer: Some(m.into()),
            handset_type: Some(t.into()),
            google_volume: Some(20.0),
            email_volume: Some(5.0),
            ..Default::default()
        };
        let table = SessionTable::new(vec![record("Apple", "A"), record("Apple", "A"), record("Samsung", "B")]);
        create_router(Arc::new(DashboardService::new(table)))
    }

    async fn fetch(uri: &str) -> (StatusCode, Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(fetch("/api/v1/health").await, (StatusCode::OK, json!({"status": "ok"})));
    }

    #[tokio::test]
    async fn test_pages_list() {
        assert_eq!(fetch("/api/v1/pages").await, (StatusCode::OK, json!(["Handsets", "Applications"])));
    }

    #[tokio::test]
    async fn test_render_page() {
        let (status, body) = fetch("/api/v1/pages/Handsets").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], "Handsets");
        assert_eq!(body["sections"][0]["chart"]["type"], "treemap");
        assert_eq!(body["sections"][1]["chart"]["type"], "pie");

        let (status, body) = fetch("/api/v1/pages/applications").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Usage of applications");
        assert_eq!(body["sections"][1]["chart"]["type"], "table");
    }

    #[tokio::test]
    async fn test_unknown_page() {
        let (status, body) = fetch("/api/v1/pages/Overview").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("Overview"));
    }

    #[tokio::test]
    async fn test_aggregate_endpoint() {
        let (status, body) = fetch("/api/v1/aggregate?group=HandsetType&metric=HandsetType&agg=count&name=n").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["columns"], json!(["HandsetType", "n"]));
        assert_eq!(body["rows"], json!([{"HandsetType": "A", "n": 2}, {"HandsetType": "B", "n": 1}]));

        let (status, _) = fetch("/api/v1/aggregate?group=HandsetType&metric=IMEI&agg=sum").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_table_summary() {
        let (status, body) = fetch("/api/v1/table").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"], 3);
        assert_eq!(body["columns"].as_array().unwrap().len(), 18);
    }

    #[tokio::test]
    async fn test_index_is_html() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("Choose Page"));
    }

    #[tokio::test]
    async fn test_index_writes_values_as_text() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8_lossy(&bytes);

        assert!(html.contains("title.textContent = view.title"));
        assert!(html.contains("textContent = section.caption"));
        assert!(html.contains("message.textContent = section.chart.message"));
        assert!(html.contains("escape(r[c])"));
        assert!(!html.contains("${section.caption}"));
        assert!(!html.contains("${section.chart.message}"));
    }
}
