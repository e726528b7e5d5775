//! REST API handlers
//!
//! Thin wrappers that call into the shared DashboardService.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::service::{AggregateQuery, DashboardService, TableSummary};
use crate::views::{Page, PageView};

const INDEX_HTML: &str = include_str!("../../static/index.html");

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct TableResponse {
    pub rows: usize,
    pub columns: Vec<&'static str>,
    pub manufacturers: usize,
    pub handset_types: usize,
    pub total_data_volume: f64,
}

impl From<TableSummary> for TableResponse {
    fn from(s: TableSummary) -> Self {
        Self {
            rows: s.rows,
            columns: s.columns,
            manufacturers: s.manufacturers,
            handset_types: s.handset_types,
            total_data_volume: s.total_data_volume,
        }
    }
}

#[derive(Serialize)]
pub struct AggregateResponse {
    pub columns: [String; 2],
    pub rows: Vec<Value>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl ToString) -> ApiError {
    (status, Json(ErrorResponse { error: message.to_string() }))
}

// ============================================================================
// Handlers
// ============================================================================

pub type AppState = Arc<DashboardService>;

/// GET /
pub async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

/// GET /api/v1/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /api/v1/pages
pub async fn get_pages(State(service): State<AppState>) -> Json<Vec<Page>> {
    Json(service.pages())
}

/// GET /api/v1/pages/:page
pub async fn get_page(
    State(service): State<AppState>,
    Path(page): Path<String>,
) -> Result<Json<PageView>, ApiError> {
    match page.parse::<Page>() {
        Ok(page) => Ok(Json(service.render_page(page))),
        Err(e) => Err(error(StatusCode::NOT_FOUND, e)),
    }
}

/// GET /api/v1/table
pub async fn get_table(State(service): State<AppState>) -> Json<TableResponse> {
    Json(TableResponse::from(service.summary()))
}

/// GET /api/v1/aggregate?group=X&metric=Y&agg=count
pub async fn get_aggregate(
    State(service): State<AppState>,
    Query(params): Query<AggregateQuery>,
) -> Result<Json<AggregateResponse>, ApiError> {
    match service.aggregate(&params) {
        Ok(table) => Ok(Json(AggregateResponse {
            columns: [table.group_column.clone(), table.result_column.clone()],
            rows: table.to_records(),
        })),
        Err(e) => Err(error(StatusCode::BAD_REQUEST, e)),
    }
}
