//! Read-only company, metric history and score routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use metrics_core::{MetricHistoryPoint, MetricSource, MetricsError, ScoreRow};
use serde::Serialize;

use crate::{ApiResponse, AppError, AppState};

const HISTORY_YEARS: i64 = 5;

/// Map MetricsError to AppError with a matching status code.
fn store_err(e: MetricsError) -> AppError {
    let status = match e {
        MetricsError::NotFound(_) => StatusCode::NOT_FOUND,
        MetricsError::InvalidData(_) => StatusCode::BAD_REQUEST,
        MetricsError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    AppError::with_status(status, anyhow::anyhow!(e))
}

#[derive(Serialize)]
pub struct MetricHistoryResponse {
    pub company: String,
    pub metric: String,
    pub values: Vec<MetricHistoryPoint>,
}

#[derive(Serialize)]
pub struct ScoresResponse {
    pub year: i32,
    pub rows: Vec<ScoreRow>,
}

pub fn company_routes() -> Router<AppState> {
    Router::new()
        .route("/api/companies", get(list_companies))
        .route("/api/company/:name/metric/:metric", get(metric_history))
        .route("/api/scores/:year", get(year_scores))
}

async fn list_companies(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let companies = state.store.list_companies().await.map_err(store_err)?;
    Ok(Json(ApiResponse::success(companies)))
}

/// Last five fiscal years of one metric, newest first.
async fn metric_history(
    State(state): State<AppState>,
    Path((name, metric)): Path<(String, String)>,
) -> Result<Json<ApiResponse<MetricHistoryResponse>>, AppError> {
    let values = state
        .store
        .metric_history(&name, &metric, HISTORY_YEARS)
        .await
        .map_err(store_err)?;

    if values.is_empty() {
        return Err(AppError::with_status(
            StatusCode::NOT_FOUND,
            anyhow::anyhow!("No data found for {} / {}", name, metric),
        ));
    }

    Ok(Json(ApiResponse::success(MetricHistoryResponse {
        company: name,
        metric,
        values,
    })))
}

async fn year_scores(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<ApiResponse<ScoresResponse>>, AppError> {
    let table = state
        .assistant
        .engine()
        .compute_scores(&[year])
        .await
        .map_err(store_err)?;

    Ok(Json(ApiResponse::success(ScoresResponse {
        year,
        rows: table.rows,
    })))
}
