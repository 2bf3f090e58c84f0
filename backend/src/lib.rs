pub mod batch;
pub mod config;
pub mod coordinates;
pub mod cost;
pub mod error;
pub mod geodesy;
pub mod links;
pub mod models;
pub mod ors;
pub mod router;
pub mod segmenter;
pub mod surface;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::batch::BatchOrchestrator;
use crate::config::{ConfigError, PipelineConfig};
use crate::models::{ApiError, BatchReport, BatchRequest, BatchRow};
use crate::ors::RoutingService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn RoutingService>,
    pub config: Arc<PipelineConfig>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/batch", post(batch_handler))
        .route("/api/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs one batch to completion and returns its serializable report.
pub fn run_batch(
    service: &dyn RoutingService,
    config: &PipelineConfig,
    rows: &[BatchRow],
) -> Result<BatchReport, ConfigError> {
    let orchestrator = BatchOrchestrator::new(service, config)?;
    Ok(orchestrator.run(rows).into_report())
}

async fn batch_handler(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchReport>, (StatusCode, Json<ApiError>)> {
    if req.rows.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "batch contains no rows".to_string(),
        ));
    }

    // Routing calls block; keep them off the async workers.
    let report = tokio::task::spawn_blocking(move || {
        run_batch(state.service.as_ref(), &state.config, &req.rows)
    })
    .await
    .map_err(|err| api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
    .map_err(|err| api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    Ok(Json(report))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn api_error(status: StatusCode, message: String) -> (StatusCode, Json<ApiError>) {
    tracing::error!(status = status.as_u16(), "{message}");
    (status, Json(ApiError { message }))
}
