//! Health check and schema endpoints

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use churn_common::FeatureSchema;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Module name ("churn-ui")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Feature schema version the classifier was checked against
    pub schema_version: u32,
    /// Classifier family
    pub model_kind: String,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let artifacts = state.predictor.artifacts();

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "churn-ui".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        schema_version: artifacts.schema.version,
        model_kind: artifacts.classifier.kind().to_string(),
    })
}

/// GET /api/schema
///
/// The versioned form/classifier contract
pub async fn get_schema(State(state): State<AppState>) -> Json<FeatureSchema> {
    Json(state.predictor.schema().clone())
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/buildinfo", get(super::get_build_info))
}

/// Build schema routes
pub fn schema_routes() -> Router<AppState> {
    Router::new().route("/api/schema", get(get_schema))
}
