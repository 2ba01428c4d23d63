//! churn-ui library - Telco churn dashboard service
//!
//! Exposes the router and application state for the binary and for
//! integration testing.

pub mod api;
pub mod chart;
pub mod cli;
pub mod error;
pub mod session;

pub use crate::error::{ApiError, ApiResult};

use axum::{extract::DefaultBodyLimit, Router};
use chrono::{DateTime, Utc};
use churn_common::config::ServiceConfig;
use churn_common::{Artifacts, ChurnPredictor};
use session::SessionStore;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Classifier, encoders and schema; loaded once, never mutated
    pub predictor: Arc<ChurnPredictor>,
    /// Per-session uploaded datasets
    pub sessions: SessionStore,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Request body limit, applies to dataset uploads
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(artifacts: Artifacts, config: &ServiceConfig) -> Self {
        Self {
            predictor: Arc::new(ChurnPredictor::new(artifacts)),
            sessions: SessionStore::new(config.session_idle_timeout),
            startup_time: Utc::now(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        // UI routes (HTML pages)
        .merge(api::ui_routes())
        // API routes
        .merge(api::dataset_routes())
        .merge(api::predict_routes())
        .merge(api::schema_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
