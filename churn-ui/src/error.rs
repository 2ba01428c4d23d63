//! Error types for churn-ui
//!
//! Every handler error renders as `{"error": {"code": ..., "message": ...}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use churn_common::PredictionError;
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Session holds no uploaded dataset (404)
    #[error("Please upload a dataset first.")]
    NoDataset,

    /// Prediction pipeline failure
    #[error("Error during prediction: {0}")]
    Prediction(#[from] PredictionError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// churn-common error
    #[error("Common error: {0}")]
    Common(#[from] churn_common::Error),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::NoDataset => (StatusCode::NOT_FOUND, "NO_DATASET"),
            ApiError::Prediction(err) => {
                let status = match err {
                    PredictionError::UnseenCategory { .. } | PredictionError::InvalidValue { .. } => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    PredictionError::SchemaMismatch(_) | PredictionError::Internal(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.code())
            }
            ApiError::Internal(_) | ApiError::Other(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            // Parse failures of user uploads are the caller's problem
            ApiError::Common(churn_common::Error::Csv(_))
            | ApiError::Common(churn_common::Error::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.parts();
        let message = match &self {
            ApiError::NotFound(msg) | ApiError::Internal(msg) => {
                msg.clone()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
