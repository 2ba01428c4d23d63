//! Common error types for the churn dashboard

use thiserror::Error;

/// Common result type for churn operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the library and the service
#[derive(Error, Debug)]
pub enum Error {
    /// JSON decoding error (artifact documents)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing error (uploaded datasets)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Artifact present but structurally unusable
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// Classifier and feature schema disagree
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
