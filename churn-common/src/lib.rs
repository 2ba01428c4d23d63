//! # Churn Common Library
//!
//! Shared code for the churn dashboard:
//! - Error and configuration types
//! - Feature schema for the prediction form
//! - Label encoders and the pre-trained classifier
//! - Artifact loading and the prediction pipeline
//! - Uploaded dataset parsing and histogram computation

pub mod artifacts;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod histogram;
pub mod predict;
pub mod schema;

pub use artifacts::{load_artifacts, Artifacts};
pub use error::{Error, Result};
pub use predict::{ChurnPredictor, CustomerForm, PredictionError, PredictionOutcome};
pub use schema::FeatureSchema;
