//! Startup artifact loading
//!
//! Reads the classifier and the encoder map once, checks them against the
//! feature schema, and hands back immutable values. Any failure here is
//! fatal to the service; there is no retry.

use crate::classifier::Classifier;
use crate::encoder::EncoderMap;
use crate::schema::FeatureSchema;
use crate::{Error, Result};
use std::path::Path;
use tracing::{info, warn};

/// Loaded, validated artifacts
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub schema: FeatureSchema,
    pub classifier: Classifier,
    pub encoders: EncoderMap,
}

/// Load both artifacts from disk
pub fn load_artifacts(model_path: &Path, encoders_path: &Path) -> Result<Artifacts> {
    let classifier = load_classifier(model_path)?;
    let encoders = load_encoders(encoders_path)?;
    Artifacts::new(FeatureSchema::v1(), classifier, encoders)
}

impl Artifacts {
    /// Assemble artifacts, checking the classifier against `schema`
    pub fn new(schema: FeatureSchema, classifier: Classifier, encoders: EncoderMap) -> Result<Self> {
        schema
            .check_compatible(classifier.schema_version, &classifier.feature_names)
            .map_err(Error::SchemaMismatch)?;

        for field in schema.fields.iter().filter(|f| f.is_categorical()) {
            if !encoders.contains(&field.name) {
                warn!(
                    "No label encoder for categorical column '{}'; text values will be rejected",
                    field.name
                );
            }
        }

        for column in encoders.columns() {
            if schema.field(column).is_none() {
                warn!("Label encoder for '{}' matches no schema column", column);
            }
        }

        Ok(Self {
            schema,
            classifier,
            encoders,
        })
    }
}

fn load_classifier(path: &Path) -> Result<Classifier> {
    let json = read_artifact(path, "classifier")?;
    let classifier = Classifier::from_json_str(&json)
        .map_err(|e| Error::Artifact(format!("{}: {}", path.display(), e)))?;

    info!(
        "Loaded {} classifier ({} features, classes {:?}) from {}",
        classifier.kind(),
        classifier.n_features(),
        classifier.classes,
        path.display()
    );
    Ok(classifier)
}

fn load_encoders(path: &Path) -> Result<EncoderMap> {
    let json = read_artifact(path, "label encoders")?;
    let encoders = EncoderMap::from_json_str(&json)
        .map_err(|e| Error::Artifact(format!("{}: {}", path.display(), e)))?;

    info!("Loaded {} label encoders from {}", encoders.len(), path.display());
    Ok(encoders)
}

fn read_artifact(path: &Path, what: &str) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        Error::Artifact(format!("cannot read {} at {}: {}", what, path.display(), e))
    })
}
