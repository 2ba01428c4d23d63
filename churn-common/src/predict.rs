//! Form-to-prediction pipeline
//!
//! One submission flows through four steps:
//! 1. [`CustomerForm::to_row`] builds the ordered row (SeniorCitizen becomes 0/1)
//! 2. the row is validated against the [`FeatureSchema`]
//! 3. text cells with a label encoder are replaced by their integer code
//! 4. the numeric feature vector is handed to the classifier
//!
//! Every failure is a [`PredictionError`]; no partial result is produced.

use crate::artifacts::Artifacts;
use crate::encoder::EncoderMap;
use crate::schema::{FeatureSchema, FieldKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label the classifier uses for "will churn"
pub const CHURN_LABEL: i64 = 1;

pub const CHURN_MESSAGE: &str = "Yes (Customer Will Churn)";
pub const STAY_MESSAGE: &str = "No (Customer Will Stay)";

/// Why a prediction could not be made
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    /// Categorical label outside the fitted vocabulary
    #[error("unseen category '{value}' for column '{column}'")]
    UnseenCategory { column: String, value: String },

    /// Value of the right type but outside its allowed range
    #[error("invalid value for column '{column}': {reason}")]
    InvalidValue { column: String, reason: String },

    /// Row shape or types disagree with what the classifier expects
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Classifier failed on a well-formed row
    #[error("internal failure: {0}")]
    Internal(String),
}

impl PredictionError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            PredictionError::UnseenCategory { .. } => "UNSEEN_CATEGORY",
            PredictionError::InvalidValue { .. } => "INVALID_VALUE",
            PredictionError::SchemaMismatch(_) => "SCHEMA_MISMATCH",
            PredictionError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Raw form submission, field names exactly as the classifier knows them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerForm {
    pub gender: String,
    #[serde(rename = "SeniorCitizen")]
    pub senior_citizen: String,
    #[serde(rename = "Partner")]
    pub partner: String,
    #[serde(rename = "Dependents")]
    pub dependents: String,
    pub tenure: i64,
    #[serde(rename = "PhoneService")]
    pub phone_service: String,
    #[serde(rename = "MultipleLines")]
    pub multiple_lines: String,
    #[serde(rename = "InternetService")]
    pub internet_service: String,
    #[serde(rename = "OnlineSecurity")]
    pub online_security: String,
    #[serde(rename = "OnlineBackup")]
    pub online_backup: String,
    #[serde(rename = "DeviceProtection")]
    pub device_protection: String,
    #[serde(rename = "TechSupport")]
    pub tech_support: String,
    #[serde(rename = "StreamingTV")]
    pub streaming_tv: String,
    #[serde(rename = "StreamingMovies")]
    pub streaming_movies: String,
    #[serde(rename = "Contract")]
    pub contract: String,
    #[serde(rename = "PaperlessBilling")]
    pub paperless_billing: String,
    #[serde(rename = "PaymentMethod")]
    pub payment_method: String,
    #[serde(rename = "MonthlyCharges")]
    pub monthly_charges: f64,
    #[serde(rename = "TotalCharges")]
    pub total_charges: f64,
}

impl Default for CustomerForm {
    /// The values the form shows before the user changes anything
    fn default() -> Self {
        let no = || "No".to_string();
        Self {
            gender: "Male".to_string(),
            senior_citizen: no(),
            partner: no(),
            dependents: no(),
            tenure: 12,
            phone_service: no(),
            multiple_lines: no(),
            internet_service: "DSL".to_string(),
            online_security: no(),
            online_backup: no(),
            device_protection: no(),
            tech_support: no(),
            streaming_tv: no(),
            streaming_movies: no(),
            contract: "Month-to-month".to_string(),
            paperless_billing: "Yes".to_string(),
            payment_method: "Electronic check".to_string(),
            monthly_charges: 70.0,
            total_charges: 1500.0,
        }
    }
}

/// A single cell of the prediction row
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

/// One ordered row of `(column, value)` pairs
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRow {
    pub cells: Vec<(String, CellValue)>,
}

impl PredictionRow {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(name, _)| name == column).map(|(_, v)| v)
    }
}

impl CustomerForm {
    /// Current value of a field as the form displays it
    pub fn field_value(&self, column: &str) -> Option<String> {
        let text = match column {
            "gender" => &self.gender,
            "SeniorCitizen" => &self.senior_citizen,
            "Partner" => &self.partner,
            "Dependents" => &self.dependents,
            "PhoneService" => &self.phone_service,
            "MultipleLines" => &self.multiple_lines,
            "InternetService" => &self.internet_service,
            "OnlineSecurity" => &self.online_security,
            "OnlineBackup" => &self.online_backup,
            "DeviceProtection" => &self.device_protection,
            "TechSupport" => &self.tech_support,
            "StreamingTV" => &self.streaming_tv,
            "StreamingMovies" => &self.streaming_movies,
            "Contract" => &self.contract,
            "PaperlessBilling" => &self.paperless_billing,
            "PaymentMethod" => &self.payment_method,
            "tenure" => return Some(self.tenure.to_string()),
            "MonthlyCharges" => return Some(self.monthly_charges.to_string()),
            "TotalCharges" => return Some(self.total_charges.to_string()),
            _ => return None,
        };
        Some(text.clone())
    }

    /// Assemble the row in classifier order
    pub fn to_row(&self) -> Result<PredictionRow, PredictionError> {
        let senior = match self.senior_citizen.as_str() {
            "Yes" => 1,
            "No" => 0,
            other => {
                return Err(PredictionError::InvalidValue {
                    column: "SeniorCitizen".to_string(),
                    reason: format!("expected Yes or No, got '{}'", other),
                })
            }
        };

        let text = |name: &str, value: &str| (name.to_string(), CellValue::Text(value.to_string()));

        let cells = vec![
            text("gender", &self.gender),
            ("SeniorCitizen".to_string(), CellValue::Integer(senior)),
            text("Partner", &self.partner),
            text("Dependents", &self.dependents),
            ("tenure".to_string(), CellValue::Integer(self.tenure)),
            text("PhoneService", &self.phone_service),
            text("MultipleLines", &self.multiple_lines),
            text("InternetService", &self.internet_service),
            text("OnlineSecurity", &self.online_security),
            text("OnlineBackup", &self.online_backup),
            text("DeviceProtection", &self.device_protection),
            text("TechSupport", &self.tech_support),
            text("StreamingTV", &self.streaming_tv),
            text("StreamingMovies", &self.streaming_movies),
            text("Contract", &self.contract),
            text("PaperlessBilling", &self.paperless_billing),
            text("PaymentMethod", &self.payment_method),
            ("MonthlyCharges".to_string(), CellValue::Float(self.monthly_charges)),
            ("TotalCharges".to_string(), CellValue::Float(self.total_charges)),
        ];

        Ok(PredictionRow { cells })
    }
}

/// Check names, order, types and domains of a raw row
pub fn validate_row(schema: &FeatureSchema, row: &PredictionRow) -> Result<(), PredictionError> {
    if row.cells.len() != schema.len() {
        return Err(PredictionError::SchemaMismatch(format!(
            "row has {} columns, schema v{} defines {}",
            row.cells.len(),
            schema.version,
            schema.len()
        )));
    }

    for ((name, value), field) in row.cells.iter().zip(&schema.fields) {
        if name != &field.name {
            return Err(PredictionError::SchemaMismatch(format!(
                "expected column '{}', found '{}'",
                field.name, name
            )));
        }

        match (&field.kind, value) {
            (FieldKind::Categorical { allowed }, CellValue::Text(label)) => {
                if !allowed.iter().any(|a| a == label) {
                    return Err(PredictionError::UnseenCategory {
                        column: name.clone(),
                        value: label.clone(),
                    });
                }
            }
            (FieldKind::Integer { min, max }, CellValue::Integer(v)) => {
                if v < min || v > max {
                    return Err(out_of_range(name, *v as f64, *min as f64, *max as f64));
                }
            }
            (FieldKind::Float { min, max }, CellValue::Float(v)) => {
                if !v.is_finite() || v < min || v > max {
                    return Err(out_of_range(name, *v, *min, *max));
                }
            }
            (FieldKind::Float { min, max }, CellValue::Integer(v)) => {
                let v = *v as f64;
                if v < *min || v > *max {
                    return Err(out_of_range(name, v, *min, *max));
                }
            }
            (kind, value) => {
                return Err(PredictionError::SchemaMismatch(format!(
                    "column '{}' expects {} but holds {:?}",
                    name,
                    kind_name(kind),
                    value
                )));
            }
        }
    }

    Ok(())
}

/// Replace every text cell that has an encoder with its integer code
///
/// Numeric cells and text cells without an encoder pass through unchanged.
pub fn encode_row(row: &PredictionRow, encoders: &EncoderMap) -> Result<PredictionRow, PredictionError> {
    let mut cells = Vec::with_capacity(row.cells.len());

    for (name, value) in &row.cells {
        let encoded = match (value, encoders.get(name)) {
            (CellValue::Text(label), Some(encoder)) => match encoder.transform(label) {
                Some(code) => CellValue::Integer(code),
                None => {
                    return Err(PredictionError::UnseenCategory {
                        column: name.clone(),
                        value: label.clone(),
                    })
                }
            },
            (other, _) => other.clone(),
        };
        cells.push((name.clone(), encoded));
    }

    Ok(PredictionRow { cells })
}

/// Numeric feature vector of an encoded row, in schema order
pub fn feature_vector(row: &PredictionRow) -> Result<Vec<f64>, PredictionError> {
    row.cells
        .iter()
        .map(|(name, value)| match value {
            CellValue::Integer(v) => Ok(*v as f64),
            CellValue::Float(v) => Ok(*v),
            CellValue::Text(label) => Err(PredictionError::SchemaMismatch(format!(
                "column '{}' still holds text '{}' (no label encoder)",
                name, label
            ))),
        })
        .collect()
}

/// Result of a successful prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionOutcome {
    /// Raw classifier label
    pub label: i64,
    pub will_churn: bool,
    pub message: String,
    /// Probability of the churn class, when the classifier knows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub churn_probability: Option<f64>,
}

/// Runs the pipeline against loaded artifacts
#[derive(Debug, Clone)]
pub struct ChurnPredictor {
    artifacts: Artifacts,
}

impl ChurnPredictor {
    pub fn new(artifacts: Artifacts) -> Self {
        Self { artifacts }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.artifacts.schema
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    /// Predict churn for one submitted form
    pub fn predict(&self, form: &CustomerForm) -> Result<PredictionOutcome, PredictionError> {
        let row = form.to_row()?;
        self.predict_row(&row)
    }

    pub fn predict_row(&self, row: &PredictionRow) -> Result<PredictionOutcome, PredictionError> {
        let artifacts = &self.artifacts;

        validate_row(&artifacts.schema, row)?;
        let encoded = encode_row(row, &artifacts.encoders)?;
        let features = feature_vector(&encoded)?;

        let output = artifacts
            .classifier
            .predict(&features)
            .map_err(PredictionError::Internal)?;

        let will_churn = output.label == CHURN_LABEL;
        Ok(PredictionOutcome {
            label: output.label,
            will_churn,
            message: if will_churn { CHURN_MESSAGE } else { STAY_MESSAGE }.to_string(),
            churn_probability: artifacts.classifier.probability_of(&output, CHURN_LABEL),
        })
    }
}

fn out_of_range(column: &str, value: f64, min: f64, max: f64) -> PredictionError {
    PredictionError::InvalidValue {
        column: column.to_string(),
        reason: format!("{} is outside {}..={}", value, min, max),
    }
}

fn kind_name(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Categorical { .. } => "a category label",
        FieldKind::Integer { .. } => "an integer",
        FieldKind::Float { .. } => "a number",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::LabelEncoder;

    fn encoders(entries: &[(&str, &[&str])]) -> EncoderMap {
        let mut map = EncoderMap::default();
        for (column, classes) in entries {
            let classes = classes.iter().map(|s| s.to_string()).collect();
            map.insert(*column, LabelEncoder::new(classes).unwrap());
        }
        map
    }

    #[test]
    fn test_senior_citizen_maps_to_integer() {
        let mut form = CustomerForm::default();
        assert_eq!(form.to_row().unwrap().get("SeniorCitizen"), Some(&CellValue::Integer(0)));

        form.senior_citizen = "Yes".to_string();
        assert_eq!(form.to_row().unwrap().get("SeniorCitizen"), Some(&CellValue::Integer(1)));
    }

    #[test]
    fn test_senior_citizen_rejects_other_labels() {
        let form = CustomerForm {
            senior_citizen: "Maybe".to_string(),
            ..CustomerForm::default()
        };
        let err = form.to_row().unwrap_err();
        assert_eq!(err.code(), "INVALID_VALUE");
    }

    #[test]
    fn test_field_value_covers_every_schema_column() {
        let form = CustomerForm::default();
        for name in FeatureSchema::v1().feature_names() {
            assert!(form.field_value(name).is_some(), "no value for {}", name);
        }
        assert_eq!(form.field_value("SeniorCitizen").as_deref(), Some("No"));
        assert_eq!(form.field_value("MonthlyCharges").as_deref(), Some("70"));
        assert_eq!(form.field_value("customerID"), None);
    }

    #[test]
    fn test_row_follows_schema_order() {
        let row = CustomerForm::default().to_row().unwrap();
        let names: Vec<&str> = row.cells.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, FeatureSchema::v1().feature_names());
    }

    #[test]
    fn test_validate_accepts_default_form() {
        let row = CustomerForm::default().to_row().unwrap();
        assert!(validate_row(&FeatureSchema::v1(), &row).is_ok());
    }

    #[test]
    fn test_validate_rejects_tenure_out_of_range() {
        let form = CustomerForm {
            tenure: 73,
            ..CustomerForm::default()
        };
        let row = form.to_row().unwrap();
        let err = validate_row(&FeatureSchema::v1(), &row).unwrap_err();
        assert!(matches!(err, PredictionError::InvalidValue { ref column, .. } if column == "tenure"));
    }

    #[test]
    fn test_validate_rejects_label_outside_schema() {
        let form = CustomerForm {
            contract: "Three year".to_string(),
            ..CustomerForm::default()
        };
        let row = form.to_row().unwrap();
        let err = validate_row(&FeatureSchema::v1(), &row).unwrap_err();
        assert_eq!(
            err,
            PredictionError::UnseenCategory {
                column: "Contract".to_string(),
                value: "Three year".to_string()
            }
        );
    }

    #[test]
    fn test_validate_rejects_missing_column() {
        let mut row = CustomerForm::default().to_row().unwrap();
        row.cells.pop();
        let err = validate_row(&FeatureSchema::v1(), &row).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_MISMATCH");
    }

    #[test]
    fn test_encode_replaces_only_encoded_text() {
        let row = CustomerForm::default().to_row().unwrap();
        let map = encoders(&[("gender", &["Female", "Male"]), ("tenure", &["12"])]);

        let encoded = encode_row(&row, &map).unwrap();
        assert_eq!(encoded.get("gender"), Some(&CellValue::Integer(1)));
        // Numeric cells pass through even when an encoder shares the name
        assert_eq!(encoded.get("tenure"), Some(&CellValue::Integer(12)));
        // Text without an encoder is left alone
        assert_eq!(encoded.get("Partner"), Some(&CellValue::Text("No".to_string())));
    }

    #[test]
    fn test_encode_reports_unseen_category() {
        let row = CustomerForm::default().to_row().unwrap();
        let map = encoders(&[("PaymentMethod", &["Mailed check"])]);

        let err = encode_row(&row, &map).unwrap_err();
        assert_eq!(err.code(), "UNSEEN_CATEGORY");
        assert!(err.to_string().contains("Electronic check"));
    }

    #[test]
    fn test_feature_vector_rejects_leftover_text() {
        let row = CustomerForm::default().to_row().unwrap();
        let err = feature_vector(&row).unwrap_err();
        assert!(matches!(err, PredictionError::SchemaMismatch(_)));
    }
}
