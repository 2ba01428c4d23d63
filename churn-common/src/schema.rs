//! Versioned feature schema for the prediction form
//!
//! The classifier was trained on a fixed set of 19 columns in a fixed order.
//! [`FeatureSchema`] makes that contract explicit: the classifier artifact
//! is checked against it at load time, and every prediction row is validated
//! against it before the classifier is called.

use serde::Serialize;

/// Current schema version. Classifier artifacts must declare the same value.
pub const SCHEMA_VERSION: u32 = 1;

const YES_NO: &[&str] = &["No", "Yes"];
const INTERNET_ADDON: &[&str] = &["No", "Yes", "No internet service"];

/// Kind and domain of a single feature
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Text label from a closed set
    Categorical { allowed: Vec<String> },
    /// Whole number within an inclusive range
    Integer { min: i64, max: i64 },
    /// Real number within an inclusive range
    Float { min: f64, max: f64 },
}

/// One feature of the schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    /// Column name as the classifier knows it
    pub name: String,
    /// Human-readable label for the form
    pub label: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    fn categorical(name: &str, label: &str, allowed: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Categorical {
                allowed: allowed.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    fn integer(name: &str, label: &str, min: i64, max: i64) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Integer { min, max },
        }
    }

    fn float(name: &str, label: &str, min: f64, max: f64) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Float { min, max },
        }
    }

    /// Allowed labels for a categorical field, `None` otherwise
    pub fn allowed_values(&self) -> Option<&[String]> {
        match &self.kind {
            FieldKind::Categorical { allowed } => Some(allowed),
            _ => None,
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self.kind, FieldKind::Categorical { .. })
    }
}

/// Ordered, versioned list of classifier input features
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSchema {
    pub version: u32,
    pub fields: Vec<FieldSpec>,
}

impl FeatureSchema {
    /// The Telco customer schema (version 1)
    ///
    /// `SeniorCitizen` is offered to the user as No/Yes but reaches the
    /// classifier as the integer 0/1, so it is an integer field here.
    pub fn v1() -> Self {
        let fields = vec![
            FieldSpec::categorical("gender", "Gender", &["Male", "Female"]),
            FieldSpec::integer("SeniorCitizen", "Senior Citizen", 0, 1),
            FieldSpec::categorical("Partner", "Partner", YES_NO),
            FieldSpec::categorical("Dependents", "Dependents", YES_NO),
            FieldSpec::integer("tenure", "Tenure (Months)", 0, 72),
            FieldSpec::categorical("PhoneService", "Phone Service", YES_NO),
            FieldSpec::categorical(
                "MultipleLines",
                "Multiple Lines",
                &["No", "Yes", "No phone service"],
            ),
            FieldSpec::categorical(
                "InternetService",
                "Internet Service",
                &["DSL", "Fiber optic", "No"],
            ),
            FieldSpec::categorical("OnlineSecurity", "Online Security", INTERNET_ADDON),
            FieldSpec::categorical("OnlineBackup", "Online Backup", INTERNET_ADDON),
            FieldSpec::categorical("DeviceProtection", "Device Protection", INTERNET_ADDON),
            FieldSpec::categorical("TechSupport", "Tech Support", INTERNET_ADDON),
            FieldSpec::categorical("StreamingTV", "Streaming TV", INTERNET_ADDON),
            FieldSpec::categorical("StreamingMovies", "Streaming Movies", INTERNET_ADDON),
            FieldSpec::categorical(
                "Contract",
                "Contract",
                &["Month-to-month", "One year", "Two year"],
            ),
            FieldSpec::categorical("PaperlessBilling", "Paperless Billing", &["Yes", "No"]),
            FieldSpec::categorical(
                "PaymentMethod",
                "Payment Method",
                &[
                    "Electronic check",
                    "Mailed check",
                    "Bank transfer (automatic)",
                    "Credit card (automatic)",
                ],
            ),
            FieldSpec::float("MonthlyCharges", "Monthly Charges ($)", 0.0, 200.0),
            FieldSpec::float("TotalCharges", "Total Charges ($)", 0.0, 10000.0),
        ];

        Self {
            version: SCHEMA_VERSION,
            fields,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Column names in classifier order
    pub fn feature_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Check that a classifier trained with `version` over `names` matches this schema
    pub fn check_compatible(&self, version: u32, names: &[String]) -> Result<(), String> {
        if version != self.version {
            return Err(format!(
                "classifier declares schema version {}, expected {}",
                version, self.version
            ));
        }

        if names.len() != self.fields.len() {
            return Err(format!(
                "classifier expects {} features, schema defines {}",
                names.len(),
                self.fields.len()
            ));
        }

        for (index, (name, field)) in names.iter().zip(&self.fields).enumerate() {
            if name != &field.name {
                return Err(format!(
                    "feature {} is '{}' in the classifier but '{}' in the schema",
                    index, name, field.name
                ));
            }
        }

        Ok(())
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::v1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_has_nineteen_fields_in_order() {
        let schema = FeatureSchema::v1();
        assert_eq!(schema.len(), 19);
        assert_eq!(schema.version, SCHEMA_VERSION);

        let names = schema.feature_names();
        assert_eq!(names.first(), Some(&"gender"));
        assert_eq!(names[4], "tenure");
        assert_eq!(names.last(), Some(&"TotalCharges"));
    }

    #[test]
    fn test_payment_method_allowed_values() {
        let schema = FeatureSchema::v1();
        let allowed = schema.field("PaymentMethod").unwrap().allowed_values().unwrap();
        assert_eq!(allowed.len(), 4);
        assert!(allowed.iter().any(|v| v == "Bank transfer (automatic)"));
    }

    #[test]
    fn test_senior_citizen_is_integer() {
        let schema = FeatureSchema::v1();
        let field = schema.field("SeniorCitizen").unwrap();
        assert_eq!(field.kind, FieldKind::Integer { min: 0, max: 1 });
        assert!(!field.is_categorical());
    }

    #[test]
    fn test_check_compatible_accepts_matching_names() {
        let schema = FeatureSchema::v1();
        let names: Vec<String> = schema.feature_names().iter().map(|s| s.to_string()).collect();
        assert!(schema.check_compatible(SCHEMA_VERSION, &names).is_ok());
    }

    #[test]
    fn test_check_compatible_rejects_version() {
        let schema = FeatureSchema::v1();
        let names: Vec<String> = schema.feature_names().iter().map(|s| s.to_string()).collect();
        let err = schema.check_compatible(2, &names).unwrap_err();
        assert!(err.contains("version"));
    }

    #[test]
    fn test_check_compatible_rejects_reordered_names() {
        let schema = FeatureSchema::v1();
        let mut names: Vec<String> = schema.feature_names().iter().map(|s| s.to_string()).collect();
        names.swap(0, 1);
        let err = schema.check_compatible(SCHEMA_VERSION, &names).unwrap_err();
        assert!(err.contains("feature 0"));
    }
}
