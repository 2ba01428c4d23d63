//! Prediction form page
//!
//! The form is generated from the feature schema, so the fields, their
//! order and their allowed values always match what the classifier accepts.
//! GET shows the defaults; POST re-renders the submitted values with the
//! result (or the error) underneath.

use axum::{
    extract::{rejection::FormRejection, State},
    response::{Html, IntoResponse},
    Form,
};
use churn_common::schema::{FieldKind, FieldSpec};
use churn_common::{CustomerForm, FeatureSchema, PredictionOutcome};
use serde_json::Value;
use tracing::warn;

use super::layout::{escape_html, render_page, Section};
use crate::api::predict::run_prediction;
use crate::error::ApiError;
use crate::session::Session;
use crate::AppState;

/// Shown to the user as No/Yes, sent to the classifier as 0/1
const SENIOR_CITIZEN: &str = "SeniorCitizen";

/// GET /predict
pub async fn predict_page(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let form = CustomerForm::default();
    let body = render_predict_body(state.predictor.schema(), |name| form.field_value(name), None);
    (session.set_cookie(), Html(render_page(Section::Predict, &body)))
}

/// POST /predict
///
/// The body is taken as raw pairs so a submission that fails to decode is
/// shown again with the user's own values next to the error.
pub async fn predict_submit(
    State(state): State<AppState>,
    session: Session,
    pairs: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> impl IntoResponse {
    let schema = state.predictor.schema();
    let pairs = match pairs {
        Ok(Form(pairs)) => pairs,
        Err(rejection) => {
            warn!("Unreadable prediction form: {}", rejection.body_text());
            let result = Err(format!("Error during prediction: {}", rejection.body_text()));
            let defaults = CustomerForm::default();
            let body = render_predict_body(schema, |name| defaults.field_value(name), Some(&result));
            return (session.set_cookie(), Html(render_page(Section::Predict, &body)));
        }
    };

    let result = match decode_form(schema, &pairs) {
        Ok(form) => run_prediction(&state, &form).map_err(|e| ApiError::from(e).to_string()),
        Err(message) => Err(format!("Error during prediction: {}", message)),
    };

    let defaults = CustomerForm::default();
    let submitted = |name: &str| {
        submitted_value(&pairs, name)
            .map(str::to_string)
            .or_else(|| defaults.field_value(name))
    };
    let body = render_predict_body(schema, submitted, Some(&result));
    (session.set_cookie(), Html(render_page(Section::Predict, &body)))
}

fn submitted_value<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Typed form from the submitted pairs, numeric fields parsed per the schema
fn decode_form(schema: &FeatureSchema, pairs: &[(String, String)]) -> Result<CustomerForm, String> {
    let mut object = serde_json::Map::new();
    for field in &schema.fields {
        let raw = submitted_value(pairs, &field.name)
            .ok_or_else(|| format!("missing field '{}'", field.name))?
            .trim();
        let value = match field.kind {
            _ if field.name == SENIOR_CITIZEN => Value::from(raw),
            FieldKind::Categorical { .. } => Value::from(raw),
            FieldKind::Integer { .. } => raw
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("{} must be a whole number, got '{}'", field.name, raw))?,
            FieldKind::Float { .. } => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Value::from)
                .ok_or_else(|| format!("{} must be a number, got '{}'", field.name, raw))?,
        };
        object.insert(field.name.clone(), value);
    }
    serde_json::from_value(Value::Object(object)).map_err(|e| e.to_string())
}

fn render_predict_body<F>(
    schema: &FeatureSchema,
    value_of: F,
    result: Option<&Result<PredictionOutcome, String>>,
) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let fields: String = schema
        .fields
        .iter()
        .map(|field| {
            let value = value_of(&field.name).unwrap_or_default();
            render_field(field, &value)
        })
        .collect();

    let mut body = format!(
        r#"<h2>🔍 Predict Churn for a Customer</h2>
<form method="post" action="/predict">
<div class="form-grid">
{}</div>
<button type="submit">🔮 Predict</button>
</form>
"#,
        fields
    );

    match result {
        Some(Ok(outcome)) => body.push_str(&render_outcome(outcome)),
        Some(Err(message)) => body.push_str(&format!(
            "<div class=\"alert alert-error\">❌ {}</div>\n",
            escape_html(message)
        )),
        None => {}
    }

    body
}

fn render_outcome(outcome: &PredictionOutcome) -> String {
    let icon = if outcome.will_churn { "✅" } else { "❌" };
    let mut html = format!("<h3 class=\"result\">{} {}</h3>\n", icon, outcome.message);
    if let Some(p) = outcome.churn_probability {
        html.push_str(&format!(
            "<p class=\"probability\">Churn probability: {:.1}%</p>\n",
            p * 100.0
        ));
    }
    html
}

fn render_field(field: &FieldSpec, value: &str) -> String {
    let name = escape_html(&field.name);
    let label = escape_html(&field.label);

    let input = match &field.kind {
        _ if field.name == SENIOR_CITIZEN => select(&name, &["No", "Yes"], value),
        FieldKind::Categorical { allowed } => {
            let allowed: Vec<&str> = allowed.iter().map(String::as_str).collect();
            select(&name, &allowed, value)
        }
        FieldKind::Integer { min, max } => format!(
            "<input type=\"range\" id=\"{n}\" name=\"{n}\" min=\"{}\" max=\"{}\" step=\"1\" value=\"{}\" \
             oninput=\"this.nextElementSibling.value = this.value\"> <output>{}</output>",
            min,
            max,
            escape_html(value),
            escape_html(value),
            n = name
        ),
        FieldKind::Float { min, max } => format!(
            "<input type=\"number\" id=\"{n}\" name=\"{n}\" min=\"{}\" max=\"{}\" step=\"0.01\" value=\"{}\">",
            min,
            max,
            escape_html(value),
            n = name
        ),
    };

    format!(
        "<div class=\"field\"><label for=\"{}\">{}</label>{}</div>\n",
        name, label, input
    )
}

fn select(name: &str, options: &[&str], selected: &str) -> String {
    let options: String = options
        .iter()
        .map(|option| {
            let sel = if *option == selected { " selected" } else { "" };
            let option = escape_html(option);
            format!("<option value=\"{}\"{}>{}</option>", option, sel, option)
        })
        .collect();
    format!("<select id=\"{n}\" name=\"{n}\">{}</select>", options, n = name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults(name: &str) -> Option<String> {
        CustomerForm::default().field_value(name)
    }

    fn default_pairs() -> Vec<(String, String)> {
        FeatureSchema::v1()
            .feature_names()
            .into_iter()
            .map(|name| {
                let value = defaults(name).unwrap();
                (name.to_string(), value)
            })
            .collect()
    }

    fn with(mut pairs: Vec<(String, String)>, name: &str, value: &str) -> Vec<(String, String)> {
        for pair in pairs.iter_mut().filter(|(key, _)| key == name) {
            pair.1 = value.to_string();
        }
        pairs
    }

    #[test]
    fn test_form_has_every_schema_field() {
        let schema = FeatureSchema::v1();
        let html = render_predict_body(&schema, defaults, None);
        for name in schema.feature_names() {
            assert!(html.contains(&format!("name=\"{}\"", name)), "missing {}", name);
        }
    }

    #[test]
    fn test_defaults_are_selected() {
        let html = render_predict_body(&FeatureSchema::v1(), defaults, None);
        assert!(html.contains("<option value=\"Month-to-month\" selected>"));
        assert!(html.contains("<option value=\"Electronic check\" selected>"));
        assert!(html.contains("type=\"range\" id=\"tenure\" name=\"tenure\" min=\"0\" max=\"72\""));
    }

    #[test]
    fn test_senior_citizen_is_yes_no_select() {
        let html = render_predict_body(&FeatureSchema::v1(), defaults, None);
        assert!(html.contains(
            "<select id=\"SeniorCitizen\" name=\"SeniorCitizen\"><option value=\"No\" selected>No</option><option value=\"Yes\">Yes</option></select>"
        ));
    }

    #[test]
    fn test_outcome_banner() {
        let outcome = PredictionOutcome {
            label: 1,
            will_churn: true,
            message: "Yes (Customer Will Churn)".to_string(),
            churn_probability: Some(0.55),
        };
        let html = render_outcome(&outcome);
        assert!(html.contains("✅ Yes (Customer Will Churn)"));
        assert!(html.contains("55.0%"));
    }

    #[test]
    fn test_error_banner_is_escaped() {
        let result = Err("Error during prediction: <bad>".to_string());
        let html = render_predict_body(&FeatureSchema::v1(), defaults, Some(&result));
        assert!(html.contains("❌ Error during prediction: &lt;bad&gt;"));
    }

    #[test]
    fn test_decode_default_pairs() {
        let form = decode_form(&FeatureSchema::v1(), &default_pairs()).unwrap();
        assert_eq!(form, CustomerForm::default());
    }

    #[test]
    fn test_decode_reports_bad_number() {
        let pairs = with(default_pairs(), "TotalCharges", "abc");
        let err = decode_form(&FeatureSchema::v1(), &pairs).unwrap_err();
        assert_eq!(err, "TotalCharges must be a number, got 'abc'");
    }

    #[test]
    fn test_decode_reports_missing_field() {
        let pairs: Vec<_> = default_pairs().into_iter().filter(|(k, _)| k != "tenure").collect();
        let err = decode_form(&FeatureSchema::v1(), &pairs).unwrap_err();
        assert_eq!(err, "missing field 'tenure'");
    }

    #[test]
    fn test_rejected_submission_keeps_user_values() {
        let pairs = with(default_pairs(), "Contract", "One year");
        let pairs = with(pairs, "TotalCharges", "abc");
        let result = Err("Error during prediction: TotalCharges must be a number".to_string());

        let html = render_predict_body(
            &FeatureSchema::v1(),
            |name| submitted_value(&pairs, name).map(str::to_string),
            Some(&result),
        );
        assert!(html.contains("<option value=\"One year\" selected>"));
        assert!(!html.contains("<option value=\"Month-to-month\" selected>"));
        assert!(html.contains("name=\"TotalCharges\" min=\"0\" max=\"10000\" step=\"0.01\" value=\"abc\""));
        assert!(html.contains("❌ Error during prediction"));
    }
}
