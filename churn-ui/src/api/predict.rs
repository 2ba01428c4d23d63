//! Prediction API

use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use churn_common::{CustomerForm, PredictionError, PredictionOutcome};
use tracing::{debug, warn};

use crate::session::Session;
use crate::{ApiResult, AppState};

/// Run one form through the predictor, logging the result
///
/// Shared by the JSON endpoint and the HTML form.
pub fn run_prediction(state: &AppState, form: &CustomerForm) -> Result<PredictionOutcome, PredictionError> {
    match state.predictor.predict(form) {
        Ok(outcome) => {
            debug!(
                "Prediction: label={} churn={} p={:?}",
                outcome.label, outcome.will_churn, outcome.churn_probability
            );
            Ok(outcome)
        }
        Err(e) => {
            warn!("Prediction failed ({}): {}", e.code(), e);
            Err(e)
        }
    }
}

/// POST /api/predict
///
/// **Request:** JSON object with the 19 customer fields
/// **Response:** `PredictionOutcome`
///
/// **Errors:**
/// - 422 Unprocessable Entity: unseen category or out-of-range value
/// - 500 Internal Server Error: artifacts disagree with the row
pub async fn predict(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CustomerForm>,
) -> ApiResult<impl IntoResponse> {
    let outcome = run_prediction(&state, &form)?;
    Ok((session.set_cookie(), Json(outcome)))
}

/// Build prediction routes
pub fn predict_routes() -> Router<AppState> {
    Router::new().route("/api/predict", post(predict))
}
