//! Static asset handlers
//!
//! Embeds and serves CSS/JS files at compile time

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

const CHURN_UI_CSS: &str = include_str!("../../../static/churn-ui.css");
const UPLOAD_JS: &str = include_str!("../../../static/upload.js");

/// GET /static/churn-ui.css
pub async fn serve_churn_ui_css() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "text/css"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        CHURN_UI_CSS,
    )
        .into_response()
}

/// GET /static/upload.js
///
/// Posts the chosen CSV file to the dataset API
pub async fn serve_upload_js() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "application/javascript"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        UPLOAD_JS,
    )
        .into_response()
}
