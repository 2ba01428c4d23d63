//! UI Routes - HTML pages for the churn dashboard
//!
//! # Structure
//! - **Layout** (`layout`): header, sidebar navigation and footer shared by every page
//! - **Static Assets** (`static_assets`): CSS/JS file serving
//! - **Upload** (`upload`): CSV file picker and preview
//! - **Visualize** (`visualize`): per-column histogram
//! - **Predict** (`predict`): customer form and prediction result
//! - **About** (`about`)

use axum::{
    response::Redirect,
    routing::get,
    Router,
};
use crate::AppState;

mod about;
mod layout;
mod predict;
mod static_assets;
mod upload;
mod visualize;

pub use visualize::UPLOAD_FIRST_WARNING;

use about::about_page;
use predict::{predict_page, predict_submit};
use static_assets::{serve_churn_ui_css, serve_upload_js};
use upload::upload_page;
use visualize::visualize_page;

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        // Page routes
        .route("/", get(|| async { Redirect::to("/upload") }))
        .route("/upload", get(upload_page))
        .route("/visualize", get(visualize_page))
        .route("/predict", get(predict_page).post(predict_submit))
        .route("/about", get(about_page))
        // Static assets
        .route("/static/churn-ui.css", get(serve_churn_ui_css))
        .route("/static/upload.js", get(serve_upload_js))
}
