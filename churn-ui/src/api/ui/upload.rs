//! Upload page handler

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse},
};
use churn_common::dataset::PREVIEW_ROWS;
use serde::Deserialize;

use super::layout::{preview_table, render_page, Section};
use crate::api::dataset::UPLOAD_SUCCESS_MESSAGE;
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Set by the upload script after a successful POST
    #[serde(default)]
    pub uploaded: Option<u8>,
}

/// GET /upload
///
/// File picker plus a preview of the session's current dataset
pub async fn upload_page(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<UploadQuery>,
) -> impl IntoResponse {
    let dataset = state.sessions.dataset(session.id()).await;

    let mut body = String::from(
        r#"<h2>📊 Upload Dataset</h2>
<label for="dataset-file">Upload Telco Dataset (CSV)</label><br>
<input type="file" id="dataset-file" accept=".csv,text/csv">
<div id="upload-status"></div>
"#,
    );

    if let Some(table) = dataset {
        if query.uploaded.is_some() {
            body.push_str(&format!(
                "<div class=\"alert alert-success\">✅ {}</div>\n",
                UPLOAD_SUCCESS_MESSAGE
            ));
        }
        let preview = table.head(PREVIEW_ROWS);
        body.push_str(&format!(
            "<p>Preview of Uploaded Data ({} rows, {} columns):</p>\n{}\n",
            preview.total_rows,
            preview.columns.len(),
            preview_table(&preview.columns, &preview.rows)
        ));
    }

    body.push_str("<script src=\"/static/upload.js\"></script>\n");

    (session.set_cookie(), Html(render_page(Section::Upload, &body)))
}
