//! Visualization page handler

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
};
use serde::Deserialize;
use tracing::warn;

use super::layout::{escape_html, render_page, Section};
use crate::api::dataset::column_distribution;
use crate::chart::render_distribution_svg;
use crate::session::Session;
use crate::{ApiError, AppState};

pub const UPLOAD_FIRST_WARNING: &str = "⚠️ Please upload a dataset first.";

#[derive(Debug, Deserialize)]
pub struct VisualizeQuery {
    pub column: Option<String>,
}

/// GET /visualize[?column=NAME]
pub async fn visualize_page(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<VisualizeQuery>,
) -> impl IntoResponse {
    let cookie = session.set_cookie();
    let mut body = String::from("<h2>📊 Data Visualization</h2>\n");

    let Some(table) = state.sessions.dataset(session.id()).await else {
        body.push_str(&format!(
            "<div class=\"alert alert-warning\">{}</div>\n",
            UPLOAD_FIRST_WARNING
        ));
        return (StatusCode::OK, cookie, Html(render_page(Section::Visualize, &body)));
    };

    let selected = query
        .column
        .or_else(|| table.columns().first().cloned())
        .unwrap_or_default();

    let options: String = table
        .columns()
        .iter()
        .map(|c| {
            let sel = if *c == selected { " selected" } else { "" };
            let c = escape_html(c);
            format!("<option value=\"{}\"{}>{}</option>", c, sel, c)
        })
        .collect();
    body.push_str(&format!(
        r#"<form method="get" action="/visualize">
<label for="column">Choose a feature to visualize:</label>
<select id="column" name="column" onchange="this.form.submit()">{}</select>
<noscript><button type="submit">Show</button></noscript>
</form>
"#,
        options
    ));

    let status = match column_distribution(&table, &selected) {
        Ok((_, distribution)) => match render_distribution_svg(&selected, &distribution) {
            Ok(svg) => {
                body.push_str(&format!("<div class=\"chart\">{}</div>\n", svg));
                StatusCode::OK
            }
            Err(e) => {
                warn!("Chart rendering failed for '{}': {}", selected, e);
                body.push_str(&format!(
                    "<div class=\"alert alert-error\">❌ Could not draw chart: {}</div>\n",
                    escape_html(&e.to_string())
                ));
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
        Err(ApiError::NotFound(msg)) => {
            body.push_str(&format!(
                "<div class=\"alert alert-error\">❌ {}</div>\n",
                escape_html(&msg)
            ));
            StatusCode::NOT_FOUND
        }
        Err(e) => {
            warn!("Visualization failed for '{}': {}", selected, e);
            body.push_str(&format!(
                "<div class=\"alert alert-error\">❌ {}</div>\n",
                escape_html(&e.to_string())
            ));
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, cookie, Html(render_page(Section::Visualize, &body)))
}
