//! About page handler

use axum::response::{Html, IntoResponse};

use super::layout::{render_page, Section};
use crate::session::Session;

/// GET /about
pub async fn about_page(session: Session) -> impl IntoResponse {
    let body = r#"<h2>📘 About This App</h2>
<p>This web app uses a machine learning model to predict whether a customer
will churn based on their telco service details.</p>
<p><strong>Main Features:</strong></p>
<ul>
    <li>Upload and explore Telco datasets</li>
    <li>Visualize any feature</li>
    <li>Predict churn for a single customer</li>
</ul>
<p>The same operations are available as a JSON API:
<code>/api/schema</code> describes the prediction form and
<code>/api/predict</code> accepts its fields as a JSON object.</p>
"#;

    (session.set_cookie(), Html(render_page(Section::About, body)))
}
