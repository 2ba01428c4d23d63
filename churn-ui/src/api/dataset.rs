//! Dataset upload and histogram API
//!
//! The uploaded CSV arrives as the raw request body and is stored in the
//! caller's session, replacing any earlier upload.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use churn_common::dataset::{ColumnKind, TablePreview, UploadedTable, PREVIEW_ROWS};
use churn_common::histogram::Distribution;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chart::render_distribution_svg;
use crate::session::Session;
use crate::{ApiError, ApiResult, AppState};

pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully!";

/// Response to a successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub rows: usize,
    pub columns: usize,
    pub preview: TablePreview,
}

/// Query parameters selecting a column
#[derive(Debug, Deserialize)]
pub struct ColumnQuery {
    pub column: String,
}

/// Histogram data for one column
#[derive(Debug, Serialize)]
pub struct HistogramResponse {
    pub column: String,
    pub column_kind: ColumnKind,
    pub distribution: Distribution,
}

/// Parse an upload body into a table
pub fn parse_upload(body: &[u8]) -> ApiResult<UploadedTable> {
    UploadedTable::from_csv_bytes(body).map_err(|e| {
        warn!("Rejected upload: {}", e);
        ApiError::from(e)
    })
}

/// Distribution of `column`, or `NotFound` for an unknown column
pub fn column_distribution(table: &UploadedTable, column: &str) -> ApiResult<(ColumnKind, Distribution)> {
    let kind = table
        .column_kind(column)
        .ok_or_else(|| ApiError::NotFound(format!("Column '{}' is not in the dataset", column)))?;
    let values = table
        .column_values(column)
        .ok_or_else(|| ApiError::Internal(format!("Column '{}' vanished", column)))?;
    Ok((kind, Distribution::from_values(&values)))
}

/// POST /api/dataset
///
/// **Request:** CSV text with a header row
/// **Response:** row/column counts and a preview of the first rows
///
/// **Errors:**
/// - 400 Bad Request: the body is not parseable CSV
/// - 413 Payload Too Large: body exceeds the configured limit
pub async fn upload_dataset(
    State(state): State<AppState>,
    session: Session,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let table = parse_upload(&body)?;
    info!(
        "Session {} uploaded dataset: {} rows x {} columns",
        session.id(),
        table.row_count(),
        table.column_count()
    );

    let table = state.sessions.store_dataset(session.id(), table).await;

    Ok((
        session.set_cookie(),
        Json(UploadResponse {
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            rows: table.row_count(),
            columns: table.column_count(),
            preview: table.head(PREVIEW_ROWS),
        }),
    ))
}

/// GET /api/dataset
///
/// Preview of the session's dataset
pub async fn get_dataset(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<impl IntoResponse> {
    let table = state
        .sessions
        .dataset(session.id())
        .await
        .ok_or(ApiError::NoDataset)?;

    Ok((session.set_cookie(), Json(table.head(PREVIEW_ROWS))))
}

/// GET /api/dataset/histogram?column=NAME
pub async fn get_histogram(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ColumnQuery>,
) -> ApiResult<impl IntoResponse> {
    let table = state
        .sessions
        .dataset(session.id())
        .await
        .ok_or(ApiError::NoDataset)?;
    let (column_kind, distribution) = column_distribution(&table, &query.column)?;

    Ok((
        session.set_cookie(),
        Json(HistogramResponse {
            column: query.column,
            column_kind,
            distribution,
        }),
    ))
}

/// GET /api/dataset/histogram.svg?column=NAME
pub async fn get_histogram_svg(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ColumnQuery>,
) -> ApiResult<impl IntoResponse> {
    let table = state
        .sessions
        .dataset(session.id())
        .await
        .ok_or(ApiError::NoDataset)?;
    let (_, distribution) = column_distribution(&table, &query.column)?;
    let svg = render_distribution_svg(&query.column, &distribution)?;

    Ok((
        session.set_cookie(),
        [(header::CONTENT_TYPE, "image/svg+xml")],
        svg,
    ))
}

/// Build dataset routes
pub fn dataset_routes() -> Router<AppState> {
    Router::new()
        .route("/api/dataset", get(get_dataset).post(upload_dataset))
        .route("/api/dataset/histogram", get(get_histogram))
        .route("/api/dataset/histogram.svg", get(get_histogram_svg))
}
