use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderValue, header},
    response::Response,
};

use crate::{
    application::{documents::ExportRequest, error::AppError},
    infra::http::AppState,
};

/// Binary on success. Failures answer with the plain-text error body and
/// never a partial document.
pub async fn export_document(
    State(state): State<AppState>,
    Query(request): Query<ExportRequest>,
) -> Result<Response, AppError> {
    let document = state.documents.export(&request).await?;
    let disposition = format!("attachment; filename=\"{}\"", document.file_name());
    let media_type = document.media_type();

    let mut response = Response::new(Body::from(document.bytes));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(media_type));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}
