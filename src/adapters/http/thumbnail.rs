//! Thumbnail serving.

use super::AppState;
use crate::error::GatewayError;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use std::io::ErrorKind;
use std::sync::Arc;

/// `GET /api/video/thumbnail/{filename}`
///
/// Thumbnails are written once per upload and referenced by an immutable
/// filename, so long-lived caching is safe here.
pub async fn thumbnail(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, GatewayError> {
    let path = state.store.thumbnail_file(&filename)?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(GatewayError::NotFound),
        Err(e) => return Err(e.into()),
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type(&filename)),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    )
        .into_response())
}

fn content_type(filename: &str) -> &'static str {
    match filename.rsplit('.').next() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
