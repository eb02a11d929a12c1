//! Segment endpoint: streams one `.ts` file.

use super::AppState;
use crate::adapters::store::ArtifactStore;
use crate::error::GatewayError;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

#[derive(Debug, Deserialize)]
pub struct SegmentQuery {
    #[serde(rename = "videoId")]
    pub video_id: String,
    pub quality: String,
    pub segment: String,
}

/// `GET /api/video/segment?videoId=<id>&quality=<rendition>&segment=<file>`
///
/// The segment name is the primary injection surface: it must carry the
/// segment extension and no traversal token, checked before any filesystem
/// access. The file is streamed, never buffered whole, so concurrent
/// playback of large segment sets does not spike memory.
pub async fn segment(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SegmentQuery>,
) -> Result<Response, GatewayError> {
    let (file, len) = open_segment(&state.store, &query).await?;

    Ok((
        [
            (header::CONTENT_TYPE, String::from("video/mp2t")),
            (header::CONTENT_LENGTH, len.to_string()),
            (header::CACHE_CONTROL, String::from("no-store")),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

async fn open_segment(
    store: &ArtifactStore,
    query: &SegmentQuery,
) -> Result<(File, u64), GatewayError> {
    if !query.segment.ends_with(".ts") {
        return Err(GatewayError::BadRequest(format!(
            "invalid segment name: {:?}",
            query.segment
        )));
    }

    let path = store.segment_path(&query.video_id, &query.quality, &query.segment)?;

    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(GatewayError::NotFound),
        Err(e) => return Err(e.into()),
    };
    let len = file.metadata().await?.len();
    Ok((file, len))
}
