//! Manifest endpoint: resolves a playlist on disk and serves it rewritten.

use super::AppState;
use crate::adapters::store::ArtifactStore;
use crate::domain::manifest;
use crate::error::GatewayError;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::io::ErrorKind;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistKind {
    Master,
    Variant,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistQuery {
    #[serde(rename = "videoId")]
    pub video_id: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: PlaylistKind,
    #[serde(default = "default_quality")]
    pub quality: String,
}

fn default_kind() -> PlaylistKind {
    PlaylistKind::Master
}

fn default_quality() -> String {
    String::from("v0")
}

/// `GET /api/video/playlist?videoId=<id>&type=master|variant&quality=<rendition>`
///
/// Manifests are served `no-store`: they are rewritten per request, and a
/// package may reappear after a re-encode.
pub async fn playlist(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlaylistQuery>,
) -> Result<Response, GatewayError> {
    let body = load_playlist(&state.store, &query).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/vnd.apple.mpegurl"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
        .into_response())
}

/// A package directory whose master playlist is missing (still encoding, or
/// a failed job) is indistinguishable from an absent package: 404.
async fn load_playlist(
    store: &ArtifactStore,
    query: &PlaylistQuery,
) -> Result<String, GatewayError> {
    let path = match query.kind {
        PlaylistKind::Master => store.master_playlist_path(&query.video_id)?,
        PlaylistKind::Variant => store.variant_playlist_path(&query.video_id, &query.quality)?,
    };

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(GatewayError::NotFound),
        Err(e) => return Err(e.into()),
    };

    Ok(match query.kind {
        PlaylistKind::Master => manifest::rewrite_master(&content, &query.video_id),
        PlaylistKind::Variant => {
            manifest::rewrite_variant(&content, &query.video_id, &query.quality)
        }
    })
}
