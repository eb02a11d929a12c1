//! Upload intake: multipart parsing, artifact persistence, job dispatch.

use super::AppState;
use crate::application::job::TranscodeJob;
use crate::domain::slug::slugify;
use crate::domain::video::UploadDescriptor;
use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::{BoxError, Json};
use futures::{Stream, TryStreamExt};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::BufWriter;
use tokio_util::io::StreamReader;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct UploadAck {
    pub status: &'static str,
    pub title: String,
    #[serde(rename = "thumbnailUrl")]
    pub thumbnail_url: String,
}

/// `POST /api/video/upload` (multipart)
///
/// Saves the thumbnail and the raw video, then hands off to a background
/// transcode job and acknowledges immediately; encoding takes minutes and
/// never blocks the request cycle.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadAck>, (StatusCode, String)> {
    state
        .store
        .ensure_layout()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();
    let mut thumbnail: Option<Bytes> = None;
    let mut video: Option<(PathBuf, String)> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("title") => title = Some(read_text(field).await?),
            Some("description") => description = Some(read_text(field).await?),
            Some("tags") => tags = parse_tags(&read_text(field).await?),
            Some("thumbnail") => {
                thumbnail = Some(field.bytes().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, e.to_string())
                })?)
            }
            Some("videoFile") => {
                let ext = video_extension(field.file_name());
                // The id is unknown until the title field arrives, so the
                // video streams into a holding file first.
                let pending = state
                    .store
                    .pending_upload_path(&Uuid::new_v4().to_string());
                stream_to_file(&pending, field).await?;
                video = Some((pending, ext));
            }
            _ => {}
        }
    }

    let (title, description, thumbnail, (pending, ext)) = match (title, description, thumbnail, video)
    {
        (Some(t), Some(d), Some(th), Some(v)) => (t, d, th, v),
        (_, _, _, video) => {
            if let Some((pending, _)) = video {
                let _ = tokio::fs::remove_file(&pending).await;
            }
            return Err((StatusCode::BAD_REQUEST, "Missing required fields".to_owned()));
        }
    };

    let id = slugify(&title);
    if id.is_empty() {
        let _ = tokio::fs::remove_file(&pending).await;
        return Err((
            StatusCode::BAD_REQUEST,
            "Title yields an empty identifier".to_owned(),
        ));
    }

    let thumb_path = state
        .store
        .thumbnail_path(&id)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    tokio::fs::write(&thumb_path, &thumbnail)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let backup = state
        .store
        .raw_upload_path(&id, &ext)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    tokio::fs::rename(&pending, &backup)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    tracing::info!(video_id = %id, backup = %backup.display(), "upload accepted");

    let descriptor = UploadDescriptor {
        title,
        description,
        tags,
        source_path: backup,
    };
    let thumbnail_url = format!("/api/video/thumbnail/{}.jpg", id);

    TranscodeJob::new(
        state.store.clone(),
        state.runner.clone(),
        state.registry.clone(),
    )
    .spawn(state.jobs.clone(), descriptor);

    Ok(Json(UploadAck {
        status: "processing",
        title: id,
        thumbnail_url,
    }))
}

async fn read_text(
    field: axum::extract::multipart::Field<'_>,
) -> Result<String, (StatusCode, String)> {
    field
        .text()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Extension of the uploaded file, defaulting to mp4. Restricted to ASCII
/// alphanumerics so it can be embedded in the backup filename as-is.
fn video_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_lowercase)
        .unwrap_or_else(|| String::from("mp4"))
}

// Save a `Stream` to a file
async fn stream_to_file<S, E>(path: &PathBuf, stream: S) -> Result<(), (StatusCode, String)>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
{
    async {
        let body_with_io_error = stream.map_err(|err| io::Error::new(io::ErrorKind::Other, err));
        let body_reader = StreamReader::new(body_with_io_error);
        futures::pin_mut!(body_reader);

        let mut file = BufWriter::new(File::create(path).await?);
        tokio::io::copy(&mut body_reader, &mut file).await?;

        Ok::<_, io::Error>(())
    }
    .await
    .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
}
