//! HTTP inbound adapters: upload intake and the streaming gateway.

pub mod playlist;
pub mod segment;
pub mod thumbnail;
pub mod upload;

use crate::adapters::store::ArtifactStore;
use crate::error::GatewayError;
use crate::ports::encoder::TranscodeRunner;
use crate::ports::registry::VideoRegistry;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Shared state for all routes.
pub struct AppState {
    pub store: ArtifactStore,
    pub runner: Arc<dyn TranscodeRunner>,
    pub registry: Arc<dyn VideoRegistry>,
    /// Bounds concurrently transcoding uploads.
    pub jobs: Arc<Semaphore>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            GatewayError::NotFound => {
                (StatusCode::NOT_FOUND, "Not found".to_string()).into_response()
            }
            GatewayError::Io(e) => {
                tracing::error!(error = %e, "gateway i/o failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()).into_response()
            }
        }
    }
}
