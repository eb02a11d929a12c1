//! Error taxonomy for the ingestion pipeline and the streaming gateway.

use std::path::PathBuf;
use thiserror::Error;

/// A path component received from the network (or derived from user input)
/// that would escape its directory. Checked before any filesystem access.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsafe path component: {0:?}")]
pub struct PathSafety(pub String);

/// Failure of a single transcoder invocation.
///
/// The log file referenced here holds the child's full stdout/stderr;
/// transcoder failures are an expected failure mode and the log is the
/// primary postmortem artifact.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to spawn transcoder: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("transcoder exited with status {code:?}, log at {log:?}")]
    Exit { code: Option<i32>, log: PathBuf },

    #[error("transcoder killed after {limit_secs}s, log at {log:?}")]
    Timeout { limit_secs: u64, log: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of the rendition ladder. The first failing tier aborts the whole
/// package; no master playlist is ever written in this state.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("rendition {rendition} failed after {completed} completed renditions: {source}")]
    Rendition {
        rendition: &'static str,
        completed: usize,
        #[source]
        source: EncodeError,
    },

    #[error("failed to write master playlist")]
    Manifest(#[source] std::io::Error),
}

/// Terminal failure of one transcode job. Never surfaced to a waiting
/// client; the triggering request has already returned.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    PathSafety(#[from] PathSafety),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error("metadata registration failed: {0}")]
    Registry(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Read-side errors surfaced by the streaming gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<PathSafety> for GatewayError {
    fn from(err: PathSafety) -> Self {
        GatewayError::BadRequest(err.to_string())
    }
}
