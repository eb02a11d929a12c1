//! Upload and publication records.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One upload's worth of form fields plus the saved source file.
/// Transient: consumed exactly once by the transcode job.
#[derive(Debug, Clone)]
pub struct UploadDescriptor {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Raw source video, already persisted to the backup area.
    pub source_path: PathBuf,
}

/// The record handed to the metadata registry once a package is complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedVideo {
    /// Derived package identifier (title slug).
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Proxied master-manifest URL, e.g. `/api/video/playlist?videoId=<id>&type=master`.
    pub playlist_url: String,
    pub thumbnail_url: String,
}
