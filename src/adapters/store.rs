//! Filesystem layout for raw uploads, thumbnails and HLS packages.
//!
//! Names and locates files; no business logic. Every identifier component
//! is checked for traversal tokens before it touches a path, since
//! identifiers partially originate from network input on the serving path.

use crate::config::Config;
use crate::domain::manifest::{MASTER_FILE, VARIANT_FILE};
use crate::error::PathSafety;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Name of the per-package transcoder log.
pub const LOG_FILE: &str = "ffmpeg.log";

#[derive(Clone, Debug)]
pub struct ArtifactStore {
    output_root: PathBuf,
    backup_dir: PathBuf,
    thumbnail_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(
        output_root: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
        thumbnail_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            output_root: output_root.into(),
            backup_dir: backup_dir.into(),
            thumbnail_dir: thumbnail_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.output_root.clone(),
            config.backup_dir.clone(),
            config.thumbnail_dir.clone(),
        )
    }

    /// Create the directory skeleton. Idempotent.
    pub async fn ensure_layout(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.output_root).await?;
        tokio::fs::create_dir_all(&self.backup_dir).await?;
        tokio::fs::create_dir_all(&self.thumbnail_dir).await?;
        Ok(())
    }

    /// Backup path for a raw upload. The unix-millis token keeps concurrent
    /// uploads of same-titled videos from colliding on the temporary file;
    /// the package directory itself is deterministic per id.
    pub fn raw_upload_path(&self, id: &str, ext: &str) -> Result<PathBuf, PathSafety> {
        let id = checked(id)?;
        let ext = checked(ext)?;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        Ok(self.backup_dir.join(format!("{}_{}.{}", id, millis, ext)))
    }

    /// Holding path for an upload still being received, before its title
    /// (and therefore its id) is known.
    pub fn pending_upload_path(&self, token: &str) -> PathBuf {
        self.backup_dir.join(format!("pending_{}.tmp", token))
    }

    pub fn package_root(&self, id: &str) -> Result<PathBuf, PathSafety> {
        Ok(self.output_root.join(checked(id)?))
    }

    pub fn master_playlist_path(&self, id: &str) -> Result<PathBuf, PathSafety> {
        Ok(self.package_root(id)?.join(MASTER_FILE))
    }

    pub fn variant_playlist_path(&self, id: &str, rendition: &str) -> Result<PathBuf, PathSafety> {
        Ok(self
            .package_root(id)?
            .join(checked(rendition)?)
            .join(VARIANT_FILE))
    }

    pub fn segment_path(
        &self,
        id: &str,
        rendition: &str,
        segment: &str,
    ) -> Result<PathBuf, PathSafety> {
        Ok(self
            .package_root(id)?
            .join(checked(rendition)?)
            .join(checked(segment)?))
    }

    pub fn log_path(&self, id: &str) -> Result<PathBuf, PathSafety> {
        Ok(self.package_root(id)?.join(LOG_FILE))
    }

    /// Canonical thumbnail location for a package id.
    pub fn thumbnail_path(&self, id: &str) -> Result<PathBuf, PathSafety> {
        Ok(self.thumbnail_dir.join(format!("{}.jpg", checked(id)?)))
    }

    /// Thumbnail location by stored file name (serving path).
    pub fn thumbnail_file(&self, file_name: &str) -> Result<PathBuf, PathSafety> {
        Ok(self.thumbnail_dir.join(checked(file_name)?))
    }
}

fn checked(component: &str) -> Result<&str, PathSafety> {
    if component.is_empty()
        || component.contains("..")
        || component.contains('/')
        || component.contains('\\')
    {
        tracing::warn!(component, "rejected unsafe path component");
        return Err(PathSafety(component.to_string()));
    }
    Ok(component)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ArtifactStore {
        ArtifactStore::new("/srv/video-stream", "/srv/video-stream/backup", "/srv/thumbnail")
    }

    #[test]
    fn test_package_layout() {
        let store = store();
        assert_eq!(
            store.master_playlist_path("clip").unwrap(),
            PathBuf::from("/srv/video-stream/clip/master.m3u8")
        );
        assert_eq!(
            store.variant_playlist_path("clip", "v1").unwrap(),
            PathBuf::from("/srv/video-stream/clip/v1/prog.m3u8")
        );
        assert_eq!(
            store.segment_path("clip", "v0", "seg_003.ts").unwrap(),
            PathBuf::from("/srv/video-stream/clip/v0/seg_003.ts")
        );
        assert_eq!(
            store.log_path("clip").unwrap(),
            PathBuf::from("/srv/video-stream/clip/ffmpeg.log")
        );
        assert_eq!(
            store.thumbnail_path("clip").unwrap(),
            PathBuf::from("/srv/thumbnail/clip.jpg")
        );
    }

    #[test]
    fn test_raw_upload_path_preserves_extension() {
        let path = store().raw_upload_path("clip", "mp4").unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("clip_"));
        assert!(name.ends_with(".mp4"));
        assert!(path.starts_with("/srv/video-stream/backup"));
    }

    #[test]
    fn test_traversal_rejected_everywhere() {
        let store = store();
        for bad in ["..", "a/..", "../a", "a/b", "a\\b", ""] {
            assert!(store.package_root(bad).is_err(), "id {:?}", bad);
            assert!(store.variant_playlist_path("clip", bad).is_err(), "rendition {:?}", bad);
            assert!(store.segment_path("clip", "v0", bad).is_err(), "segment {:?}", bad);
            assert!(store.thumbnail_file(bad).is_err(), "thumbnail {:?}", bad);
        }
    }

    #[test]
    fn test_error_carries_offending_component() {
        let err = store().package_root("../etc").unwrap_err();
        assert_eq!(err, PathSafety("../etc".to_string()));
    }
}
