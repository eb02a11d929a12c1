//! The background transcode job: one upload, end to end.

use crate::adapters::store::ArtifactStore;
use crate::application::assembler::PackageAssembler;
use crate::domain::slug::slugify;
use crate::domain::video::{PublishedVideo, UploadDescriptor};
use crate::error::JobError;
use crate::ports::encoder::TranscodeRunner;
use crate::ports::registry::VideoRegistry;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Uploads transcoding at once. Encoding is CPU-bound; a small bound keeps
/// the host responsive while remaining jobs wait on the semaphore.
pub const MAX_CONCURRENT_JOBS: usize = 2;

pub struct TranscodeJob {
    store: ArtifactStore,
    runner: Arc<dyn TranscodeRunner>,
    registry: Arc<dyn VideoRegistry>,
}

impl TranscodeJob {
    pub fn new(
        store: ArtifactStore,
        runner: Arc<dyn TranscodeRunner>,
        registry: Arc<dyn VideoRegistry>,
    ) -> Self {
        Self {
            store,
            runner,
            registry,
        }
    }

    /// Fire-and-forget dispatch: the caller's request returns immediately
    /// while the job runs on the runtime, gated by `jobs`. The handle is
    /// only awaited by tests.
    pub fn spawn(self, jobs: Arc<Semaphore>, descriptor: UploadDescriptor) -> JoinHandle<()> {
        tokio::spawn(async move {
            let _permit = match jobs.acquire_owned().await {
                Ok(permit) => permit,
                // semaphore closed during shutdown
                Err(_) => return,
            };
            self.run(descriptor).await;
        })
    }

    /// Drive one upload to a published package or a logged failure.
    ///
    /// On failure the raw backup and thumbnail stay on disk for manual
    /// recovery, no metadata is registered, and the upload is simply absent
    /// from listings; a partial package is never user-visible.
    pub async fn run(&self, descriptor: UploadDescriptor) {
        let id = slugify(&descriptor.title);
        if id.is_empty() {
            error!(title = %descriptor.title, "title yields an empty package identifier");
            return;
        }

        info!(video_id = %id, source = %descriptor.source_path.display(), "transcode job started");
        match self.process(&id, &descriptor).await {
            Ok(()) => info!(video_id = %id, "package published"),
            Err(e) => error!(video_id = %id, error = %e, "transcode job failed"),
        }
    }

    async fn process(&self, id: &str, descriptor: &UploadDescriptor) -> Result<(), JobError> {
        let package_root = self.store.package_root(id)?;
        tokio::fs::create_dir_all(&package_root).await?;
        let log_path = self.store.log_path(id)?;

        let mut assembler = PackageAssembler::new(self.runner.clone());
        assembler
            .assemble(&descriptor.source_path, &package_root, &log_path)
            .await?;

        let video = PublishedVideo {
            id: id.to_string(),
            title: descriptor.title.clone(),
            description: descriptor.description.clone(),
            tags: descriptor.tags.clone(),
            playlist_url: format!("/api/video/playlist?videoId={}&type=master", id),
            thumbnail_url: format!("/api/video/thumbnail/{}.jpg", id),
        };
        self.registry
            .register(&video)
            .await
            .map_err(JobError::Registry)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::catalog::JsonCatalog;
    use crate::error::EncodeError;
    use crate::ports::registry::MockVideoRegistry;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tempfile::tempdir;

    struct FixtureRunner;

    #[async_trait]
    impl TranscodeRunner for FixtureRunner {
        async fn run(
            &self,
            args: &[String],
            _log_path: &Path,
            _limit: Duration,
        ) -> Result<(), EncodeError> {
            let playlist = PathBuf::from(args.last().unwrap());
            let dest = playlist.parent().unwrap();
            std::fs::write(&playlist, "#EXTM3U\nseg_000.ts\n#EXT-X-ENDLIST\n")?;
            std::fs::write(dest.join("seg_000.ts"), b"segment-bytes")?;
            Ok(())
        }
    }

    struct FailingRunner;

    #[async_trait]
    impl TranscodeRunner for FailingRunner {
        async fn run(
            &self,
            _args: &[String],
            log_path: &Path,
            _limit: Duration,
        ) -> Result<(), EncodeError> {
            Err(EncodeError::Exit {
                code: Some(1),
                log: log_path.to_path_buf(),
            })
        }
    }

    fn store_in(dir: &Path) -> ArtifactStore {
        ArtifactStore::new(
            dir.join("video-stream"),
            dir.join("video-stream").join("backup"),
            dir.join("thumbnail"),
        )
    }

    fn descriptor_in(dir: &Path) -> UploadDescriptor {
        let source = dir.join("video-stream").join("backup").join("clip_0.mp4");
        std::fs::write(&source, b"raw upload").unwrap();
        UploadDescriptor {
            title: "My Test Clip".to_string(),
            description: "a clip".to_string(),
            tags: vec!["test".to_string()],
            source_path: source,
        }
    }

    #[tokio::test]
    async fn test_successful_job_registers_published_video() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure_layout().await.unwrap();
        let descriptor = descriptor_in(dir.path());

        let catalog = Arc::new(JsonCatalog::new(dir.path().join("catalog.json")));
        let job = TranscodeJob::new(store.clone(), Arc::new(FixtureRunner), catalog.clone());
        job.run(descriptor).await;

        let entries = catalog.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "my-test-clip");
        assert_eq!(entries[0].title, "My Test Clip");
        assert_eq!(
            entries[0].playlist_url,
            "/api/video/playlist?videoId=my-test-clip&type=master"
        );
        assert!(store
            .master_playlist_path("my-test-clip")
            .unwrap()
            .is_file());
    }

    #[tokio::test]
    async fn test_failed_job_registers_nothing_and_keeps_backup() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure_layout().await.unwrap();
        let descriptor = descriptor_in(dir.path());
        let source = descriptor.source_path.clone();

        let mut registry = MockVideoRegistry::new();
        registry.expect_register().times(0);

        let job = TranscodeJob::new(store.clone(), Arc::new(FailingRunner), Arc::new(registry));
        job.run(descriptor).await;

        assert!(!store.master_playlist_path("my-test-clip").unwrap().exists());
        // raw artifact retained for manual retry
        assert!(source.is_file());
    }

    #[tokio::test]
    async fn test_spawn_returns_before_completion() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure_layout().await.unwrap();
        let descriptor = descriptor_in(dir.path());

        let catalog = Arc::new(JsonCatalog::new(dir.path().join("catalog.json")));
        let job = TranscodeJob::new(store.clone(), Arc::new(FixtureRunner), catalog.clone());

        let jobs = Arc::new(Semaphore::new(MAX_CONCURRENT_JOBS));
        let handle = job.spawn(jobs, descriptor);

        handle.await.unwrap();
        assert_eq!(catalog.entries().await.unwrap().len(), 1);
    }
}
