//! End-to-end pipeline test: an upload descriptor is driven through a
//! background job to a published package, then played back through the
//! gateway endpoints. A stub transcoder writes the files a real ffmpeg run
//! would produce.

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use scarlet::adapters::catalog::JsonCatalog;
use scarlet::adapters::http::playlist::{playlist, PlaylistKind, PlaylistQuery};
use scarlet::adapters::http::segment::{segment, SegmentQuery};
use scarlet::application::job::{TranscodeJob, MAX_CONCURRENT_JOBS};
use scarlet::domain::video::UploadDescriptor;
use scarlet::error::EncodeError;
use scarlet::ports::encoder::TranscodeRunner;
use scarlet::{AppState, ArtifactStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use tokio::sync::Semaphore;

struct FixtureTranscoder;

#[async_trait]
impl TranscodeRunner for FixtureTranscoder {
    async fn run(
        &self,
        args: &[String],
        _log_path: &Path,
        _limit: Duration,
    ) -> Result<(), EncodeError> {
        let playlist = PathBuf::from(args.last().unwrap());
        let dest = playlist.parent().unwrap();
        let rendition = dest.file_name().unwrap().to_str().unwrap();

        std::fs::write(
            &playlist,
            "#EXTM3U\n#EXT-X-TARGETDURATION:4\n#EXTINF:4.000000,\nseg_000.ts\n#EXTINF:2.000000,\nseg_001.ts\n#EXT-X-ENDLIST\n",
        )?;
        std::fs::write(dest.join("seg_000.ts"), format!("ts-payload:{}:000", rendition))?;
        std::fs::write(dest.join("seg_001.ts"), format!("ts-payload:{}:001", rendition))?;
        Ok(())
    }
}

struct Harness {
    _dir: TempDir,
    state: Arc<AppState>,
    catalog: Arc<JsonCatalog>,
    store: ArtifactStore,
}

async fn harness() -> Harness {
    let dir = tempdir().unwrap();
    let store = ArtifactStore::new(
        dir.path().join("video-stream"),
        dir.path().join("video-stream").join("backup"),
        dir.path().join("thumbnail"),
    );
    store.ensure_layout().await.unwrap();

    let catalog = Arc::new(JsonCatalog::new(dir.path().join("catalog.json")));
    let state = Arc::new(AppState {
        store: store.clone(),
        runner: Arc::new(FixtureTranscoder),
        registry: catalog.clone(),
        jobs: Arc::new(Semaphore::new(MAX_CONCURRENT_JOBS)),
    });

    Harness {
        _dir: dir,
        state,
        catalog,
        store,
    }
}

async fn run_upload(harness: &Harness, title: &str) {
    let source = harness
        .store
        .raw_upload_path(&scarlet::domain::slug::slugify(title), "mp4")
        .unwrap();
    std::fs::write(&source, b"synthetic five second clip").unwrap();

    let job = TranscodeJob::new(
        harness.store.clone(),
        harness.state.runner.clone(),
        harness.catalog.clone(),
    );
    job.run(UploadDescriptor {
        title: title.to_string(),
        description: "a test clip".to_string(),
        tags: vec!["test".to_string()],
        source_path: source,
    })
    .await;
}

fn header_str<'a>(response: &'a Response, name: header::HeaderName) -> &'a str {
    response.headers().get(name).unwrap().to_str().unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_upload_to_playback() {
    let h = harness().await;
    run_upload(&h, "My Test Clip").await;

    // Registered with the proxied master URL
    let entries = h.catalog.entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "my-test-clip");
    assert_eq!(
        entries[0].playlist_url,
        "/api/video/playlist?videoId=my-test-clip&type=master"
    );

    // Master manifest: three stream declarations, each pointing back at the
    // playlist endpoint
    let response = playlist(
        State(h.state.clone()),
        Query(PlaylistQuery {
            video_id: "my-test-clip".to_string(),
            kind: PlaylistKind::Master,
            quality: "v0".to_string(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE),
        "application/vnd.apple.mpegurl"
    );
    assert_eq!(header_str(&response, header::CACHE_CONTROL), "no-store");

    let master = body_text(response).await;
    assert_eq!(master.matches("#EXT-X-STREAM-INF:").count(), 3);
    for quality in ["v0", "v1", "v2"] {
        assert!(master.contains(&format!(
            "/api/video/playlist?videoId=my-test-clip&type=variant&quality={}",
            quality
        )));
    }

    // Variant manifest: segment lines rewritten to the segment endpoint
    let response = playlist(
        State(h.state.clone()),
        Query(PlaylistQuery {
            video_id: "my-test-clip".to_string(),
            kind: PlaylistKind::Variant,
            quality: "v0".to_string(),
        }),
    )
    .await
    .unwrap();
    let variant = body_text(response).await;
    assert!(variant.contains("/api/video/segment?videoId=my-test-clip&quality=v0&segment=seg_000.ts"));
    assert!(variant.contains("/api/video/segment?videoId=my-test-clip&quality=v0&segment=seg_001.ts"));

    // Segment: exactly the bytes the encoder wrote, with an explicit length
    let response = segment(
        State(h.state.clone()),
        Query(SegmentQuery {
            video_id: "my-test-clip".to_string(),
            quality: "v0".to_string(),
            segment: "seg_000.ts".to_string(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "video/mp2t");
    let expected = "ts-payload:v0:000";
    assert_eq!(
        header_str(&response, header::CONTENT_LENGTH),
        expected.len().to_string()
    );
    assert_eq!(body_text(response).await, expected);
}

#[tokio::test]
async fn test_playlist_absent_until_job_completes() {
    let h = harness().await;

    let err = playlist(
        State(h.state.clone()),
        Query(PlaylistQuery {
            video_id: "my-test-clip".to_string(),
            kind: PlaylistKind::Master,
            quality: "v0".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.into_response().status(), 404);

    run_upload(&h, "My Test Clip").await;

    assert!(playlist(
        State(h.state.clone()),
        Query(PlaylistQuery {
            video_id: "my-test-clip".to_string(),
            kind: PlaylistKind::Master,
            quality: "v0".to_string(),
        }),
    )
    .await
    .is_ok());
}

#[tokio::test]
async fn test_traversal_rejected_at_the_gateway() {
    let h = harness().await;
    run_upload(&h, "My Test Clip").await;

    let err = playlist(
        State(h.state.clone()),
        Query(PlaylistQuery {
            video_id: "../my-test-clip".to_string(),
            kind: PlaylistKind::Master,
            quality: "v0".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.into_response().status(), 400);

    let err = segment(
        State(h.state.clone()),
        Query(SegmentQuery {
            video_id: "my-test-clip".to_string(),
            quality: "v0".to_string(),
            segment: "../seg_000.ts".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.into_response().status(), 400);
}
