use axum::extract::DefaultBodyLimit;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use scarlet::adapters::catalog::JsonCatalog;
use scarlet::adapters::ffmpeg::FfmpegRunner;
use scarlet::adapters::http::{playlist, segment, thumbnail, upload};
use scarlet::application::job::MAX_CONCURRENT_JOBS;
use scarlet::{AppState, ArtifactStore, Config};
use std::sync::Arc;
use tokio::sync::Semaphore;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::fmt::init();

    let store = ArtifactStore::from_config(&config);
    store
        .ensure_layout()
        .await
        .expect("Failed to create storage directories");

    let state = Arc::new(AppState {
        store,
        runner: Arc::new(FfmpegRunner::new(config.ffmpeg_path.clone())),
        registry: Arc::new(JsonCatalog::new(config.catalog_path.clone())),
        jobs: Arc::new(Semaphore::new(MAX_CONCURRENT_JOBS)),
    });

    let mut router = Router::new()
        .route("/api/video/upload", post(upload::upload))
        .route("/api/video/playlist", get(playlist::playlist))
        .route("/api/video/segment", get(segment::segment))
        .route("/api/video/thumbnail/:filename", get(thumbnail::thumbnail))
        .layer(DefaultBodyLimit::disable())
        .with_state(state);

    if config.serve_upload_form {
        router = router.route("/", get(upload_form));
    }

    let addr = format!("{}:{}", config.addr, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind TCP listener");
    tracing::info!(%addr, "listening");
    axum::serve(listener, router)
        .await
        .expect("Server failed to start");
}

// Bare-bones form for exercising the pipeline without the real frontend.
async fn upload_form() -> Html<&'static str> {
    Html(
        r#"
        <!doctype html>
        <html>
            <head>
                <title>Upload a video</title>
            </head>
            <body>
                <h1>Upload a video</h1>
                <form action="/api/video/upload" method="post" enctype="multipart/form-data">
                    <div><label>Title: <input type="text" name="title"></label></div>
                    <div><label>Description: <input type="text" name="description"></label></div>
                    <div><label>Tags (comma separated): <input type="text" name="tags"></label></div>
                    <div><label>Thumbnail: <input type="file" name="thumbnail"></label></div>
                    <div><label>Video: <input type="file" name="videoFile"></label></div>
                    <div><input type="submit" value="Upload"></div>
                </form>
            </body>
        </html>
        "#,
    )
}
