//! Environment configuration.

use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Root of the per-video HLS package tree
    pub output_root: PathBuf,
    /// Backup area for raw uploads
    pub backup_dir: PathBuf,
    /// Directory for uploaded thumbnails
    pub thumbnail_dir: PathBuf,
    /// Path to the published-video catalog file
    pub catalog_path: PathBuf,
    /// Transcoder binary to spawn
    pub ffmpeg_path: String,
    /// Serve a plain HTML upload form on `/`
    pub serve_upload_form: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let output_root =
            PathBuf::from(env::var("VIDEO_DIR").unwrap_or_else(|_| String::from("./video-stream")));
        let backup_dir = output_root.join("backup");

        Self {
            addr: env::var("ADDR").unwrap_or_else(|_| String::from("127.0.0.1")),
            port: env::var("PORT").unwrap_or_else(|_| String::from("3000")),
            output_root,
            backup_dir,
            thumbnail_dir: PathBuf::from(
                env::var("THUMB_DIR").unwrap_or_else(|_| String::from("./thumbnail")),
            ),
            catalog_path: PathBuf::from(
                env::var("CATALOG_PATH").unwrap_or_else(|_| String::from("./catalog.json")),
            ),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| String::from("ffmpeg")),
            serve_upload_form: env::var("SERVE_UPLOAD_FORM")
                .unwrap_or_else(|_| String::from("false"))
                .parse()
                .unwrap_or(false),
        }
    }
}
