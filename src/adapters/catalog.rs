//! File-backed video registry for the monolith deployment.
//!
//! Stands in for the external metadata store: completed uploads are appended
//! to a JSON catalog that the listing side reads.

use crate::domain::video::PublishedVideo;
use crate::ports::registry::VideoRegistry;
use async_trait::async_trait;
use std::error::Error;
use std::path::PathBuf;
use tokio::sync::Mutex;

pub struct JsonCatalog {
    path: PathBuf,
    // serializes read-modify-write cycles across concurrent job completions
    write_lock: Mutex<()>,
}

impl JsonCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub async fn entries(&self) -> Result<Vec<PublishedVideo>, Box<dyn Error + Send + Sync>> {
        read_entries(&self.path).await
    }
}

async fn read_entries(path: &PathBuf) -> Result<Vec<PublishedVideo>, Box<dyn Error + Send + Sync>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl VideoRegistry for JsonCatalog {
    async fn register(&self, video: &PublishedVideo) -> Result<(), Box<dyn Error + Send + Sync>> {
        let _guard = self.write_lock.lock().await;

        let mut entries = read_entries(&self.path).await?;
        entries.push(video.clone());

        let json = serde_json::to_vec_pretty(&entries)?;
        tokio::fs::write(&self.path, json).await?;

        tracing::info!(video_id = %video.id, "registered video in catalog");
        Ok(())
    }
}
