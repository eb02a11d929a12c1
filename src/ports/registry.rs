//! Outbound port to the metadata store.

use crate::domain::video::PublishedVideo;
use async_trait::async_trait;
use std::error::Error;

/// Invoked once per successfully assembled package; makes the video visible
/// to listings. Never called for a failed job, so partial packages are never
/// user-visible.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoRegistry: Send + Sync {
    async fn register(&self, video: &PublishedVideo) -> Result<(), Box<dyn Error + Send + Sync>>;
}
