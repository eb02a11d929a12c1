//! Scarlet - Video ingestion and HLS streaming pipeline
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (slugs, renditions, manifests)
//! - ports/: Trait definitions (transcoder process, metadata registry)
//! - adapters/: Concrete implementations (ffmpeg, filesystem layout,
//!   JSON catalog, HTTP endpoints)
//! - application/: Pipeline services (variant encoder, package assembler,
//!   transcode job)
//! - config: Environment configuration
//!
//! An upload is saved to the backup area, handed to a background transcode
//! job that encodes the rendition ladder sequentially and writes the master
//! playlist last, then registered with the metadata store. Playback goes
//! through the gateway endpoints, which rewrite manifests into proxied URLs
//! and stream segments with path-safety checks.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

// Re-exports for convenience
pub use adapters::http::AppState;
pub use adapters::store::ArtifactStore;
pub use config::Config;
