//! Package assembly: the sequential rendition ladder plus the master
//! playlist.

use crate::application::encoder::encode_rendition;
use crate::domain::manifest::{self, MASTER_FILE};
use crate::domain::rendition::LADDER;
use crate::error::AssembleError;
use crate::ports::encoder::TranscodeRunner;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Assembly progress for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblerState {
    Idle,
    EncodingRendition(usize),
    WritingManifest,
    Complete,
    Failed {
        rendition: &'static str,
        completed: usize,
    },
}

pub struct PackageAssembler {
    runner: Arc<dyn TranscodeRunner>,
    state: AssemblerState,
}

impl PackageAssembler {
    pub fn new(runner: Arc<dyn TranscodeRunner>) -> Self {
        Self {
            runner,
            state: AssemblerState::Idle,
        }
    }

    pub fn state(&self) -> &AssemblerState {
        &self.state
    }

    /// Encode every rendition of `source` into its own subdirectory of
    /// `package_root`, highest quality first, then write the master
    /// playlist.
    ///
    /// Renditions run strictly one at a time: transcoding is CPU-bound and
    /// memory-intensive, and encoding a ladder concurrently for one upload
    /// would degrade throughput for every other upload on the host.
    ///
    /// The master playlist is written only after the full ladder succeeds;
    /// its presence is the sole durable signal of package completeness. A
    /// failed tier aborts the remaining tiers. Already-written rendition
    /// output is left in place; cleanup policy belongs to the job.
    pub async fn assemble(
        &mut self,
        source: &Path,
        package_root: &Path,
        log_path: &Path,
    ) -> Result<(), AssembleError> {
        for (i, spec) in LADDER.iter().enumerate() {
            self.state = AssemblerState::EncodingRendition(i);
            let dest = package_root.join(spec.name);
            info!(rendition = spec.name, "encoding rendition");

            if let Err(source_err) =
                encode_rendition(self.runner.as_ref(), source, spec, &dest, log_path).await
            {
                self.state = AssemblerState::Failed {
                    rendition: spec.name,
                    completed: i,
                };
                return Err(AssembleError::Rendition {
                    rendition: spec.name,
                    completed: i,
                    source: source_err,
                });
            }
        }

        self.state = AssemblerState::WritingManifest;
        let master = manifest::master_playlist(&LADDER);
        tokio::fs::write(package_root.join(MASTER_FILE), master)
            .await
            .map_err(AssembleError::Manifest)?;

        self.state = AssemblerState::Complete;
        Ok(())
    }
}
