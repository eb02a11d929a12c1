//! Child-process capability for the external transcoder.

use crate::error::EncodeError;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Runs one transcoder invocation to completion.
///
/// The real implementation spawns the transcoder as a separate OS process so
/// a crash or hang in the codec can never take down the orchestrating
/// process. Tests substitute an implementation that writes fixture files
/// instead of invoking a binary; the destination playlist is always the final
/// element of `args`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscodeRunner: Send + Sync {
    /// Run the transcoder with `args`, appending all process output to the
    /// log file at `log_path`. The child must be killed once `limit`
    /// expires; an unbounded child is a resource leak under load.
    async fn run(
        &self,
        args: &[String],
        log_path: &Path,
        limit: Duration,
    ) -> Result<(), EncodeError>;
}
