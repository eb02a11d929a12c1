//! Real transcoder adapter: ffmpeg as a child OS process.

use crate::error::EncodeError;
use crate::ports::encoder::TranscodeRunner;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Spawns the configured ffmpeg binary for each invocation. All child output
/// is appended to the per-package log file; transcoder failures are an
/// expected failure mode and the log is what gets inspected afterwards.
#[derive(Clone, Debug)]
pub struct FfmpegRunner {
    binary: String,
}

impl FfmpegRunner {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl TranscodeRunner for FfmpegRunner {
    async fn run(
        &self,
        args: &[String],
        log_path: &Path,
        limit: Duration,
    ) -> Result<(), EncodeError> {
        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // an expired or cancelled job must not leave the child running
            .kill_on_drop(true);

        let child = command.spawn().map_err(EncodeError::Spawn)?;

        let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(waited) => waited?,
            Err(_) => {
                let note = format!("transcoder killed after {}s\n", limit.as_secs());
                append_log(log_path, &[], note.as_bytes()).await?;
                return Err(EncodeError::Timeout {
                    limit_secs: limit.as_secs(),
                    log: log_path.to_path_buf(),
                });
            }
        };

        append_log(log_path, &output.stdout, &output.stderr).await?;

        if !output.status.success() {
            return Err(EncodeError::Exit {
                code: output.status.code(),
                log: log_path.to_path_buf(),
            });
        }
        Ok(())
    }
}

async fn append_log(log_path: &Path, stdout: &[u8], stderr: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .await?;
    file.write_all(stdout).await?;
    file.write_all(stderr).await?;
    file.flush().await?;
    Ok(())
}
