//! One rendition's encode: argument construction and execution.

use crate::domain::manifest::VARIANT_FILE;
use crate::domain::rendition::RenditionSpec;
use crate::error::EncodeError;
use crate::ports::encoder::TranscodeRunner;
use std::path::Path;
use std::time::Duration;

/// Segment length in seconds. Short enough for fast starts and tier
/// switching, long enough to keep segment counts reasonable.
const SEGMENT_SECONDS: u32 = 4;

/// Floor for the per-rendition transcode deadline.
const MIN_TIMEOUT_SECS: u64 = 300;
/// Additional allowance per MiB of source. Generous on purpose: the deadline
/// exists to stop runaway children, not to race healthy encodes.
const TIMEOUT_SECS_PER_MIB: u64 = 4;

/// Build the transcoder invocation for a single rendition: scale preserving
/// aspect ratio with even dimensions, cap video and audio bitrates at the
/// spec's targets with a 2x leaky-bucket buffer, and segment into a playlist
/// plus numbered `.ts` files under `dest_dir`. The variant playlist path is
/// always the final argument.
pub fn rendition_args(source: &Path, spec: &RenditionSpec, dest_dir: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        source.display().to_string(),
        "-vf".to_string(),
        format!(
            "scale=w={}:h={}:force_original_aspect_ratio=decrease:force_divisible_by=2",
            spec.width, spec.height
        ),
        "-c:v".to_string(),
        "h264".to_string(),
        "-b:v".to_string(),
        format!("{}k", spec.video_kbps),
        "-maxrate".to_string(),
        format!("{}k", spec.video_kbps),
        "-bufsize".to_string(),
        format!("{}k", spec.video_kbps * 2),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        format!("{}k", spec.audio_kbps),
        "-f".to_string(),
        "hls".to_string(),
        "-hls_time".to_string(),
        SEGMENT_SECONDS.to_string(),
        "-hls_list_size".to_string(),
        "0".to_string(),
        "-hls_segment_filename".to_string(),
        dest_dir.join("seg_%03d.ts").display().to_string(),
        dest_dir.join(VARIANT_FILE).display().to_string(),
    ]
}

/// Deadline proportional to source size.
pub fn transcode_limit(source_len: u64) -> Duration {
    let mib = source_len / (1024 * 1024);
    Duration::from_secs(MIN_TIMEOUT_SECS.max(mib * TIMEOUT_SECS_PER_MIB))
}

/// Encode one rendition of `source` into `dest_dir` (created if absent).
pub async fn encode_rendition<R>(
    runner: &R,
    source: &Path,
    spec: &RenditionSpec,
    dest_dir: &Path,
    log_path: &Path,
) -> Result<(), EncodeError>
where
    R: TranscodeRunner + ?Sized,
{
    tokio::fs::create_dir_all(dest_dir).await?;
    let source_len = tokio::fs::metadata(source).await?.len();
    let args = rendition_args(source, spec, dest_dir);
    runner.run(&args, log_path, transcode_limit(source_len)).await
}
