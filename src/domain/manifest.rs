//! Master-playlist synthesis and proxied URL rewriting.
//!
//! Raw on-disk paths never reach a client: every playlist served by the
//! gateway is rewritten line by line so variant and segment references go
//! back through the playlist/segment endpoints. The rewrite point is also
//! where a per-segment access-control layer would hook in.

use crate::domain::rendition::RenditionSpec;

/// File name of the package-level master playlist.
pub const MASTER_FILE: &str = "master.m3u8";
/// File name of each rendition's segment playlist.
pub const VARIANT_FILE: &str = "prog.m3u8";

/// Render the master playlist for a fully completed ladder, one stream
/// declaration per rendition in ladder order.
pub fn master_playlist(renditions: &[RenditionSpec]) -> String {
    let mut out = String::from("#EXTM3U\n#EXT-X-VERSION:3\n");
    for spec in renditions {
        out.push_str(&format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}\n{}/{}\n",
            spec.bandwidth(),
            spec.resolution(),
            spec.name,
            VARIANT_FILE,
        ));
    }
    out
}

/// Rewrite a master playlist: every rendition-playlist reference becomes a
/// proxied variant-manifest URL carrying the rendition identifier.
pub fn rewrite_master(content: &str, video_id: &str) -> String {
    rewrite_lines(content, |trimmed| {
        if trimmed.ends_with(".m3u8") {
            let quality = trimmed.split('/').next().unwrap_or(trimmed);
            Some(format!(
                "/api/video/playlist?videoId={}&type=variant&quality={}",
                video_id, quality
            ))
        } else {
            None
        }
    })
}

/// Rewrite a variant playlist: every segment reference becomes a proxied
/// segment URL carrying id, rendition and segment filename.
pub fn rewrite_variant(content: &str, video_id: &str, quality: &str) -> String {
    rewrite_lines(content, |trimmed| {
        if trimmed.ends_with(".ts") {
            Some(format!(
                "/api/video/segment?videoId={}&quality={}&segment={}",
                video_id, quality, trimmed
            ))
        } else {
            None
        }
    })
}

// ffmpeg on Windows writes backslash-separated references; normalize before
// matching so rewriting sees forward slashes only.
fn rewrite_lines(content: &str, rewrite: impl Fn(&str) -> Option<String>) -> String {
    content
        .replace('\\', "/")
        .lines()
        .map(|line| rewrite(line.trim()).unwrap_or_else(|| line.to_string()))
        .collect::<Vec<_>>()
        .join("\n")
}
