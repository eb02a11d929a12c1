//! Package identifier derivation.

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Derive the filesystem- and URL-safe package identifier from a raw title.
///
/// Deterministic for any input: diacritics are stripped (NFD decomposition,
/// combining marks dropped), the rest lowercased, every run of
/// non-alphanumeric characters collapsed to a single hyphen, and leading or
/// trailing hyphens trimmed. The result contains only `[a-z0-9-]`.
pub fn slugify(title: &str) -> String {
    let folded: String = title
        .nfd()
        .filter(|&c| !is_combining_mark(c))
        .collect::<String>()
        .to_lowercase();

    let re = Regex::new(r"[^a-z0-9]+").unwrap();
    re.replace_all(&folded, "-").trim_matches('-').to_string()
}
