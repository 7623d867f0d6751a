//! Centralized filename parsing for the WordPress upload naming convention.
//!
//! WordPress derives every generated file from the uploaded original:
//!
//! - `photo.jpg` → the upload as received
//! - `photo-scaled.jpg` → the downsized master, written when the upload exceeds
//!   the big-image threshold
//! - `photo-300x169.jpg` → an intermediate size, `-{width}x{height}` before the
//!   extension
//!
//! This module extracts those parts so the rewriter can tell which attachment
//! a URL belongs to and which size it encodes, and so a library scan can skip
//! generated intermediates.
//!
//! The size suffix is a heuristic: an uploaded file that happens to be named
//! `banner-1200x400.jpg` parses as an intermediate. Callers confirm the result
//! against the attachment before acting on it.

use regex::Regex;
use std::sync::OnceLock;

/// Extensions of files WordPress treats as resizable images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "jpe", "png", "gif", "webp"];

/// Extensions of rendered pages the CLI rewrites when walking a directory.
pub const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

/// Result of parsing an upload path like `2020/01/photo-300x169.jpg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUpload {
    /// Path of the original upload, size suffix and `-scaled` marker removed
    /// (e.g. `2020/01/photo.jpg`).
    pub base: String,
    /// `(width, height)` from a `-{W}x{H}` suffix.
    pub size: Option<(u32, u32)>,
    /// Whether the path carries the `-scaled` master marker.
    pub scaled: bool,
}

fn regex_upload() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<stem>.+?)(?P<scaled>-scaled)?(?:-(?P<w>[0-9]+)x(?P<h>[0-9]+))?\.(?P<ext>[A-Za-z0-9]+)$",
        )
        .unwrap()
    })
}

/// Parse an upload path. Returns `None` for non-image extensions and for
/// size suffixes that overflow.
///
/// Handles these patterns:
/// - `"photo.jpg"` → base=`photo.jpg`, size=None, scaled=false
/// - `"photo-300x169.jpg"` → base=`photo.jpg`, size=Some((300, 169))
/// - `"photo-scaled.jpg"` → base=`photo.jpg`, scaled=true
/// - `"photo-scaled-300x169.jpg"` → base=`photo.jpg`, size=Some((300, 169)), scaled=true
/// - `"notes.txt"` → None
pub fn parse_upload_path(path: &str) -> Option<ParsedUpload> {
    let caps = regex_upload().captures(path)?;
    let ext = &caps["ext"];
    if !IMAGE_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
    {
        return None;
    }

    let size = match (caps.name("w"), caps.name("h")) {
        (Some(w), Some(h)) => Some((w.as_str().parse().ok()?, h.as_str().parse().ok()?)),
        _ => None,
    };

    Some(ParsedUpload {
        base: format!("{}.{}", &caps["stem"], ext),
        size,
        scaled: caps.name("scaled").is_some(),
    })
}
