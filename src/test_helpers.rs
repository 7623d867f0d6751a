//! Shared test utilities for the tachyon test suite.
//!
//! Provides the fixture library, size table and URL bases the unit tests
//! resolve against, plus small markup and image-file helpers.
//!
//! # Fixtures
//!
//! | Attachment | File | Dimensions |
//! |---|---|---|
//! | 1 | `tachyon.jpg` | 1280x719 |
//! | 2 | `tachyon-large-scaled.jpg` (original `tachyon-large.jpg`, 5312x2988) | 2560x1440 |
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let rewriter = tachyon_rewriter();
//! let out = rewriter.rewrite(r#"<img class="wp-image-1 size-medium" src="http://example.org/wp-content/uploads/tachyon-300x169.jpg">"#);
//! assert_eq!(src_of(&out), "http://tachy.on/u/tachyon.jpg?fit=300,169");
//! ```

use std::path::Path;

use crate::library::{Attachment, Library};
use crate::rewrite::Rewriter;
use crate::sizing::{Dimensions, RegisteredSizes, SizeDefinition};
use crate::url::Urls;

pub const UPLOAD_URL: &str = "http://example.org/wp-content/uploads";
pub const CDN_URL: &str = "http://tachy.on/u";

// =========================================================================
// Fixture setup
// =========================================================================

/// The two test attachments.
pub fn tachyon_library() -> Library {
    Library::new()
        .with(Attachment {
            id: 1,
            file: "tachyon.jpg".to_string(),
            original_file: None,
            dimensions: Dimensions::new(1280, 719),
        })
        .with(Attachment {
            id: 2,
            file: "tachyon-large-scaled.jpg".to_string(),
            original_file: Some("tachyon-large.jpg".to_string()),
            dimensions: Dimensions::new(2560, 1440),
        })
}

/// WordPress defaults plus an `oversized` 2000x1000 fit size.
pub fn wordpress_sizes() -> RegisteredSizes {
    RegisteredSizes::wordpress_defaults().with("oversized", SizeDefinition::fit(2000, 1000))
}

pub fn urls() -> Urls {
    Urls::new(UPLOAD_URL, CDN_URL)
}

pub fn tachyon_rewriter() -> Rewriter<Library, RegisteredSizes> {
    Rewriter::new(tachyon_library(), wordpress_sizes(), urls())
}

/// Write a blank PNG, creating parent directories.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    image::RgbImage::new(width, height).save(path).unwrap();
}

// =========================================================================
// Markup extractors — panic with a clear message on miss
// =========================================================================

/// Value of the first `src="..."` attribute. Panics if there is none.
pub fn src_of(html: &str) -> &str {
    attr_of(html, "src")
}

/// Value of the first double-quoted `name="..."` attribute.
pub fn attr_of<'a>(html: &'a str, name: &str) -> &'a str {
    let needle = format!(" {name}=\"");
    let start = html
        .find(&needle)
        .map(|pos| pos + needle.len())
        .unwrap_or_else(|| panic!("no {name} attribute in: {html}"));
    let end = html[start..]
        .find('"')
        .unwrap_or_else(|| panic!("unterminated {name} attribute in: {html}"));
    &html[start..start + end]
}
