//! Attachment lookup: the dimension resolver behind every resize.
//!
//! The rewriter never measures images itself. It asks a [`MediaLibrary`] for
//! an attachment by id and gets back the master file and its dimensions.
//!
//! ## Masters
//!
//! When an upload exceeds WordPress's big-image threshold, WordPress keeps the
//! original (`photo.jpg`, say 5312x2988) and writes a downsized master
//! (`photo-scaled.jpg`, 2560x1440). Every size is computed from, and served
//! from, the master. [`Attachment::file`] and [`Attachment::dimensions`]
//! therefore always describe the master; the untouched upload, if any, is
//! [`Attachment::original_file`].
//!
//! ## Manifest
//!
//! [`Library`] is the file-backed implementation. It loads a JSON manifest:
//!
//! ```json
//! {
//!   "version": 1,
//!   "attachments": [
//!     { "id": 1, "file": "tachyon.jpg", "dimensions": { "width": 1280, "height": 719 } },
//!     {
//!       "id": 2,
//!       "file": "tachyon-large-scaled.jpg",
//!       "original_file": "tachyon-large.jpg",
//!       "dimensions": { "width": 2560, "height": 1440 }
//!     }
//!   ]
//! }
//! ```
//!
//! [`Library::scan`] builds one from an uploads directory by reading image
//! headers; generated `-{W}x{H}` intermediates are skipped.

use crate::naming::parse_upload_path;
use crate::sizing::Dimensions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Version of the manifest format.
const MANIFEST_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Failed to read image {path}: {source}")]
    Image {
        path: String,
        source: image::ImageError,
    },
    #[error("Library validation error: {0}")]
    Validation(String),
}

/// An uploaded image as WordPress knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Attachment {
    pub id: u64,
    /// Master file, relative to the uploads directory.
    pub file: String,
    /// The upload as received, when the master is a downsized copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file: Option<String>,
    /// Dimensions of the master.
    pub dimensions: Dimensions,
}

impl Attachment {
    /// Whether `path` (relative to uploads) is one of this attachment's files:
    /// the master, the original, or an intermediate generated from them.
    pub fn owns(&self, path: &str) -> bool {
        let Some(parsed) = parse_upload_path(path) else {
            return false;
        };
        [Some(self.file.as_str()), self.original_file.as_deref()]
            .into_iter()
            .flatten()
            .filter_map(parse_upload_path)
            .any(|own| own.base == parsed.base)
    }
}

/// Read-only attachment lookup.
pub trait MediaLibrary: Sync {
    fn attachment(&self, id: u64) -> Option<Attachment>;

    /// Master dimensions of an attachment.
    fn dimensions(&self, id: u64) -> Option<Dimensions> {
        self.attachment(id).map(|a| a.dimensions)
    }
}

/// On-disk form of a [`Library`].
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LibraryManifest {
    version: u32,
    attachments: Vec<Attachment>,
}

/// Attachments keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    attachments: BTreeMap<u64, Attachment>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an attachment, builder style.
    pub fn with(mut self, attachment: Attachment) -> Self {
        self.insert(attachment);
        self
    }

    pub fn insert(&mut self, attachment: Attachment) {
        self.attachments.insert(attachment.id, attachment);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.values()
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    /// Parse a manifest, rejecting unknown versions and duplicate ids.
    pub fn from_json(json: &str) -> Result<Self, LibraryError> {
        let manifest: LibraryManifest = serde_json::from_str(json)?;
        if manifest.version != MANIFEST_VERSION {
            return Err(LibraryError::Validation(format!(
                "unsupported manifest version {} (expected {MANIFEST_VERSION})",
                manifest.version
            )));
        }

        let mut library = Self::new();
        for attachment in manifest.attachments {
            if library.attachments.contains_key(&attachment.id) {
                return Err(LibraryError::Validation(format!(
                    "duplicate attachment id {}",
                    attachment.id
                )));
            }
            library.insert(attachment);
        }
        Ok(library)
    }

    pub fn to_json(&self) -> Result<String, LibraryError> {
        let manifest = LibraryManifest {
            version: MANIFEST_VERSION,
            attachments: self.attachments.values().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&manifest)?)
    }

    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn save(&self, path: &Path) -> Result<(), LibraryError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Build a library from an uploads directory.
    ///
    /// Each original upload becomes one attachment, with ids assigned in
    /// path order starting at 1. A `name-scaled.ext` sibling becomes the
    /// attachment's master. Files with a `-{W}x{H}` suffix are generated
    /// intermediates and are skipped.
    pub fn scan(uploads: &Path) -> Result<Self, LibraryError> {
        // base path → (upload, scaled master)
        let mut groups: BTreeMap<String, (Option<String>, Option<String>)> = BTreeMap::new();

        for entry in WalkDir::new(uploads).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(uploads) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let Some(parsed) = parse_upload_path(&relative) else {
                continue;
            };
            if parsed.size.is_some() {
                debug!(file = %relative, "skipping intermediate size");
                continue;
            }

            let group = groups.entry(parsed.base).or_default();
            if parsed.scaled {
                group.1 = Some(relative);
            } else {
                group.0 = Some(relative);
            }
        }

        let mut library = Self::new();
        for (id, (upload, scaled)) in (1u64..).zip(groups.into_values()) {
            let (file, original_file) = match (upload, scaled) {
                (upload, Some(scaled)) => (scaled, upload),
                (Some(upload), None) => (upload, None),
                (None, None) => continue,
            };
            let dimensions = read_dimensions(&uploads.join(&file), &file)?;
            debug!(id, %file, %dimensions, "found attachment");
            library.insert(Attachment {
                id,
                file,
                original_file,
                dimensions,
            });
        }
        Ok(library)
    }
}

/// Read pixel dimensions from an image header.
fn read_dimensions(path: &Path, display: &str) -> Result<Dimensions, LibraryError> {
    let (width, height) = image::image_dimensions(path).map_err(|source| LibraryError::Image {
        path: display.to_string(),
        source,
    })?;
    Dimensions::try_new(width, height)
        .ok_or_else(|| LibraryError::Validation(format!("{display} has zero-sized dimensions")))
}

impl MediaLibrary for Library {
    fn attachment(&self, id: u64) -> Option<Attachment> {
        self.attachments.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{tachyon_library, write_png};
    use tempfile::TempDir;

    #[test]
    fn lookup_returns_master_dimensions() {
        let library = tachyon_library();
        assert_eq!(library.dimensions(2), Some(Dimensions::new(2560, 1440)));
        assert_eq!(library.attachment(2).unwrap().file, "tachyon-large-scaled.jpg");
        assert_eq!(library.attachment(99), None);
    }

    #[test]
    fn owns_intermediates_of_master_and_original() {
        let large = tachyon_library().attachment(2).unwrap();
        assert!(large.owns("tachyon-large-scaled.jpg"));
        assert!(large.owns("tachyon-large.jpg"));
        assert!(large.owns("tachyon-large-1024x576.jpg"));
        assert!(!large.owns("tachyon-150x150.jpg"));
        assert!(!large.owns("tachyon-large.pdf"));
    }

    #[test]
    fn json_roundtrip_preserves_attachments() {
        let library = tachyon_library();
        let parsed = Library::from_json(&library.to_json().unwrap()).unwrap();
        assert_eq!(parsed, library);
    }

    #[test]
    fn from_json_rejects_wrong_version() {
        let err = Library::from_json(r#"{"version": 7, "attachments": []}"#).unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
    }

    #[test]
    fn from_json_rejects_duplicate_ids() {
        let json = r#"{"version": 1, "attachments": [
            {"id": 1, "file": "a.jpg", "dimensions": {"width": 10, "height": 10}},
            {"id": 1, "file": "b.jpg", "dimensions": {"width": 10, "height": 10}}
        ]}"#;
        let err = Library::from_json(json).unwrap_err();
        assert!(err.to_string().contains("duplicate attachment id 1"));
    }

    #[test]
    fn from_json_rejects_zero_dimensions() {
        let json = r#"{"version": 1, "attachments": [
            {"id": 1, "file": "a.jpg", "dimensions": {"width": 0, "height": 10}}
        ]}"#;
        assert!(matches!(Library::from_json(json), Err(LibraryError::Json(_))));
    }

    #[test]
    fn save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("library.json");
        tachyon_library().save(&path).unwrap();
        assert_eq!(Library::load(&path).unwrap(), tachyon_library());
    }

    #[test]
    fn scan_pairs_scaled_masters_and_skips_intermediates() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("2020/01/beach.png"), 64, 36);
        write_png(&tmp.path().join("2020/01/beach-32x18.png"), 32, 18);
        write_png(&tmp.path().join("2020/01/big.png"), 120, 90);
        write_png(&tmp.path().join("2020/01/big-scaled.png"), 40, 30);
        fs::write(tmp.path().join("2020/01/notes.txt"), "not an image").unwrap();

        let library = Library::scan(tmp.path()).unwrap();
        assert_eq!(library.len(), 2);

        let beach = library.attachment(1).unwrap();
        assert_eq!(beach.file, "2020/01/beach.png");
        assert_eq!(beach.original_file, None);
        assert_eq!(beach.dimensions, Dimensions::new(64, 36));

        let big = library.attachment(2).unwrap();
        assert_eq!(big.file, "2020/01/big-scaled.png");
        assert_eq!(big.original_file.as_deref(), Some("2020/01/big.png"));
        assert_eq!(big.dimensions, Dimensions::new(40, 30));
    }

    #[test]
    fn scan_reports_unreadable_images() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken.jpg"), b"not a jpeg").unwrap();
        let err = Library::scan(tmp.path()).unwrap_err();
        assert!(matches!(err, LibraryError::Image { ref path, .. } if path == "broken.jpg"));
    }
}
