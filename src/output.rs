//! CLI output formatting for every subcommand.
//!
//! # Information-First Display
//!
//! The primary display for every entity (size, attachment, file) is its
//! identity, with details shown as indented context lines underneath. This
//! keeps output readable as an inventory while still letting users trace data
//! back to files.
//!
//! # Output Format
//!
//! ## Sizes
//!
//! ```text
//! Sizes
//! medium        300x300  fit
//! medium_large  768w     fit
//! thumbnail     150x150  crop
//! ```
//!
//! ## Scan
//!
//! ```text
//! Attachments
//! 001 tachyon.jpg (1280x719)
//! 002 tachyon-large-scaled.jpg (2560x1440)
//!     Original: tachyon-large.jpg
//!
//! Found 2 attachments
//! ```
//!
//! ## Rewrite
//!
//! ```text
//! posts/hello.html: rewritten
//! posts/about.html: unchanged
//!
//! Rewrote 1 of 2 files
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure — no I/O, no side effects.

use crate::library::Library;
use crate::rewrite::ImageSrc;
use crate::sizing::{CropMode, SizeDefinition, SizeTable};
use std::path::PathBuf;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format an id as 3-digit zero-padded.
fn format_index(pos: u64) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Box of a size definition; an unconstrained axis is left out.
///
/// ```text
/// 150x150   // both axes
/// 768w      // width only
/// 400h      // height only
/// ```
fn size_box(def: &SizeDefinition) -> String {
    match (def.width, def.height) {
        (w, 0) => format!("{w}w"),
        (0, h) => format!("{h}h"),
        (w, h) => format!("{w}x{h}"),
    }
}

fn crop_label(crop: CropMode) -> String {
    match crop {
        CropMode::None => "fit".to_string(),
        CropMode::Hard => "crop".to_string(),
        CropMode::Anchored(x, y) => format!("crop {} {}", x.as_str(), y.as_str()),
    }
}

// ============================================================================
// sizes
// ============================================================================

/// Format the registered size table, one aligned row per size.
pub fn format_sizes(sizes: &impl SizeTable) -> Vec<String> {
    let rows: Vec<(String, String, String)> = sizes
        .names()
        .into_iter()
        .filter_map(|name| {
            let def = sizes.size_definition(&name)?;
            Some((name, size_box(&def), crop_label(def.crop)))
        })
        .collect();

    let name_width = rows.iter().map(|(n, _, _)| n.len()).max().unwrap_or(0);
    let box_width = rows.iter().map(|(_, b, _)| b.len()).max().unwrap_or(0);

    let mut lines = vec!["Sizes".to_string()];
    if rows.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (name, size, crop) in rows {
        lines.push(format!("{name:<name_width$}  {size:<box_width$}  {crop}"));
    }
    lines
}

pub fn print_sizes(sizes: &impl SizeTable) {
    for line in format_sizes(sizes) {
        println!("{}", line);
    }
}

// ============================================================================
// url
// ============================================================================

/// Format a resolved image: the URL first, delivered size as context.
///
/// ```text
/// http://tachy.on/u/tachyon.jpg?fit=300,169
///     Size: 300x169
/// ```
pub fn format_image_src(src: &ImageSrc) -> Vec<String> {
    vec![
        src.url.clone(),
        format!("{}Size: {}x{}", indent(1), src.width, src.height),
    ]
}

pub fn print_image_src(src: &ImageSrc) {
    for line in format_image_src(src) {
        println!("{}", line);
    }
}

// ============================================================================
// scan
// ============================================================================

/// Format a media library: each attachment by id and master file, with the
/// original upload as context when the master is a downsized copy.
pub fn format_library(library: &Library) -> Vec<String> {
    let mut lines = vec!["Attachments".to_string()];
    for attachment in library.iter() {
        lines.push(format!(
            "{} {} ({})",
            format_index(attachment.id),
            attachment.file,
            attachment.dimensions
        ));
        if let Some(original) = &attachment.original_file {
            lines.push(format!("{}Original: {}", indent(1), original));
        }
    }
    lines.push(String::new());
    lines.push(match library.len() {
        1 => "Found 1 attachment".to_string(),
        n => format!("Found {n} attachments"),
    });
    lines
}

pub fn print_library(library: &Library) {
    for line in format_library(library) {
        println!("{}", line);
    }
}

// ============================================================================
// rewrite
// ============================================================================

/// Outcome of rewriting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRewrite {
    pub path: PathBuf,
    pub changed: bool,
}

/// Format per-file rewrite results followed by a summary line.
pub fn format_rewrite_summary(files: &[FileRewrite]) -> Vec<String> {
    let mut lines: Vec<String> = files
        .iter()
        .map(|file| {
            let status = if file.changed { "rewritten" } else { "unchanged" };
            format!("{}: {}", file.path.display(), status)
        })
        .collect();

    let changed = files.iter().filter(|f| f.changed).count();
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(match files.len() {
        1 => format!("Rewrote {changed} of 1 file"),
        n => format!("Rewrote {changed} of {n} files"),
    });
    lines
}

pub fn print_rewrite_summary(files: &[FileRewrite]) {
    for line in format_rewrite_summary(files) {
        println!("{}", line);
    }
}
