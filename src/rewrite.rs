//! Rewriting rendered markup to serve images through the CDN.
//!
//! # What gets rewritten
//!
//! An `<img>` qualifies when it carries a `wp-image-{id}` class (both the
//! classic and block editors write one) and its `src` points into the uploads
//! directory. For a qualifying image the rewriter replaces:
//!
//! - the `src` value;
//! - every `srcset` candidate URL that belongs to the same attachment.
//!
//! Nothing else in the markup changes, including the `href` of a wrapping
//! `<a>`. Replacements are byte-range splices into the original text, applied
//! left to right.
//!
//! # Which size was meant
//!
//! The markup does not say which size was requested, so it is inferred. The
//! first rule that applies wins:
//!
//! 1. a `size-{name}` class on the `<img>` or its enclosing `<figure>` (block
//!    editor) that names a registered size;
//! 2. a `-{W}x{H}` filename suffix, treated as a crop when a registered
//!    cropping size has exactly that box;
//! 3. otherwise the full-size image. `width` and `height` attributes are
//!    layout hints and never select a size.
//!
//! Rule 2 is a heuristic over user-controlled filenames. Every URL is also
//! checked against the attachment's own files before it is touched, and
//! anything that does not line up is left alone.
//!
//! # Failure behaviour
//!
//! Rewriting fails open. Images without an attachment class, with an unknown
//! id, without a `src`, or pointing outside the uploads directory keep their
//! markup. An unregistered size falls back to the full image. Since rewritten
//! URLs point at the CDN rather than the uploads directory, running the
//! rewriter over its own output changes nothing.

use crate::library::{Attachment, MediaLibrary};
use crate::naming::parse_upload_path;
use crate::sizing::{
    Dimensions, ResizeDirective, SizeRequest, SizeTable, delivered_dimensions,
    resolve_or_passthrough, scale,
};
use crate::url::Urls;
use rayon::prelude::*;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::OnceLock;
use tracing::debug;

/// URL and delivered size for a single image, like WordPress's
/// `wp_get_attachment_image_src()` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSrc {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// A splice into the original markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Byte range in the original markup.
    pub range: Range<usize>,
    pub text: String,
}

/// Optional `<figure>` and `<a>` wrappers followed by an `<img>` tag.
fn regex_image() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)(?P<figure><figure\b[^>]*>\s*)?(?P<link><a\b[^>]*>\s*)?(?P<img><img\b[^>]*>)")
            .unwrap()
    })
}

/// One `name=value` attribute inside a tag, double, single or unquoted.
fn regex_attribute() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?s)\s(?P<name>[A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<uq>[^\s"'=<>`]+))"#,
        )
        .unwrap()
    })
}

/// Attribute of a tag, with the value's byte range relative to the tag.
struct Attribute<'a> {
    name: &'a str,
    value: &'a str,
    value_range: Range<usize>,
}

fn attributes(tag: &str) -> Vec<Attribute<'_>> {
    regex_attribute()
        .captures_iter(tag)
        .filter_map(|caps| {
            let name = caps.name("name")?.as_str();
            let value = caps
                .name("dq")
                .or_else(|| caps.name("sq"))
                .or_else(|| caps.name("uq"))?;
            Some(Attribute {
                name,
                value: value.as_str(),
                value_range: value.range(),
            })
        })
        .collect()
}

fn attribute<'t, 'a>(attrs: &'t [Attribute<'a>], name: &str) -> Option<&'t Attribute<'a>> {
    attrs.iter().find(|a| a.name.eq_ignore_ascii_case(name))
}

fn class_tokens<'a>(attrs: &[Attribute<'a>]) -> Vec<&'a str> {
    attribute(attrs, "class")
        .map(|class| class.value.split_whitespace().collect())
        .unwrap_or_default()
}

fn attachment_id(classes: &[&str]) -> Option<u64> {
    classes
        .iter()
        .find_map(|token| token.strip_prefix("wp-image-")?.parse().ok())
}

fn size_class<'a>(classes: &[&'a str]) -> Option<&'a str> {
    classes.iter().find_map(|token| token.strip_prefix("size-"))
}

/// Candidate URL ranges within a `srcset` value, with their descriptors.
///
/// URLs are whitespace-delimited; a trailing comma ends a candidate. Commas
/// inside a URL (as in `?resize=150,150`) are kept.
fn srcset_candidates(srcset: &str) -> Vec<(Range<usize>, &str)> {
    let bytes = srcset.as_bytes();
    let mut candidates = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        while pos < bytes.len() && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b',') {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }

        let start = pos;
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let mut end = pos;
        let ended_by_comma = bytes[start..end].ends_with(b",");
        while end > start && bytes[end - 1] == b',' {
            end -= 1;
        }

        let descriptor_start = pos;
        if !ended_by_comma {
            while pos < bytes.len() && bytes[pos] != b',' {
                pos += 1;
            }
        }
        let descriptor = srcset[descriptor_start..pos].trim();

        if end > start {
            candidates.push((start..end, descriptor));
        }
    }
    candidates
}

/// Rewrites image URLs in markup and resolves single images.
pub struct Rewriter<L, S> {
    library: L,
    sizes: S,
    urls: Urls,
}

impl<L: MediaLibrary, S: SizeTable> Rewriter<L, S> {
    pub fn new(library: L, sizes: S, urls: Urls) -> Self {
        Self {
            library,
            sizes,
            urls,
        }
    }

    /// CDN URL and delivered size for one attachment.
    ///
    /// Returns `None` when the attachment is unknown; the caller keeps its
    /// own URL in that case.
    pub fn url_for(&self, id: u64, request: &SizeRequest) -> Option<ImageSrc> {
        let Some(attachment) = self.library.attachment(id) else {
            debug!(id, "unknown attachment, keeping native URL");
            return None;
        };
        let directive = resolve_or_passthrough(attachment.dimensions, request, &self.sizes);
        Some(self.image_src(&attachment, &directive))
    }

    /// Like [`Rewriter::url_for`], but scales each given axis independently
    /// instead of fitting a box.
    pub fn scaled_url_for(
        &self,
        id: u64,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Option<ImageSrc> {
        let attachment = self.library.attachment(id)?;
        let directive = scale(attachment.dimensions, width, height);
        Some(self.image_src(&attachment, &directive))
    }

    fn image_src(&self, attachment: &Attachment, directive: &ResizeDirective) -> ImageSrc {
        let delivered = delivered_dimensions(attachment.dimensions, directive);
        ImageSrc {
            url: self.urls.build(&attachment.file, directive),
            width: delivered.width(),
            height: delivered.height(),
        }
    }

    /// Replacements for `markup`, produced lazily left to right.
    pub fn replacements<'a>(&'a self, markup: &'a str) -> impl Iterator<Item = Replacement> + 'a {
        let mut pass = Pass::new(self);
        regex_image()
            .captures_iter(markup)
            .flat_map(move |caps| pass.element(&caps))
    }

    /// Rewrite every qualifying image in `markup`.
    pub fn rewrite(&self, markup: &str) -> String {
        let mut out = String::with_capacity(markup.len());
        let mut last = 0;
        let mut count = 0usize;

        for Replacement { range, text } in self.replacements(markup) {
            out.push_str(&markup[last..range.start]);
            out.push_str(&text);
            last = range.end;
            count += 1;
        }
        out.push_str(&markup[last..]);

        debug!(replacements = count, "rewrote markup");
        out
    }

    /// Rewrite many payloads in parallel. Output order matches input order.
    pub fn rewrite_all(&self, payloads: &[String]) -> Vec<String> {
        payloads.par_iter().map(|markup| self.rewrite(markup)).collect()
    }
}

/// State for one pass over a markup payload.
struct Pass<'r, L, S> {
    rewriter: &'r Rewriter<L, S>,
    resolved: HashMap<(Dimensions, SizeRequest), ResizeDirective>,
}

impl<'r, L: MediaLibrary, S: SizeTable> Pass<'r, L, S> {
    fn new(rewriter: &'r Rewriter<L, S>) -> Self {
        Self {
            rewriter,
            resolved: HashMap::new(),
        }
    }

    fn resolve(&mut self, original: Dimensions, request: SizeRequest) -> ResizeDirective {
        let sizes = &self.rewriter.sizes;
        *self
            .resolved
            .entry((original, request))
            .or_insert_with_key(|(original, request)| {
                resolve_or_passthrough(*original, request, sizes)
            })
    }

    /// Replacements for one matched element, in markup order.
    fn element(&mut self, caps: &Captures<'_>) -> Vec<Replacement> {
        let Some(img) = caps.name("img") else {
            return Vec::new();
        };
        let img_attrs = attributes(img.as_str());
        let img_classes = class_tokens(&img_attrs);

        let Some(id) = attachment_id(&img_classes) else {
            return Vec::new();
        };
        let Some(src) = attribute(&img_attrs, "src") else {
            debug!(id, "image without src, skipping");
            return Vec::new();
        };
        let rewriter = self.rewriter;
        let urls = &rewriter.urls;
        let Some(src_path) = urls.relative_upload_path(src.value) else {
            return Vec::new();
        };
        let Some(attachment) = rewriter.library.attachment(id) else {
            debug!(id, "unknown attachment, skipping");
            return Vec::new();
        };
        if !attachment.owns(src_path) {
            debug!(id, src = src.value, "src does not belong to attachment, skipping");
            return Vec::new();
        }

        // The `<a>` wrapper is matched only so a block-editor `<figure>` still
        // reaches its `<img>`; the link itself is left alone.
        let figure_classes = caps
            .name("figure")
            .map(|figure| class_tokens(&attributes(figure.as_str())))
            .unwrap_or_default();
        let request = self.request_for(src_path, &img_classes, &figure_classes);
        let directive = self.resolve(attachment.dimensions, request);
        debug!(id, directive = directive.kind(), "resolved image");

        let offset = img.start();
        let mut replacements = vec![Replacement {
            range: offset + src.value_range.start..offset + src.value_range.end,
            text: urls.build(&attachment.file, &directive),
        }];

        if let Some(srcset) = attribute(&img_attrs, "srcset") {
            let base = offset + srcset.value_range.start;
            replacements.extend(self.srcset(&attachment, srcset.value, base));
        }

        replacements.sort_by_key(|r| r.range.start);
        replacements
    }

    fn request_for(
        &self,
        src_path: &str,
        img_classes: &[&str],
        figure_classes: &[&str],
    ) -> SizeRequest {
        let sizes = &self.rewriter.sizes;

        let named = size_class(img_classes)
            .into_iter()
            .chain(size_class(figure_classes))
            .find(|name| {
                matches!(*name, "full" | "thumb") || sizes.size_definition(name).is_some()
            });
        if let Some(name) = named {
            return SizeRequest::named(name);
        }

        if let Some((width, height)) = parse_upload_path(src_path).and_then(|p| p.size) {
            return self.suffix_request(width, height);
        }

        SizeRequest::named("full")
    }

    fn suffix_request(&self, width: u32, height: u32) -> SizeRequest {
        let crop = self.rewriter.sizes.find_crop_size(width, height).is_some();
        SizeRequest::explicit(width, height, crop)
    }

    fn srcset(&mut self, attachment: &Attachment, srcset: &str, base: usize) -> Vec<Replacement> {
        let rewriter = self.rewriter;
        let urls = &rewriter.urls;
        let mut replacements = Vec::new();

        for (range, descriptor) in srcset_candidates(srcset) {
            let Some(path) = urls.relative_upload_path(&srcset[range.clone()]) else {
                continue;
            };
            let Some(parsed) = parse_upload_path(path) else {
                continue;
            };
            if !attachment.owns(path) {
                continue;
            }

            let request = match (parsed.size, descriptor.strip_suffix('w')) {
                (Some((width, height)), _) => self.suffix_request(width, height),
                (None, Some(width)) => match width.parse() {
                    Ok(width) => SizeRequest::width(width),
                    Err(_) => SizeRequest::named("full"),
                },
                (None, None) => SizeRequest::named("full"),
            };
            let directive = self.resolve(attachment.dimensions, request);
            replacements.push(Replacement {
                range: base + range.start..base + range.end,
                text: urls.build(&attachment.file, &directive),
            });
        }
        replacements
    }
}
