//! The size resolution engine.
//!
//! Maps a master image's [`Dimensions`] and a [`SizeRequest`] to the
//! [`ResizeDirective`] the CDN should apply, following WordPress's own
//! image-size rules:
//!
//! | Request box | Crop | Directive |
//! |---|---|---|
//! | ≥ master on every constrained axis | any | [`Passthrough`](ResizeDirective::Passthrough) |
//! | width and height | hard / anchored | [`Resize`](ResizeDirective::Resize), clamped to the master |
//! | width and height | none | [`Fit`](ResizeDirective::Fit) via [`constrain_dimensions`] |
//! | width only | any | [`ScaleWidth`](ResizeDirective::ScaleWidth) |
//! | height only | any | [`ScaleHeight`](ResizeDirective::ScaleHeight) |
//!
//! Resolution is pure and deterministic: the same inputs always produce the
//! same directive, which is what makes per-pass memoization in the rewriter
//! safe.

use super::calculations::constrain_dimensions;
use super::directive::{Gravity, ResizeDirective};
use super::table::{CropMode, SizeTable};
use super::Dimensions;
use thiserror::Error;
use tracing::warn;

/// The pseudo-size meaning "the master image itself".
const FULL: &str = "full";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    #[error("unknown image size: {0}")]
    UnknownSize(String),
}

/// A display size requested by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SizeRequest {
    /// A registered size name such as `thumbnail`, or `full`.
    Named(String),
    /// An explicit box. `None` (or zero) leaves an axis unconstrained.
    Explicit {
        width: Option<u32>,
        height: Option<u32>,
        crop: bool,
    },
}

impl SizeRequest {
    pub fn named(name: &str) -> Self {
        SizeRequest::Named(name.to_string())
    }

    pub fn explicit(width: u32, height: u32, crop: bool) -> Self {
        SizeRequest::Explicit {
            width: Some(width),
            height: Some(height),
            crop,
        }
    }

    pub fn width(width: u32) -> Self {
        SizeRequest::Explicit {
            width: Some(width),
            height: None,
            crop: false,
        }
    }

    pub fn height(height: u32) -> Self {
        SizeRequest::Explicit {
            width: None,
            height: Some(height),
            crop: false,
        }
    }
}

/// Normalized box: zero means unconstrained.
struct Target {
    width: u32,
    height: u32,
    crop: CropMode,
}

/// Resolve a request against the master dimensions.
///
/// Fails only when a named size is not registered; see
/// [`resolve_or_passthrough`] for the recovering variant used when rendering.
pub fn resolve(
    original: Dimensions,
    request: &SizeRequest,
    sizes: &impl SizeTable,
) -> Result<ResizeDirective, SizeError> {
    Ok(match target_for(request, sizes)? {
        Some(target) => resolve_target(original, &target),
        None => ResizeDirective::Passthrough,
    })
}

/// Like [`resolve`], but an unknown size degrades to
/// [`ResizeDirective::Passthrough`] so a removed size never breaks rendering.
pub fn resolve_or_passthrough(
    original: Dimensions,
    request: &SizeRequest,
    sizes: &impl SizeTable,
) -> ResizeDirective {
    resolve(original, request, sizes).unwrap_or_else(|err| {
        warn!(%err, "falling back to the full-size image");
        ResizeDirective::Passthrough
    })
}

/// Look up and normalize the request. `None` means the full-size image.
fn target_for(request: &SizeRequest, sizes: &impl SizeTable) -> Result<Option<Target>, SizeError> {
    match request {
        SizeRequest::Named(name) => {
            let name = match name.as_str() {
                FULL => return Ok(None),
                "thumb" => "thumbnail",
                other => other,
            };
            let def = sizes
                .size_definition(name)
                .ok_or_else(|| SizeError::UnknownSize(name.to_string()))?;
            Ok(Some(Target {
                width: def.width,
                height: def.height,
                crop: def.crop,
            }))
        }
        SizeRequest::Explicit {
            width,
            height,
            crop,
        } => Ok(Some(Target {
            width: width.unwrap_or(0),
            height: height.unwrap_or(0),
            crop: if *crop { CropMode::Hard } else { CropMode::None },
        })),
    }
}

fn resolve_target(original: Dimensions, target: &Target) -> ResizeDirective {
    let (orig_w, orig_h) = (original.width(), original.height());
    let (tw, th) = (target.width, target.height);

    // Never ask the CDN to upscale: a box that bounds the master on every
    // constrained axis is the master itself.
    let width_covers = tw == 0 || tw >= orig_w;
    let height_covers = th == 0 || th >= orig_h;
    if width_covers && height_covers {
        return ResizeDirective::Passthrough;
    }

    match (tw, th) {
        (0, _) => ResizeDirective::ScaleHeight(th),
        (_, 0) => ResizeDirective::ScaleWidth(tw),
        _ if target.crop.is_crop() => ResizeDirective::Resize {
            width: tw.min(orig_w),
            height: th.min(orig_h),
            gravity: Gravity::for_crop(target.crop),
        },
        _ => {
            let (width, height) = constrain_dimensions(original, tw, th);
            ResizeDirective::Fit { width, height }
        }
    }
}

/// Plain scaling without a bounding-box fit, clamped to the master.
///
/// An axis at or beyond the master's extent is dropped; if both are dropped
/// the result is a passthrough.
pub fn scale(original: Dimensions, width: Option<u32>, height: Option<u32>) -> ResizeDirective {
    let width = width.filter(|&w| w > 0 && w < original.width());
    let height = height.filter(|&h| h > 0 && h < original.height());

    match (width, height) {
        (Some(width), Some(height)) => ResizeDirective::ScaleBoth { width, height },
        (Some(width), None) => ResizeDirective::ScaleWidth(width),
        (None, Some(height)) => ResizeDirective::ScaleHeight(height),
        (None, None) => ResizeDirective::Passthrough,
    }
}

/// Pixel size the CDN will deliver for a directive.
pub fn delivered_dimensions(original: Dimensions, directive: &ResizeDirective) -> Dimensions {
    let (width, height) = match *directive {
        ResizeDirective::Passthrough => return original,
        ResizeDirective::Resize { width, height, .. }
        | ResizeDirective::Fit { width, height }
        | ResizeDirective::ScaleBoth { width, height } => (width, height),
        ResizeDirective::ScaleWidth(width) => constrain_dimensions(original, width, 0),
        ResizeDirective::ScaleHeight(height) => constrain_dimensions(original, 0, height),
    };
    Dimensions::new(width, height)
}
