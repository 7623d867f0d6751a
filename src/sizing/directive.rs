//! The resolved instruction for the CDN.
//!
//! A directive describes *what* the CDN should serve, not how the URL is
//! spelled; [`crate::url`] owns the wire format.

use super::table::{CropMode, HorizontalAnchor, VerticalAnchor};

/// Crop anchor understood by the CDN's `gravity` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gravity {
    NorthWest,
    North,
    NorthEast,
    West,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl Gravity {
    /// Gravity for a crop mode. Centre crops need none.
    pub fn for_crop(crop: CropMode) -> Option<Self> {
        use HorizontalAnchor as H;
        use VerticalAnchor as V;

        match crop {
            CropMode::Anchored(x, y) => match (x, y) {
                (H::Left, V::Top) => Some(Gravity::NorthWest),
                (H::Center, V::Top) => Some(Gravity::North),
                (H::Right, V::Top) => Some(Gravity::NorthEast),
                (H::Left, V::Center) => Some(Gravity::West),
                (H::Center, V::Center) => None,
                (H::Right, V::Center) => Some(Gravity::East),
                (H::Left, V::Bottom) => Some(Gravity::SouthWest),
                (H::Center, V::Bottom) => Some(Gravity::South),
                (H::Right, V::Bottom) => Some(Gravity::SouthEast),
            },
            CropMode::None | CropMode::Hard => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gravity::NorthWest => "northwest",
            Gravity::North => "north",
            Gravity::NorthEast => "northeast",
            Gravity::West => "west",
            Gravity::East => "east",
            Gravity::SouthWest => "southwest",
            Gravity::South => "south",
            Gravity::SouthEast => "southeast",
        }
    }
}

/// What the CDN should do with the master image.
///
/// Every numeric field is at most the matching master dimension: directives
/// never ask for upscaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeDirective {
    /// Serve the master untouched.
    Passthrough,
    /// Crop to exactly `width × height`.
    Resize {
        width: u32,
        height: u32,
        gravity: Option<Gravity>,
    },
    /// Scale to fit within `width × height`, no crop.
    Fit { width: u32, height: u32 },
    /// Scale to `width`, height follows the aspect ratio.
    ScaleWidth(u32),
    /// Scale to `height`, width follows the aspect ratio.
    ScaleHeight(u32),
    /// Scale on both axes without a bounding-box fit.
    ScaleBoth { width: u32, height: u32 },
}

impl ResizeDirective {
    /// Short label for log events.
    pub fn kind(&self) -> &'static str {
        match self {
            ResizeDirective::Passthrough => "passthrough",
            ResizeDirective::Resize { .. } => "resize",
            ResizeDirective::Fit { .. } => "fit",
            ResizeDirective::ScaleWidth(_) => "scale-width",
            ResizeDirective::ScaleHeight(_) => "scale-height",
            ResizeDirective::ScaleBoth { .. } => "scale",
        }
    }
}
