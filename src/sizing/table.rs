//! Named image sizes and their crop behaviour.
//!
//! The table is owned by the host (WordPress registers built-in sizes, themes
//! and plugins add their own). Resolution only ever reads it through the
//! [`SizeTable`] capability, so a snapshot can be injected per call and tests
//! never touch a process-wide registry.
//!
//! ## Crop modes
//!
//! | Config value | Mode | Behaviour |
//! |---|---|---|
//! | `crop = false` | [`CropMode::None`] | fit inside the box, keep aspect ratio |
//! | `crop = true` | [`CropMode::Hard`] | fill the box exactly, centre crop |
//! | `crop = ["left", "top"]` | [`CropMode::Anchored`] | fill the box, crop towards the anchor |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAnchor {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAnchor {
    Top,
    Center,
    Bottom,
}

impl HorizontalAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            HorizontalAnchor::Left => "left",
            HorizontalAnchor::Center => "center",
            HorizontalAnchor::Right => "right",
        }
    }
}

impl VerticalAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            VerticalAnchor::Top => "top",
            VerticalAnchor::Center => "center",
            VerticalAnchor::Bottom => "bottom",
        }
    }
}

/// How a size treats the part of the image outside its box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawCrop", into = "RawCrop")]
pub enum CropMode {
    /// Soft resize: fit within the box.
    #[default]
    None,
    /// Fill the box exactly, cropping from the centre.
    Hard,
    /// Fill the box exactly, cropping towards the given anchor.
    Anchored(HorizontalAnchor, VerticalAnchor),
}

impl CropMode {
    pub fn is_crop(self) -> bool {
        !matches!(self, CropMode::None)
    }
}

/// Config representation: a boolean flag or an `[x, y]` anchor pair.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawCrop {
    Flag(bool),
    Anchor(HorizontalAnchor, VerticalAnchor),
}

impl From<RawCrop> for CropMode {
    fn from(raw: RawCrop) -> Self {
        match raw {
            RawCrop::Flag(false) => CropMode::None,
            RawCrop::Flag(true) => CropMode::Hard,
            RawCrop::Anchor(x, y) => CropMode::Anchored(x, y),
        }
    }
}

impl From<CropMode> for RawCrop {
    fn from(mode: CropMode) -> Self {
        match mode {
            CropMode::None => RawCrop::Flag(false),
            CropMode::Hard => RawCrop::Flag(true),
            CropMode::Anchored(x, y) => RawCrop::Anchor(x, y),
        }
    }
}

/// A registered size. A zero axis is unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizeDefinition {
    pub width: u32,
    pub height: u32,
    pub crop: CropMode,
}

impl SizeDefinition {
    pub fn new(width: u32, height: u32, crop: CropMode) -> Self {
        Self {
            width,
            height,
            crop,
        }
    }

    /// Soft size: fit within `width × height`.
    pub fn fit(width: u32, height: u32) -> Self {
        Self::new(width, height, CropMode::None)
    }

    /// Hard-cropped size: fill `width × height` exactly.
    pub fn hard(width: u32, height: u32) -> Self {
        Self::new(width, height, CropMode::Hard)
    }
}

/// Read-only view of the registered image sizes.
pub trait SizeTable: Sync {
    /// Look up a size by name.
    fn size_definition(&self, name: &str) -> Option<SizeDefinition>;

    /// All registered names, in a stable order.
    fn names(&self) -> Vec<String>;

    /// Name of a cropping size whose box is exactly `width × height`.
    ///
    /// Used to tell a cropped intermediate file (`photo-150x150.jpg`) from a
    /// soft-resized one when only the filename is known.
    fn find_crop_size(&self, width: u32, height: u32) -> Option<String> {
        self.names().into_iter().find(|name| {
            self.size_definition(name).is_some_and(|def| {
                def.crop.is_crop() && def.width == width && def.height == height
            })
        })
    }
}

/// In-memory size table keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisteredSizes {
    sizes: BTreeMap<String, SizeDefinition>,
}

impl RegisteredSizes {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sizes WordPress registers out of the box.
    pub fn wordpress_defaults() -> Self {
        Self::new()
            .with("thumbnail", SizeDefinition::hard(150, 150))
            .with("medium", SizeDefinition::fit(300, 300))
            .with("medium_large", SizeDefinition::fit(768, 0))
            .with("large", SizeDefinition::fit(1024, 1024))
            .with("1536x1536", SizeDefinition::fit(1536, 1536))
            .with("2048x2048", SizeDefinition::fit(2048, 2048))
    }

    /// Register (or replace) a size, builder style.
    pub fn with(mut self, name: &str, definition: SizeDefinition) -> Self {
        self.sizes.insert(name.to_string(), definition);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SizeDefinition)> {
        self.sizes.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

impl From<BTreeMap<String, SizeDefinition>> for RegisteredSizes {
    fn from(sizes: BTreeMap<String, SizeDefinition>) -> Self {
        Self { sizes }
    }
}

impl SizeTable for RegisteredSizes {
    fn size_definition(&self, name: &str) -> Option<SizeDefinition> {
        self.sizes.get(name).copied()
    }

    fn names(&self) -> Vec<String> {
        self.sizes.keys().cloned().collect()
    }
}
