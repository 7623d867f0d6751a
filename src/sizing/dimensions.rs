use serde::{Deserialize, Serialize};

/// Pixel extents of an image asset. Both axes are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDimensions", into = "RawDimensions")]
pub struct Dimensions {
    width: u32,
    height: u32,
}

impl Dimensions {
    /// # Panics
    ///
    /// Panics if either axis is zero. Callers holding unvalidated input
    /// should go through [`Dimensions::try_new`].
    pub fn new(width: u32, height: u32) -> Self {
        assert!(
            width > 0 && height > 0,
            "image dimensions must be non-zero, got {width}x{height}"
        );
        Self { width, height }
    }

    pub fn try_new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Serialize, Deserialize)]
struct RawDimensions {
    width: u32,
    height: u32,
}

impl TryFrom<RawDimensions> for Dimensions {
    type Error = String;

    fn try_from(raw: RawDimensions) -> Result<Self, Self::Error> {
        Self::try_new(raw.width, raw.height)
            .ok_or_else(|| format!("dimensions must be non-zero, got {}x{}", raw.width, raw.height))
    }
}

impl From<Dimensions> for RawDimensions {
    fn from(dims: Dimensions) -> Self {
        Self {
            width: dims.width,
            height: dims.height,
        }
    }
}
