//! Size resolution — pure functions, no I/O.
//!
//! | Piece | Role |
//! |---|---|
//! | [`Dimensions`] | Pixel extents of an asset (both axes non-zero) |
//! | [`SizeTable`] | Named sizes → `(width, height, crop)`, injected by the host |
//! | [`SizeRequest`] | What the caller asked for: a named size or an explicit box |
//! | [`ResizeDirective`] | What the CDN should do: passthrough, resize, fit, or scale |
//!
//! The module is split into:
//! - **Dimensions**: the validated pixel-extent value type
//! - **Table**: crop modes, size definitions and the [`SizeTable`] capability
//! - **Calculations**: WordPress-compatible dimension math (unit testable)
//! - **Directive**: the resolved output handed to the URL builder
//! - **Resolve**: the engine that maps `(original, request)` to a directive

mod calculations;
mod dimensions;
mod directive;
mod resolve;
mod table;

pub use calculations::constrain_dimensions;
pub use dimensions::Dimensions;
pub use directive::{Gravity, ResizeDirective};
pub use resolve::{
    SizeError, SizeRequest, delivered_dimensions, resolve, resolve_or_passthrough, scale,
};
pub use table::{
    CropMode, HorizontalAnchor, RegisteredSizes, SizeDefinition, SizeTable, VerticalAnchor,
};
