//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::Dimensions;

/// Scale `current` down to fit inside a `max_width × max_height` box.
///
/// A zero bound leaves that axis unconstrained. The result never exceeds the
/// current dimensions and matches WordPress's `wp_constrain_dimensions`, so
/// CDN-delivered sizes agree with the `width`/`height` attributes WordPress
/// writes into markup:
///
/// - the scale ratio is the smaller per-axis ratio, unless the larger one
///   already fits on both axes after rounding;
/// - each axis is rounded half-up independently, with a floor of 1px;
/// - a constrained axis that rounds to one pixel short of its bound is
///   snapped up to the bound.
///
/// # Examples
/// ```
/// # use tachyon::sizing::{Dimensions, constrain_dimensions};
/// // 1280x719 into a 300x300 box → width-bound
/// assert_eq!(constrain_dimensions(Dimensions::new(1280, 719), 300, 300), (300, 169));
///
/// // 2560x1440 into a 2000x1000 box → height-bound
/// assert_eq!(constrain_dimensions(Dimensions::new(2560, 1440), 2000, 1000), (1778, 1000));
/// ```
pub fn constrain_dimensions(current: Dimensions, max_width: u32, max_height: u32) -> (u32, u32) {
    let (cur_w, cur_h) = (current.width(), current.height());

    if max_width == 0 && max_height == 0 {
        return (cur_w, cur_h);
    }

    let mut width_ratio = 1.0_f64;
    let mut height_ratio = 1.0_f64;
    let mut did_width = false;
    let mut did_height = false;

    if max_width > 0 && cur_w > max_width {
        width_ratio = f64::from(max_width) / f64::from(cur_w);
        did_width = true;
    }
    if max_height > 0 && cur_h > max_height {
        height_ratio = f64::from(max_height) / f64::from(cur_h);
        did_height = true;
    }

    let smaller = width_ratio.min(height_ratio);
    let larger = width_ratio.max(height_ratio);

    let ratio = if scaled(cur_w, larger) > max_width || scaled(cur_h, larger) > max_height {
        smaller
    } else {
        larger
    };

    let mut w = scaled(cur_w, ratio).max(1);
    let mut h = scaled(cur_h, ratio).max(1);

    // Rounding can leave the binding axis a pixel short of its bound.
    if did_width && w == max_width - 1 {
        w = max_width;
    }
    if did_height && h == max_height - 1 {
        h = max_height;
    }

    (w, h)
}

/// Multiply and round half-up.
fn scaled(value: u32, ratio: f64) -> u32 {
    (f64::from(value) * ratio).round() as u32
}
