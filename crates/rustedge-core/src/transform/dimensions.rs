//! Output size calculation.
//!
//! Follows plain `WxH` geometry: with both sides given the image is scaled to
//! fit inside the box, with one side given that side is hit exactly and the
//! other follows the aspect ratio. Enlargement is allowed.
//!
//! The side derived from the aspect ratio is not bounded by the query, so
//! [`fit_dimensions`] shrinks the result (aspect kept) until both sides are
//! within [`OutputBounds::max_dimension`] and the area is within
//! [`OutputBounds::max_pixels`].

use crate::config::{DEFAULT_MAX_DIMENSION, EdgeConfig, MAX_OUTPUT_PIXELS};

/// Hard limits on a resize output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputBounds {
    /// Largest width or height.
    pub max_dimension: u32,
    /// Largest `width * height`.
    pub max_pixels: u64,
}

impl Default for OutputBounds {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            max_pixels: MAX_OUTPUT_PIXELS,
        }
    }
}

impl From<&EdgeConfig> for OutputBounds {
    fn from(config: &EdgeConfig) -> Self {
        Self {
            max_dimension: config.max_dimension.max(1),
            max_pixels: MAX_OUTPUT_PIXELS,
        }
    }
}

/// Compute the output size for a source image and the requested bounds.
#[must_use]
pub fn target_dimensions(
    src_w: u32,
    src_h: u32,
    width: Option<u32>,
    height: Option<u32>,
) -> (u32, u32) {
    let (src_w, src_h) = (src_w.max(1), src_h.max(1));
    match (width, height) {
        (Some(w), Some(h)) => {
            let scale = (f64::from(w) / f64::from(src_w)).min(f64::from(h) / f64::from(src_h));
            (
                scale_side(src_w, scale).min(w),
                scale_side(src_h, scale).min(h),
            )
        }
        (Some(w), None) => (w, scale_side(src_h, f64::from(w) / f64::from(src_w))),
        (None, Some(h)) => (scale_side(src_w, f64::from(h) / f64::from(src_h)), h),
        (None, None) => (src_w, src_h),
    }
}

/// [`target_dimensions`], then shrunk to fit `bounds`.
#[must_use]
pub fn fit_dimensions(
    src_w: u32,
    src_h: u32,
    width: Option<u32>,
    height: Option<u32>,
    bounds: OutputBounds,
) -> (u32, u32) {
    let (w, h) = target_dimensions(src_w, src_h, width, height);
    bound_dimensions(w, h, bounds)
}

/// Shrink `width x height` so it fits `bounds`, keeping the aspect ratio.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn bound_dimensions(width: u32, height: u32, bounds: OutputBounds) -> (u32, u32) {
    let max_side = bounds.max_dimension.max(1);
    let (w, h) = (f64::from(width.max(1)), f64::from(height.max(1)));

    let mut scale = (f64::from(max_side) / w)
        .min(f64::from(max_side) / h)
        .min(1.0);
    let area = w * h * scale * scale;
    let max_area = bounds.max_pixels.max(1) as f64;
    if area > max_area {
        scale *= (max_area / area).sqrt();
    }

    if scale >= 1.0 {
        return (width, height);
    }
    (
        scale_side(width, scale).min(max_side),
        scale_side(height, scale).min(max_side),
    )
}

/// Scale one side, rounding to the nearest pixel and never going below 1px.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_side(side: u32, scale: f64) -> u32 {
    let scaled = (f64::from(side) * scale).round();
    if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        (scaled as u32).max(1)
    }
}
