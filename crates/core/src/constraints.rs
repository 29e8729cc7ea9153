//! Constraint solving for ROI rectangles.
//!
//! A ROI must never be smaller than the configured minimum and must stay
//! inside the image, with a padding margin left free on every side so that
//! padded captures never reach past the image edge.

use crate::config::Config;
use crate::geometry::{Handle, RoiRect};
use eframe::egui;

/// Dimensions of the image a ROI lives on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f32, height as f32)
    }
}

/// Raises width and height to at least `min_size`, keeping the origin.
pub fn enforce_min_size(rect: RoiRect, min_size: f32) -> RoiRect {
    RoiRect {
        width: rect.width.max(min_size),
        height: rect.height.max(min_size),
        ..rect
    }
}

/// Clamps position first, then size relative to the clamped position.
///
/// When the image is too small to hold a minimum-size ROI plus padding, the
/// lower bound wins: the ROI sits at `pad` with the minimum size.
pub fn clamp_to_bounds(rect: RoiRect, bounds: Bounds, config: &Config) -> RoiRect {
    let pad = config.capture_padding;
    let min = config.min_roi_size;

    let x = rect.x.min(bounds.width - rect.width - pad).max(pad);
    let y = rect.y.min(bounds.height - rect.height - pad).max(pad);

    let width = rect.width.min(bounds.width - x - pad).max(min);
    let height = rect.height.min(bounds.height - y - pad).max(min);

    RoiRect::new(x, y, width, height)
}

/// Minimum size, then position clamp, then size clamp. Idempotent.
pub fn solve(rect: RoiRect, bounds: Bounds, config: &Config) -> RoiRect {
    clamp_to_bounds(enforce_min_size(rect, config.min_roi_size), bounds, config)
}

/// Drags `handle` of `rect` to `pointer`, holding the opposite corner fixed.
///
/// A dimension that would drop below the minimum is clamped on the dragged
/// side, so the opposite edge never moves. The result is passed through
/// [`solve`].
pub fn resize_with_handle(
    rect: &RoiRect,
    handle: Handle,
    pointer: egui::Pos2,
    bounds: Bounds,
    config: &Config,
) -> RoiRect {
    let pad = config.capture_padding;
    let min = config.min_roi_size;

    let (x, width) = if handle.moves_left_edge() {
        let right = rect.right();
        let left = pointer.x.max(pad).min(right - min);
        (left, right - left)
    } else {
        let right = pointer.x.min(bounds.width - pad);
        (rect.x, (right - rect.x).max(min))
    };

    let (y, height) = if handle.moves_top_edge() {
        let bottom = rect.bottom();
        let top = pointer.y.max(pad).min(bottom - min);
        (top, bottom - top)
    } else {
        let bottom = pointer.y.min(bounds.height - pad);
        (rect.y, (bottom - rect.y).max(min))
    };

    solve(RoiRect::new(x, y, width, height), bounds, config)
}
