//! Geometry and hit-testing for regions of interest.
//!
//! Everything here is a pure function over image-pixel coordinates. The one
//! place display coordinates enter is [`to_canvas_coordinates`], which must be
//! applied to every pointer position before any other function sees it.
//!
//! # Coordinate Mapping
//!
//! The editor displays the image at whatever size fits the window, while ROIs
//! live in the image's intrinsic pixel space. Skipping the mapping makes
//! hit-testing silently wrong whenever the two sizes differ.

use crate::config::Config;
use eframe::egui;
use serde::{Deserialize, Serialize};

/// A rectangle in image pixel coordinates.
///
/// Width and height are signed: a draft rectangle being dragged up or left has
/// negative extents until [`RoiRect::normalized`] is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RoiRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A zero-size rectangle anchored at `origin`.
    pub fn at(origin: egui::Pos2) -> Self {
        Self::new(origin.x, origin.y, 0.0, 0.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Flips negative extents so that width and height are non-negative while
    /// covering the same area.
    pub fn normalized(&self) -> Self {
        Self {
            x: if self.width < 0.0 { self.x + self.width } else { self.x },
            y: if self.height < 0.0 { self.y + self.height } else { self.y },
            width: self.width.abs(),
            height: self.height.abs(),
        }
    }

    /// Position of the given corner.
    pub fn corner(&self, handle: Handle) -> egui::Pos2 {
        match handle {
            Handle::TopLeft => egui::pos2(self.x, self.y),
            Handle::TopRight => egui::pos2(self.right(), self.y),
            Handle::BottomLeft => egui::pos2(self.x, self.bottom()),
            Handle::BottomRight => egui::pos2(self.right(), self.bottom()),
        }
    }

    /// Converts into an egui rectangle, normalizing first.
    pub fn to_egui(&self) -> egui::Rect {
        let r = self.normalized();
        egui::Rect::from_min_size(egui::pos2(r.x, r.y), egui::vec2(r.width, r.height))
    }
}

/// One of the four corner resize handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Handle {
    /// All handles in hit-test priority order.
    pub const ALL: [Handle; 4] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomLeft,
        Handle::BottomRight,
    ];

    /// Whether dragging this handle moves the left edge.
    pub fn moves_left_edge(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::BottomLeft)
    }

    /// Whether dragging this handle moves the top edge.
    pub fn moves_top_edge(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::TopRight)
    }
}

/// How the canvas is currently displayed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasView {
    /// Where the canvas is drawn, in display coordinates.
    pub rendered: egui::Rect,
    /// Bitmap resolution of the canvas (the image dimensions).
    pub intrinsic: egui::Vec2,
}

impl CanvasView {
    pub fn new(rendered: egui::Rect, intrinsic: egui::Vec2) -> Self {
        Self {
            rendered,
            intrinsic,
        }
    }

    /// Per-axis factor from display units to intrinsic pixels.
    pub fn scale(&self) -> egui::Vec2 {
        let axis = |intrinsic: f32, rendered: f32| {
            if rendered > 0.0 {
                intrinsic / rendered
            } else {
                1.0
            }
        };
        egui::vec2(
            axis(self.intrinsic.x, self.rendered.width()),
            axis(self.intrinsic.y, self.rendered.height()),
        )
    }

    /// Inverse of [`to_canvas_coordinates`], used when painting.
    pub fn to_display(&self, canvas: egui::Pos2) -> egui::Pos2 {
        let scale = self.scale();
        egui::pos2(
            self.rendered.min.x + canvas.x / scale.x,
            self.rendered.min.y + canvas.y / scale.y,
        )
    }

    /// Maps a ROI rectangle into display space.
    pub fn rect_to_display(&self, rect: &RoiRect) -> egui::Rect {
        let r = rect.to_egui();
        egui::Rect::from_min_max(self.to_display(r.min), self.to_display(r.max))
    }
}

/// Maps a pointer position from display space into the canvas's intrinsic
/// pixel space.
///
/// Points outside the rendered area map outside the canvas; they are not
/// clamped here.
pub fn to_canvas_coordinates(pointer: egui::Pos2, view: &CanvasView) -> egui::Pos2 {
    let scale = view.scale();
    egui::pos2(
        (pointer.x - view.rendered.min.x) * scale.x,
        (pointer.y - view.rendered.min.y) * scale.y,
    )
}

/// Closed-interval containment: points on the boundary count as inside.
pub fn contains_point(x: f32, y: f32, rect: &RoiRect) -> bool {
    x >= rect.x && x <= rect.right() && y >= rect.y && y <= rect.bottom()
}

/// Which handle the user is currently engaged with.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandleEngagement {
    /// Handle being dragged.
    pub active: Option<Handle>,
    /// Handle under the pointer on the previous move.
    pub hovered: Option<Handle>,
    /// A resize is in progress; only the engaged handle may match.
    pub resizing: bool,
}

impl HandleEngagement {
    pub fn engaged(&self) -> Option<Handle> {
        self.hovered.or(self.active)
    }
}

/// Resolves which corner handle, if any, lies under `(x, y)`.
///
/// The engaged handle is tested first with its radius scaled by the sticky
/// factor, so jitter near a neighbouring corner does not switch handles.
pub fn hit_test_handle(
    x: f32,
    y: f32,
    rect: &RoiRect,
    engagement: &HandleEngagement,
    config: &Config,
) -> Option<Handle> {
    let radius = config.handle_hit_radius;
    let within = |handle: Handle, r: f32| {
        let corner = rect.corner(handle);
        (x - corner.x).abs() <= r && (y - corner.y).abs() <= r
    };

    if let Some(engaged) = engagement.engaged() {
        if within(engaged, radius * config.sticky_factor) {
            return Some(engaged);
        }
    }

    if engagement.resizing {
        return None;
    }

    Handle::ALL.into_iter().find(|&handle| within(handle, radius))
}

/// Square drawn for a handle, centred on its corner.
pub fn handle_rect(rect: &RoiRect, handle: Handle, handle_size: f32) -> RoiRect {
    let corner = rect.corner(handle);
    let half = handle_size / 2.0;
    RoiRect::new(corner.x - half, corner.y - half, handle_size, handle_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roi() -> RoiRect {
        RoiRect::new(100.0, 100.0, 200.0, 100.0)
    }

    #[test]
    fn scale_correction_maps_display_to_intrinsic() {
        let view = CanvasView::new(
            egui::Rect::from_min_size(egui::pos2(10.0, 20.0), egui::vec2(400.0, 300.0)),
            egui::vec2(800.0, 600.0),
        );
        let p = to_canvas_coordinates(egui::pos2(110.0, 70.0), &view);
        assert_eq!(p, egui::pos2(200.0, 100.0));
        assert_eq!(view.to_display(p), egui::pos2(110.0, 70.0));
    }

    #[test]
    fn zero_sized_view_falls_back_to_unit_scale() {
        let view = CanvasView::new(
            egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(0.0, 0.0)),
            egui::vec2(800.0, 600.0),
        );
        assert_eq!(to_canvas_coordinates(egui::pos2(5.0, 7.0), &view), egui::pos2(5.0, 7.0));
    }

    #[test]
    fn boundary_points_are_contained() {
        let r = roi();
        assert!(contains_point(r.x, r.y, &r));
        assert!(contains_point(r.right(), r.bottom(), &r));
        assert!(!contains_point(r.x - 0.5, r.y, &r));
        assert!(!contains_point(r.x, r.bottom() + 0.5, &r));
    }

    #[test]
    fn normalized_flips_negative_extents() {
        let draft = RoiRect::new(150.0, 120.0, -100.0, -70.0);
        assert_eq!(draft.normalized(), RoiRect::new(50.0, 50.0, 100.0, 70.0));
    }

    #[test]
    fn hit_test_finds_each_corner() {
        let r = roi();
        let config = Config::default();
        let idle = HandleEngagement::default();
        for handle in Handle::ALL {
            let c = r.corner(handle);
            assert_eq!(hit_test_handle(c.x, c.y, &r, &idle, &config), Some(handle));
        }
        assert_eq!(hit_test_handle(200.0, 150.0, &r, &idle, &config), None);
    }

    #[test]
    fn hit_test_uses_enumeration_order_on_overlap() {
        // Corners 20px apart, both within the 20px radius of the probe.
        let small = RoiRect::new(100.0, 100.0, 20.0, 20.0);
        let config = Config::default();
        let idle = HandleEngagement::default();
        assert_eq!(
            hit_test_handle(110.0, 110.0, &small, &idle, &config),
            Some(Handle::TopLeft)
        );
    }

    #[test]
    fn engaged_handle_is_sticky() {
        let small = RoiRect::new(100.0, 100.0, 20.0, 20.0);
        let config = Config::default();
        let hovering = HandleEngagement {
            hovered: Some(Handle::BottomRight),
            ..Default::default()
        };
        // Closer to the top-left corner but the bottom-right one is engaged.
        assert_eq!(
            hit_test_handle(102.0, 102.0, &small, &hovering, &config),
            Some(Handle::BottomRight)
        );
        // Sticky radius is 40px: 35px away still holds.
        let r = roi();
        let engaged = HandleEngagement {
            active: Some(Handle::TopLeft),
            ..Default::default()
        };
        assert_eq!(
            hit_test_handle(65.0, 65.0, &r, &engaged, &config),
            Some(Handle::TopLeft)
        );
        assert_eq!(
            hit_test_handle(65.0, 65.0, &r, &HandleEngagement::default(), &config),
            None
        );
    }

    #[test]
    fn resizing_never_switches_handles() {
        let r = roi();
        let config = Config::default();
        let resizing = HandleEngagement {
            active: Some(Handle::TopLeft),
            hovered: None,
            resizing: true,
        };
        let far = r.corner(Handle::BottomRight);
        assert_eq!(hit_test_handle(far.x, far.y, &r, &resizing, &config), None);
    }

    #[test]
    fn handle_rect_is_centred_on_corner() {
        let square = handle_rect(&roi(), Handle::BottomRight, 16.0);
        assert_eq!(square, RoiRect::new(292.0, 192.0, 16.0, 16.0));
    }
}
