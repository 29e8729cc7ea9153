//! UI rendering helpers for the ROI editor.
//!
//! This module contains the drawing functions for ROI outlines, corner
//! handles and the in-progress draft, plus the layout and cursor helpers the
//! editor uses around them.

use crate::geometry::{self, CanvasView, Handle, RoiRect};
use crate::roi::Category;
use crate::session::HoverTarget;
use eframe::egui;

/// Outline colour for a ROI with the given tag.
pub fn category_color(category: Option<Category>) -> egui::Color32 {
    match category {
        Some(Category::TeamA) => egui::Color32::from_rgb(66, 135, 245),
        Some(Category::TeamB) => egui::Color32::from_rgb(235, 87, 87),
        Some(Category::Referee) => egui::Color32::from_rgb(245, 200, 66),
        None => egui::Color32::WHITE,
    }
}

/// Largest rectangle with the image's aspect ratio that fits in `available`,
/// centred.
pub fn fit_image_rect(available: egui::Rect, image_size: egui::Vec2) -> egui::Rect {
    if image_size.x <= 0.0 || image_size.y <= 0.0 {
        return available;
    }
    let scale = (available.width() / image_size.x).min(available.height() / image_size.y);
    egui::Rect::from_center_size(available.center(), image_size * scale)
}

/// Cursor for what lies under the pointer.
pub fn cursor_for(target: HoverTarget) -> egui::CursorIcon {
    match target {
        HoverTarget::Handle(handle) => handle_cursor(handle),
        HoverTarget::Inside => egui::CursorIcon::Move,
        HoverTarget::Outside => egui::CursorIcon::Crosshair,
    }
}

pub fn handle_cursor(handle: Handle) -> egui::CursorIcon {
    match handle {
        Handle::TopLeft => egui::CursorIcon::ResizeNorthWest,
        Handle::TopRight => egui::CursorIcon::ResizeNorthEast,
        Handle::BottomLeft => egui::CursorIcon::ResizeSouthWest,
        Handle::BottomRight => egui::CursorIcon::ResizeSouthEast,
    }
}

/// Draws the dark overlay with a transparent "cutout" for the selected ROI.
///
/// # Arguments
/// * `painter` - The egui painter to draw with
/// * `image_rect` - Where the image is displayed
/// * `cutout` - The selected ROI in display coordinates
/// * `alpha` - Darkness level (0-255, higher = darker)
pub fn draw_dimmed_surroundings(
    painter: &egui::Painter,
    image_rect: egui::Rect,
    cutout: egui::Rect,
    alpha: u8,
) {
    let color = egui::Color32::from_black_alpha(alpha);

    // Above
    painter.rect_filled(
        egui::Rect::from_min_max(image_rect.min, egui::pos2(image_rect.max.x, cutout.min.y)),
        0.0,
        color,
    );
    // Below
    painter.rect_filled(
        egui::Rect::from_min_max(egui::pos2(image_rect.min.x, cutout.max.y), image_rect.max),
        0.0,
        color,
    );
    // Left
    painter.rect_filled(
        egui::Rect::from_min_max(
            egui::pos2(image_rect.min.x, cutout.min.y),
            egui::pos2(cutout.min.x, cutout.max.y),
        ),
        0.0,
        color,
    );
    // Right
    painter.rect_filled(
        egui::Rect::from_min_max(
            egui::pos2(cutout.max.x, cutout.min.y),
            egui::pos2(image_rect.max.x, cutout.max.y),
        ),
        0.0,
        color,
    );
}

/// Draws a committed ROI with its tag label.
pub fn draw_roi(
    painter: &egui::Painter,
    view: &CanvasView,
    rect: &RoiRect,
    category: Option<Category>,
    selected: bool,
) {
    let display = view.rect_to_display(rect);
    let color = category_color(category);
    let width = if selected { 3.0 } else { 2.0 };
    painter.rect_stroke(
        display,
        0.0,
        egui::Stroke::new(width, color),
        egui::StrokeKind::Middle,
    );

    if let Some(category) = category {
        painter.text(
            display.left_top() + egui::vec2(2.0, -2.0),
            egui::Align2::LEFT_BOTTOM,
            category.label(),
            egui::FontId::proportional(13.0),
            color,
        );
    }
}

/// Draws the four corner handles of the selected ROI. The engaged handle is
/// filled.
pub fn draw_handles(
    painter: &egui::Painter,
    view: &CanvasView,
    rect: &RoiRect,
    handle_size: f32,
    engaged: Option<Handle>,
) {
    for handle in Handle::ALL {
        let square = view.rect_to_display(&geometry::handle_rect(rect, handle, handle_size));
        let fill = if engaged == Some(handle) {
            egui::Color32::from_rgb(66, 135, 245)
        } else {
            egui::Color32::WHITE
        };
        painter.rect_filled(square, 2.0, fill);
        painter.rect_stroke(
            square,
            2.0,
            egui::Stroke::new(1.0, egui::Color32::BLACK),
            egui::StrokeKind::Inside,
        );
    }
}

/// Draws the rectangle being dragged out.
pub fn draw_draft(painter: &egui::Painter, view: &CanvasView, draft: &RoiRect) {
    let display = view.rect_to_display(draft);
    painter.rect_filled(display, 0.0, egui::Color32::from_white_alpha(24));
    painter.rect_stroke(
        display,
        0.0,
        egui::Stroke::new(1.5, egui::Color32::from_rgb(0, 255, 0)),
        egui::StrokeKind::Middle,
    );
}
