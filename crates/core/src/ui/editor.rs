//! Main ROI editor application.
//!
//! This module contains the `RoiEditor` struct which implements the
//! `eframe::App` trait: the image canvas driven by the interaction engine and
//! a side panel listing, tagging and exporting ROIs.

use super::rendering::{
    cursor_for, draw_dimmed_surroundings, draw_draft, draw_handles, draw_roi, fit_image_rect,
    handle_cursor,
};
use super::settings::Settings;
use super::state::{ExportEvent, UiState};
use crate::capture::{CaptureDispatcher, CaptureJob};
use crate::config::Config;
use crate::document::RoiDocument;
use crate::error::{AppError, Result};
use crate::export::{collect_exports, export_rois, DirectorySink};
use crate::geometry::{to_canvas_coordinates, CanvasView};
use crate::roi::{Category, RoiId};
use crate::session::HoverTarget;
use eframe::egui;
use image::DynamicImage;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

const THUMBNAIL_HEIGHT: f32 = 48.0;

/// Something the user asked for in the ROI list, applied after the list has
/// been drawn.
enum ListAction {
    Select(RoiId),
    SetCategory(RoiId, Option<Category>),
    Discard(RoiId),
    Copy(RoiId),
}

/// The ROI editor application.
pub struct RoiEditor {
    // Image state
    image: Arc<DynamicImage>,
    image_texture: Option<egui::TextureHandle>,
    /// Pre-converted image data for fast texture upload
    color_image: Option<egui::ColorImage>,

    // Engine state
    document: RoiDocument,
    captures: CaptureDispatcher,
    pending_captures: usize,
    thumbnails: HashMap<RoiId, egui::TextureHandle>,
    last_pointer: Option<egui::Pos2>,

    // Export state
    state: UiState,
    rx: Receiver<ExportEvent>,
    tx: Sender<ExportEvent>,

    // Settings
    settings: Settings,

    // Keeps the capture workers alive for the editor's lifetime.
    _runtime: tokio::runtime::Runtime,
}

impl RoiEditor {
    /// Creates a new editor instance.
    ///
    /// # Arguments
    /// * `image` - The decoded source image
    /// * `config` - Engine configuration
    /// * `runtime` - Runtime the capture pipeline runs on
    pub fn new(image: Arc<DynamicImage>, config: Config, runtime: tokio::runtime::Runtime) -> Self {
        let (tx, rx) = channel();

        // Pre-convert image to ColorImage for fast texture upload
        let image_buffer = image.to_rgba8();
        let size = [image.width() as usize, image.height() as usize];
        let pixels = image_buffer.as_flat_samples();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());

        let document = RoiDocument::new(config, image.width(), image.height());
        let captures = CaptureDispatcher::new(runtime.handle().clone());

        Self {
            image,
            image_texture: None,
            color_image: Some(color_image),
            document,
            captures,
            pending_captures: 0,
            thumbnails: HashMap::new(),
            last_pointer: None,
            state: UiState::Idle,
            rx,
            tx,
            settings: Settings::load(),
            _runtime: runtime,
        }
    }

    fn dispatch_capture(&mut self, job: CaptureJob) {
        self.captures.dispatch(job, Some(self.image.clone()));
        self.pending_captures += 1;
    }

    /// Applies finished captures to the document.
    fn process_captures(&mut self, ctx: &egui::Context) {
        for outcome in self.captures.drain() {
            self.pending_captures = self.pending_captures.saturating_sub(1);
            let roi = outcome.roi;
            if self.document.apply_capture(outcome) {
                self.thumbnails.remove(&roi);
            }
        }
        if self.pending_captures > 0 {
            ctx.request_repaint();
        }
    }

    /// Processes events from the background export thread.
    fn process_export_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                ExportEvent::Progress { done, total } => {
                    self.state = UiState::Exporting { done, total };
                }
                ExportEvent::Finished(report) => {
                    self.state = UiState::Exported {
                        count: report.exported,
                        destination: self.settings.export_dir.clone(),
                    };
                }
                ExportEvent::Error(err) => {
                    self.state = UiState::Error(err);
                }
            }
            ctx.request_repaint();
        }
        if self.state.is_busy() {
            ctx.request_repaint();
        }
    }

    /// Uploads every tagged, captured ROI on a background thread.
    fn start_export(&mut self) {
        if let Err(e) = self.settings.save() {
            tracing::warn!("Failed to save settings: {}", e);
        }

        let items = collect_exports(&self.document, chrono::Utc::now());
        if items.is_empty() {
            self.state = UiState::Error("no ROI has both a category and a capture".into());
            return;
        }

        self.state = UiState::Exporting {
            done: 0,
            total: items.len(),
        };

        let tx = self.tx.clone();
        let export_dir = self.settings.export_dir.clone();

        thread::spawn(move || {
            let mut sink = match DirectorySink::new(&export_dir) {
                Ok(sink) => sink,
                Err(e) => {
                    let _ = tx.send(ExportEvent::Error(e.to_string()));
                    return;
                }
            };
            let progress_tx = tx.clone();
            let result = export_rois(&items, &mut sink, |done, total| {
                let _ = progress_tx.send(ExportEvent::Progress { done, total });
            });
            let _ = match result {
                Ok(report) => tx.send(ExportEvent::Finished(report)),
                Err(e) => tx.send(ExportEvent::Error(e.to_string())),
            };
        });
    }

    /// Puts a ROI's crop on the system clipboard.
    fn copy_to_clipboard(&self, id: RoiId) -> Result<()> {
        let payload = self
            .document
            .roi(id)
            .and_then(|roi| roi.payload.as_ref())
            .ok_or(AppError::EmptySelection)?;
        let pixels = payload.decode()?;
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| AppError::ui(format!("Clipboard unavailable: {}", e)))?;
        clipboard
            .set_image(arboard::ImageData {
                width: pixels.width() as usize,
                height: pixels.height() as usize,
                bytes: Cow::Owned(pixels.into_raw()),
            })
            .map_err(|e| AppError::ui(format!("Failed to copy image: {}", e)))
    }

    /// Texture for a ROI's crop, decoded on first use.
    fn thumbnail(&mut self, ctx: &egui::Context, id: RoiId) -> Option<egui::TextureHandle> {
        let Some(payload) = self.document.roi(id).and_then(|roi| roi.payload.as_ref()) else {
            // Geometry changed since the last capture.
            self.thumbnails.remove(&id);
            return None;
        };
        if let Some(texture) = self.thumbnails.get(&id) {
            return Some(texture.clone());
        }
        let pixels = payload.decode().ok()?;
        let size = [pixels.width() as usize, pixels.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_raw());
        let texture = ctx.load_texture(format!("roi-{}", id.0), color_image, egui::TextureOptions::LINEAR);
        self.thumbnails.insert(id, texture.clone());
        Some(texture)
    }

    /// Feeds this frame's pointer input through the engine and sets the
    /// cursor.
    fn handle_pointer(&mut self, ctx: &egui::Context, response: &egui::Response, view: &CanvasView) {
        let (pressed, released, latest) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.latest_pos(),
            )
        });
        let over_canvas = response.contains_pointer();
        let canvas_pos = latest.map(|p| to_canvas_coordinates(p, view));

        if pressed && over_canvas {
            if let Some(job) = canvas_pos.and_then(|p| self.document.pointer_down(p)) {
                self.dispatch_capture(job);
            }
        }

        if canvas_pos != self.last_pointer {
            if let Some(p) = canvas_pos {
                if let Some(job) = self.document.pointer_move(p) {
                    self.dispatch_capture(job);
                }
            }
            self.last_pointer = canvas_pos;
        }

        if released {
            if let Some(job) = self.document.pointer_up() {
                let roi = job.roi;
                let is_new = self.document.roi(roi).is_some_and(|r| r.category.is_none() && r.payload.is_none());
                if is_new {
                    if let Some(category) = self.settings.default_category {
                        self.document.set_category(roi, Some(category));
                    }
                }
                self.dispatch_capture(job);
            }
        }

        if discard_shortcut_pressed(ctx) {
            if let Some(id) = self.document.session().selected {
                self.document.discard(id);
                self.thumbnails.remove(&id);
            }
        }

        if over_canvas {
            let session = self.document.session();
            let cursor = if let Some(handle) = session.active_handle() {
                handle_cursor(handle)
            } else if session.is_drawing() {
                egui::CursorIcon::Crosshair
            } else {
                match canvas_pos {
                    Some(p) => cursor_for(self.document.hover_target(p)),
                    None => cursor_for(HoverTarget::Outside),
                }
            };
            ctx.set_cursor_icon(cursor);
        }
    }

    /// Paints ROIs, handles and the draft over the image.
    fn paint_overlay(&self, painter: &egui::Painter, view: &CanvasView) {
        let session = self.document.session();

        if let Some(selected) = self.document.selected() {
            draw_dimmed_surroundings(painter, view.rendered, view.rect_to_display(&selected.rect), 90);
        }

        for roi in self.document.rois() {
            draw_roi(painter, view, &roi.rect, roi.category, session.selected == Some(roi.id));
        }

        if let Some(selected) = self.document.selected() {
            let engaged = session.active_handle().or(session.hovered_handle);
            draw_handles(
                painter,
                view,
                &selected.rect,
                self.document.config().handle_size,
                engaged,
            );
        }

        if let Some(draft) = session.draft() {
            draw_draft(painter, view, &draft);
        }
    }

    /// Renders the ROI list, tagging controls and export section.
    fn render_side_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Regions of interest");
        ui.label(format!("{} ROI(s)", self.document.rois().len()));
        ui.separator();

        let mut actions = Vec::new();
        let selected = self.document.session().selected;
        let rois: Vec<_> = self
            .document
            .rois()
            .iter()
            .map(|r| (r.id, r.rect, r.category, r.payload.is_some()))
            .collect();

        egui::ScrollArea::vertical()
            .max_height(ui.available_height() * 0.6)
            .show(ui, |ui| {
                for (id, rect, category, captured) in rois {
                    ui.horizontal(|ui| {
                        if let Some(texture) = self.thumbnail(ui.ctx(), id) {
                            let size = texture.size_vec2();
                            let scale = THUMBNAIL_HEIGHT / size.y.max(1.0);
                            ui.add(egui::Image::new(egui::load::SizedTexture::new(
                                texture.id(),
                                size * scale,
                            )));
                        } else if !captured {
                            ui.spinner();
                        }

                        ui.vertical(|ui| {
                            let label = format!("{} {:.0}×{:.0}", id, rect.width, rect.height);
                            if ui.selectable_label(selected == Some(id), label).clicked() {
                                actions.push(ListAction::Select(id));
                            }

                            let mut chosen = category;
                            egui::ComboBox::from_id_salt(("roi-category", id.0))
                                .selected_text(chosen.map_or("Unassigned", |c| c.label()))
                                .show_ui(ui, |ui| {
                                    ui.selectable_value(&mut chosen, None, "Unassigned");
                                    for c in Category::ALL {
                                        ui.selectable_value(&mut chosen, Some(c), c.label());
                                    }
                                });
                            if chosen != category {
                                actions.push(ListAction::SetCategory(id, chosen));
                            }

                            ui.horizontal(|ui| {
                                if ui.add_enabled(captured, egui::Button::new("Copy")).clicked() {
                                    actions.push(ListAction::Copy(id));
                                }
                                if ui.button("Discard").clicked() {
                                    actions.push(ListAction::Discard(id));
                                }
                            });
                        });
                    });
                    ui.separator();
                }
            });

        for action in actions {
            match action {
                ListAction::Select(id) => self.document.select(Some(id)),
                ListAction::SetCategory(id, category) => {
                    self.document.set_category(id, category);
                }
                ListAction::Discard(id) => {
                    self.document.discard(id);
                    self.thumbnails.remove(&id);
                }
                ListAction::Copy(id) => {
                    if let Err(e) = self.copy_to_clipboard(id) {
                        tracing::warn!(roi = %id, "Copy failed: {}", e);
                    }
                }
            }
        }

        ui.collapsing("By category", |ui| {
            for c in Category::ALL {
                ui.label(format!("{}: {}", c.label(), self.document.by_category(c).count()));
            }
        });

        ui.separator();
        self.render_export_ui(ui);
    }

    /// Renders the export controls and status.
    fn render_export_ui(&mut self, ui: &mut egui::Ui) {
        ui.label("Export directory:");
        ui.add(
            egui::TextEdit::singleline(&mut self.settings.export_dir)
                .desired_width(f32::INFINITY)
                .hint_text("roi-export"),
        );

        egui::ComboBox::from_label("New ROI category")
            .selected_text(self.settings.default_category.map_or("Unassigned", |c| c.label()))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut self.settings.default_category, None, "Unassigned");
                for c in Category::ALL {
                    ui.selectable_value(&mut self.settings.default_category, Some(c), c.label());
                }
            });

        let busy = self.state.is_busy();
        ui.horizontal(|ui| {
            if ui.add_enabled(!busy, egui::Button::new("Export ROIs")).clicked() {
                self.start_export();
            }
            if busy {
                ui.spinner();
            }
        });

        if let Some(status) = self.state.status_line() {
            let color = match self.state {
                UiState::Error(_) => egui::Color32::RED,
                _ => egui::Color32::LIGHT_GRAY,
            };
            ui.label(egui::RichText::new(status).color(color));
        }
    }
}

impl eframe::App for RoiEditor {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        self.process_captures(ctx);
        self.process_export_events(ctx);

        // Upload texture on first frame using pre-converted data
        if self.image_texture.is_none() {
            if let Some(color_image) = self.color_image.take() {
                self.image_texture =
                    Some(ctx.load_texture("source-image", color_image, egui::TextureOptions::LINEAR));
            }
        }

        egui::SidePanel::right("roi_panel")
            .default_width(280.0)
            .show(ctx, |ui| {
                self.render_side_panel(ui);
            });

        let panel_frame = egui::Frame::default()
            .inner_margin(egui::Margin::same(0))
            .outer_margin(egui::Margin::same(0));

        egui::CentralPanel::default()
            .frame(panel_frame)
            .show(ctx, |ui| {
                let available = ui.max_rect();
                let (image_w, image_h) = self.document.image_size();
                let intrinsic = egui::vec2(image_w as f32, image_h as f32);
                let image_rect = fit_image_rect(available, intrinsic);
                let view = CanvasView::new(image_rect, intrinsic);

                if let Some(texture) = &self.image_texture {
                    ui.painter().image(
                        texture.id(),
                        image_rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }

                let response = ui.interact(available, ui.id().with("canvas"), egui::Sense::drag());
                self.handle_pointer(ctx, &response, &view);
                self.paint_overlay(&ui.painter_at(available), &view);
            });
    }
}

/// Delete discards the selected ROI unless a text field is being edited.
fn discard_shortcut_pressed(ctx: &egui::Context) -> bool {
    !ctx.wants_keyboard_input() && ctx.input(|i| i.key_pressed(egui::Key::Delete))
}

/// Launches the editor and returns when the user closes the window.
///
/// # Arguments
/// * `image` - The decoded source image
/// * `config` - Engine configuration
pub fn run(image: Arc<DynamicImage>, config: Config) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("roi-capture")
        .enable_all()
        .build()
        .map_err(|e| AppError::ui(format!("Failed to create capture runtime: {}", e)))?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("ROI Cutter")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "ROI Cutter",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(RoiEditor::new(image, config, runtime)) as Box<dyn eframe::App>)
        }),
    )
    .map_err(|e| AppError::ui(format!("Failed to run UI: {}", e)))
}
