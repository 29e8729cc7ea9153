//! The ROI document: the collection of ROIs over one image, plus the
//! interaction session that edits it.
//!
//! Pointer events go through [`InteractionSession`] transitions; the
//! resulting [`SessionEffect`]s are applied here. Whenever a gesture finishes,
//! the caller receives a [`CaptureJob`] to run through the capture pipeline
//! and later hands the outcome back to [`RoiDocument::apply_capture`].

use crate::capture::{CaptureJob, CaptureOutcome};
use crate::config::Config;
use crate::constraints::Bounds;
use crate::geometry::RoiRect;
use crate::roi::{Category, Roi, RoiId};
use crate::session::{EngineContext, HoverTarget, InteractionSession, SessionEffect, Step};
use eframe::egui;

pub struct RoiDocument {
    config: Config,
    image_width: u32,
    image_height: u32,
    rois: Vec<Roi>,
    session: InteractionSession,
    next_id: u64,
}

impl RoiDocument {
    /// Creates an empty document for an image of the given pixel size.
    pub fn new(config: Config, image_width: u32, image_height: u32) -> Self {
        Self {
            config,
            image_width,
            image_height,
            rois: Vec::new(),
            session: InteractionSession::default(),
            next_id: 1,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_pixels(self.image_width, self.image_height)
    }

    /// All ROIs in creation order.
    pub fn rois(&self) -> &[Roi] {
        &self.rois
    }

    pub fn roi(&self, id: RoiId) -> Option<&Roi> {
        self.rois.iter().find(|r| r.id == id)
    }

    pub fn session(&self) -> &InteractionSession {
        &self.session
    }

    pub fn selected(&self) -> Option<&Roi> {
        self.session.selected.and_then(|id| self.roi(id))
    }

    /// ROIs tagged with `category`, in creation order.
    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Roi> + '_ {
        self.rois
            .iter()
            .filter(move |r| r.category == Some(category))
    }

    pub fn pointer_down(&mut self, p: egui::Pos2) -> Option<CaptureJob> {
        self.step(|session, ctx| session.pointer_down(p, ctx))
    }

    pub fn pointer_move(&mut self, p: egui::Pos2) -> Option<CaptureJob> {
        self.step(|session, ctx| session.pointer_move(p, ctx))
    }

    pub fn pointer_up(&mut self) -> Option<CaptureJob> {
        self.step(|session, ctx| session.pointer_up(ctx))
    }

    /// What the pointer at `p` would interact with, for cursor feedback.
    pub fn hover_target(&self, p: egui::Pos2) -> HoverTarget {
        let ctx = EngineContext::new(&self.rois, self.bounds(), &self.config);
        self.session.hover_target(p, &ctx)
    }

    /// Selects a ROI from outside the canvas (e.g. a list click). Unknown ids
    /// clear the selection.
    pub fn select(&mut self, id: Option<RoiId>) {
        let id = id.filter(|id| self.roi(*id).is_some());
        if self.session.selected != id {
            self.session.selected = id;
            self.session.hovered_handle = None;
        }
    }

    /// Tags a ROI. Returns `false` (and does nothing) for unknown ids.
    pub fn set_category(&mut self, id: RoiId, category: Option<Category>) -> bool {
        match self.rois.iter_mut().find(|r| r.id == id) {
            Some(roi) => {
                roi.category = category;
                true
            }
            None => false,
        }
    }

    /// Removes a ROI, clearing the selection if it pointed at it. Returns
    /// `false` for unknown ids.
    pub fn discard(&mut self, id: RoiId) -> bool {
        let before = self.rois.len();
        self.rois.retain(|r| r.id != id);
        if self.rois.len() == before {
            return false;
        }
        self.session = std::mem::take(&mut self.session).forget(id);
        tracing::debug!(roi = %id, "ROI discarded");
        true
    }

    /// Stores a finished capture if it still matches the ROI's geometry.
    ///
    /// Returns `false` when the ROI is gone or has changed since the capture
    /// was issued; such outcomes are dropped.
    pub fn apply_capture(&mut self, outcome: CaptureOutcome) -> bool {
        let Some(roi) = self.rois.iter_mut().find(|r| r.id == outcome.roi) else {
            tracing::debug!(roi = %outcome.roi, "Capture arrived for discarded ROI");
            return false;
        };
        if roi.generation != outcome.generation {
            tracing::debug!(
                roi = %outcome.roi,
                stale = outcome.generation,
                current = roi.generation,
                "Dropping superseded capture"
            );
            return false;
        }
        roi.payload = outcome.payload;
        true
    }

    /// A capture job for the current geometry of `id`.
    pub fn capture_job(&self, id: RoiId) -> Option<CaptureJob> {
        self.roi(id).map(|roi| CaptureJob {
            roi: roi.id,
            generation: roi.generation,
            rect: roi.rect,
            padding: self.config.padding_px(),
        })
    }

    /// Commits a ROI as if drawn from `from` to `to`.
    pub fn draw(&mut self, from: egui::Pos2, to: egui::Pos2) -> Option<CaptureJob> {
        self.pointer_down(from);
        self.pointer_move(to);
        self.pointer_up()
    }

    fn step(
        &mut self,
        transition: impl FnOnce(InteractionSession, &EngineContext<'_>) -> Step,
    ) -> Option<CaptureJob> {
        let session = std::mem::take(&mut self.session);
        let step = {
            let ctx = EngineContext::new(&self.rois, self.bounds(), &self.config);
            transition(session, &ctx)
        };
        self.session = step.session;
        self.apply(step.effect)
    }

    fn apply(&mut self, effect: SessionEffect) -> Option<CaptureJob> {
        match effect {
            SessionEffect::None => None,
            SessionEffect::Resize { roi, rect } => {
                if let Some(target) = self.rois.iter_mut().find(|r| r.id == roi) {
                    target.set_rect(rect);
                }
                None
            }
            SessionEffect::Commit { rect } => Some(self.commit(rect)),
            SessionEffect::Recapture { roi } => self.capture_job(roi),
        }
    }

    fn commit(&mut self, rect: RoiRect) -> CaptureJob {
        let id = RoiId(self.next_id);
        self.next_id += 1;
        self.rois.push(Roi::new(id, rect));
        tracing::debug!(roi = %id, ?rect, "ROI committed");
        CaptureJob {
            roi: id,
            generation: 0,
            rect,
            padding: self.config.padding_px(),
        }
    }
}
