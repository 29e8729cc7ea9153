//! Pointer-driven interaction state machine.
//!
//! The session is a plain value: every transition consumes the current
//! [`InteractionSession`] and returns the next one together with a
//! [`SessionEffect`] describing what should happen to the ROI collection.
//! Nothing here mutates ROIs directly; [`crate::document::RoiDocument`]
//! applies the effects.
//!
//! ```text
//! Idle --down outside ROIs--------> Drawing --move--> Drawing --up--> Idle (Commit)
//! Idle --down on a handle---------> Resizing --move--> Resizing --up--> Idle (Recapture)
//! Idle --down inside, off handle--> Idle (selects)
//! ```

use crate::config::Config;
use crate::constraints::{self, Bounds};
use crate::geometry::{self, Handle, HandleEngagement, RoiRect};
use crate::roi::{Roi, RoiId};
use eframe::egui;
use serde::{Deserialize, Serialize};

/// What the pointer is currently doing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Idle,
    /// A new ROI is being dragged out. `draft` keeps the pointer-down
    /// location as its origin and may have negative extents.
    Drawing { draft: RoiRect },
    /// A corner of an existing ROI is being dragged.
    Resizing { handle: Handle, roi: RoiId },
}

/// Transient interaction state. Never persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionSession {
    pub mode: Mode,
    pub selected: Option<RoiId>,
    /// Handle under the pointer, for cursor feedback and stickiness.
    pub hovered_handle: Option<Handle>,
}

/// Change the owner of the ROI collection must apply.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEffect {
    None,
    /// Replace the geometry of an existing ROI.
    Resize { roi: RoiId, rect: RoiRect },
    /// Add a new ROI with this (already solved) geometry.
    Commit { rect: RoiRect },
    /// Geometry of this ROI is final; refresh its capture.
    Recapture { roi: RoiId },
}

/// Result of a transition.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub session: InteractionSession,
    pub effect: SessionEffect,
}

impl Step {
    fn quiet(session: InteractionSession) -> Self {
        Self {
            session,
            effect: SessionEffect::None,
        }
    }
}

/// What lies under the pointer while idle, relative to the selected ROI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoverTarget {
    Handle(Handle),
    Inside,
    Outside,
}

/// Read-only view of the document a transition needs.
#[derive(Clone, Copy)]
pub struct EngineContext<'a> {
    pub rois: &'a [Roi],
    pub bounds: Bounds,
    pub config: &'a Config,
}

impl<'a> EngineContext<'a> {
    pub fn new(rois: &'a [Roi], bounds: Bounds, config: &'a Config) -> Self {
        Self {
            rois,
            bounds,
            config,
        }
    }

    fn find(&self, id: RoiId) -> Option<&'a Roi> {
        self.rois.iter().find(|r| r.id == id)
    }

    /// First ROI, in creation order, containing the point.
    fn roi_at(&self, p: egui::Pos2) -> Option<&'a Roi> {
        self.rois
            .iter()
            .find(|r| geometry::contains_point(p.x, p.y, &r.rect))
    }
}

impl InteractionSession {
    pub fn is_drawing(&self) -> bool {
        matches!(self.mode, Mode::Drawing { .. })
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self.mode, Mode::Resizing { .. })
    }

    /// Draft rectangle of an in-progress draw, normalized for display.
    pub fn draft(&self) -> Option<RoiRect> {
        match &self.mode {
            Mode::Drawing { draft } => Some(draft.normalized()),
            _ => None,
        }
    }

    /// Handle being dragged, if any.
    pub fn active_handle(&self) -> Option<Handle> {
        match self.mode {
            Mode::Resizing { handle, .. } => Some(handle),
            _ => None,
        }
    }

    fn engagement_for(&self, roi: RoiId) -> HandleEngagement {
        if self.selected != Some(roi) {
            return HandleEngagement::default();
        }
        HandleEngagement {
            active: self.active_handle(),
            hovered: self.hovered_handle,
            resizing: self.is_resizing(),
        }
    }

    /// Pointer pressed at `p` (canvas coordinates).
    ///
    /// Any gesture still in progress is abandoned first.
    pub fn pointer_down(self, p: egui::Pos2, ctx: &EngineContext<'_>) -> Step {
        let idle = InteractionSession {
            mode: Mode::Idle,
            ..self
        };

        if let Some(roi) = ctx.roi_at(p) {
            let engagement = HandleEngagement {
                resizing: false,
                ..idle.engagement_for(roi.id)
            };
            if let Some(handle) = geometry::hit_test_handle(p.x, p.y, &roi.rect, &engagement, ctx.config)
            {
                return Step::quiet(InteractionSession {
                    mode: Mode::Resizing {
                        handle,
                        roi: roi.id,
                    },
                    selected: Some(roi.id),
                    hovered_handle: Some(handle),
                });
            }
            return Step::quiet(InteractionSession {
                selected: Some(roi.id),
                ..idle
            });
        }

        Step::quiet(InteractionSession {
            mode: Mode::Drawing {
                draft: RoiRect::at(p),
            },
            selected: None,
            hovered_handle: None,
        })
    }

    /// Pointer moved to `p` (canvas coordinates).
    pub fn pointer_move(self, p: egui::Pos2, ctx: &EngineContext<'_>) -> Step {
        match self.mode {
            Mode::Idle => {
                let hovered_handle = match self.hover_target(p, ctx) {
                    HoverTarget::Handle(handle) => Some(handle),
                    _ => None,
                };
                Step::quiet(InteractionSession {
                    hovered_handle,
                    ..self
                })
            }
            Mode::Drawing { draft } => Step::quiet(InteractionSession {
                mode: Mode::Drawing {
                    draft: RoiRect {
                        width: p.x - draft.x,
                        height: p.y - draft.y,
                        ..draft
                    },
                },
                ..self
            }),
            Mode::Resizing { handle, roi } => {
                let Some(target) = ctx.find(roi) else {
                    // Discarded mid-gesture.
                    return Step::quiet(InteractionSession::default());
                };
                let rect = constraints::resize_with_handle(
                    &target.rect,
                    handle,
                    p,
                    ctx.bounds,
                    ctx.config,
                );
                Step {
                    session: self,
                    effect: SessionEffect::Resize { roi, rect },
                }
            }
        }
    }

    /// Pointer released. A release without a gesture in progress is a no-op.
    pub fn pointer_up(self, ctx: &EngineContext<'_>) -> Step {
        match self.mode {
            Mode::Idle => Step::quiet(self),
            Mode::Drawing { draft } => {
                let rect = constraints::solve(draft.normalized(), ctx.bounds, ctx.config);
                Step {
                    session: InteractionSession {
                        mode: Mode::Idle,
                        ..self
                    },
                    effect: SessionEffect::Commit { rect },
                }
            }
            Mode::Resizing { roi, .. } => Step {
                session: InteractionSession {
                    mode: Mode::Idle,
                    ..self
                },
                effect: SessionEffect::Recapture { roi },
            },
        }
    }

    /// Hover classification against the selected ROI, used for cursors.
    pub fn hover_target(&self, p: egui::Pos2, ctx: &EngineContext<'_>) -> HoverTarget {
        let Some(roi) = self.selected.and_then(|id| ctx.find(id)) else {
            return HoverTarget::Outside;
        };
        let engagement = self.engagement_for(roi.id);
        match geometry::hit_test_handle(p.x, p.y, &roi.rect, &engagement, ctx.config) {
            Some(handle) => HoverTarget::Handle(handle),
            None if geometry::contains_point(p.x, p.y, &roi.rect) => HoverTarget::Inside,
            None => HoverTarget::Outside,
        }
    }

    /// Forget everything about `roi`, e.g. after it was discarded.
    pub fn forget(self, roi: RoiId) -> Self {
        let resizing_it = matches!(self.mode, Mode::Resizing { roi: r, .. } if r == roi);
        if self.selected != Some(roi) && !resizing_it {
            return self;
        }
        InteractionSession {
            mode: if resizing_it { Mode::Idle } else { self.mode },
            selected: None,
            hovered_handle: None,
        }
    }
}
