//! ROI Cutter Core Library
//!
//! This library provides the region-of-interest interaction engine behind the
//! ROI Cutter tool: drawing rectangles over an image, resizing them with
//! corner handles, tagging them, and exporting clean crops.
//!
//! # Overview
//!
//! Pointer events flow through four layers:
//!
//! - **Geometry & Hit-Testing**: display-to-image coordinate mapping,
//!   containment and sticky handle detection via [`geometry`]
//! - **Constraint Solving**: minimum size and padded image bounds via
//!   [`constraints`]
//! - **Interaction State Machine**: idle/drawing/resizing transitions via
//!   [`session`], applied to a ROI collection by [`document`]
//! - **Capture Pipeline**: padded two-stage rasterization via [`capture`]
//!
//! Around the engine sit [`export`] (hand-off to an upload collaborator) and
//! [`ui`] (an egui editor front-end).
//!
//! # Quick Start
//!
//! ```ignore
//! use roi_cutter_core::RoiCutter;
//!
//! roi_cutter_core::init();
//! let app = RoiCutter::new()?;
//! let image = app.open_image("frame.png".as_ref())?;
//! app.run_editor(image)?;
//! ```
//!
//! Headless use goes through [`RoiDocument`] directly:
//!
//! ```ignore
//! let mut doc = app.new_document(&image);
//! if let Some(job) = doc.draw(egui::pos2(50.0, 50.0), egui::pos2(150.0, 120.0)) {
//!     let outcome = capture::capture_async(job, Some(image.clone())).await;
//!     doc.apply_capture(outcome);
//! }
//! ```

pub mod capture;
pub mod config;
pub mod constraints;
pub mod document;
pub mod error;
pub mod export;
pub mod geometry;
pub mod image_processing;
pub mod roi;
pub mod session;
pub mod ui;

// Re-export primary types for convenience
pub use capture::{CaptureDispatcher, CaptureJob, CaptureOutcome, RasterPayload};
pub use config::Config;
pub use document::RoiDocument;
pub use error::{AppError, Result};
pub use geometry::{Handle, RoiRect};
pub use image_processing::ImageProcessor;
pub use roi::{Category, Roi, RoiId};
pub use session::InteractionSession;

/// The egui version the engine's point and rect types come from.
pub use eframe::egui;

use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Main entry point for the ROI Cutter application.
///
/// Holds the engine configuration and hands out documents and editors that
/// share it.
pub struct RoiCutter {
    config: Config,
}

impl RoiCutter {
    /// Creates an instance with configuration loaded from the environment
    /// (including `.env` files).
    ///
    /// # Errors
    ///
    /// Returns an error if an override is present but invalid.
    pub fn new() -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
        })
    }

    /// Creates an instance with custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Loads and decodes the image to work on.
    pub fn open_image(&self, path: &Path) -> Result<Arc<DynamicImage>> {
        let image = ImageProcessor::load(path)?;
        tracing::info!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Image loaded"
        );
        Ok(Arc::new(image))
    }

    /// An empty ROI document sized to `image`.
    pub fn new_document(&self, image: &DynamicImage) -> RoiDocument {
        RoiDocument::new(self.config.clone(), image.width(), image.height())
    }

    /// Opens the interactive editor on `image` and blocks until it closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the window or its async runtime cannot be created.
    pub fn run_editor(&self, image: Arc<DynamicImage>) -> Result<()> {
        ui::run_editor(image, self.config.clone())
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
}

/// Initializes the library: loads `.env` files and installs a `tracing`
/// subscriber filtered by `RUST_LOG` (default `info`).
///
/// Call this once at application startup. Later calls leave the first
/// subscriber in place.
pub fn init() {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
