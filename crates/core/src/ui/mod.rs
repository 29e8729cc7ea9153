//! User interface components for roi-cutter.
//!
//! This module provides the interactive editor: an image canvas where ROIs
//! are drawn and resized, and a side panel for tagging and exporting them.
//!
//! # Architecture
//!
//! The UI is split into focused submodules:
//! - [`state`]: Export status and background event definitions
//! - [`settings`]: User preferences and persistence
//! - [`rendering`]: Drawing utilities for ROIs, handles and overlays
//! - [`editor`]: Main application logic
//!
//! # Usage
//!
//! ```ignore
//! use roi_cutter_core::{ui, Config, ImageProcessor};
//!
//! let config = Config::load()?;
//! let image = ImageProcessor::load("frame.png".as_ref())?;
//!
//! // Blocks until the window is closed
//! ui::run_editor(std::sync::Arc::new(image), config)?;
//! ```

mod editor;
mod rendering;
mod settings;
mod state;

// Public API exports
pub use editor::RoiEditor;
pub use settings::{Settings, DEFAULT_EXPORT_DIR};
pub use state::UiState;

use crate::config::Config;
use crate::error::Result;
use image::DynamicImage;
use std::sync::Arc;

/// Launches the ROI editor on `image`.
///
/// # Arguments
/// * `image` - The decoded source image
/// * `config` - Engine configuration (sizes, stickiness, capture padding)
///
/// # Returns
/// - `Ok(())` - The user closed the window
/// - `Err(e)` - The window or its capture runtime could not be created
pub fn run_editor(image: Arc<DynamicImage>, config: Config) -> Result<()> {
    editor::run(image, config)
}
