//! Error types for the roi-cutter-core library.
//!
//! The interaction engine itself recovers locally (clamping or no-ops), so
//! these variants mostly cover the surrounding glue: configuration, image
//! loading, encoding and export.

use thiserror::Error;

/// Errors that can occur within the roi-cutter-core library.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (invalid values, failed validation).
    #[error("Configuration error: {0}")]
    Config(String),

    /// An environment override was present but could not be parsed.
    #[error("Invalid value for environment variable {name}: {value:?}")]
    InvalidEnvVar { name: String, value: String },

    /// The source image could not be read or decoded.
    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    /// Image processing or encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// The region to capture has zero width or height.
    #[error("Selection area is empty or invalid")]
    EmptySelection,

    /// A category name did not match any known category.
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Handing a crop to the upload collaborator failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// UI-related errors (rendering, window management).
    #[error("UI error: {0}")]
    Ui(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates an export error with the given message.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Creates a UI error with the given message.
    pub fn ui(msg: impl Into<String>) -> Self {
        Self::Ui(msg.into())
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
