use std::env;
use std::str::FromStr;

use crate::error::{AppError, Result};
use dotenvy::dotenv;

pub const DEFAULT_MIN_ROI_SIZE: f32 = 20.0;
pub const DEFAULT_HANDLE_SIZE: f32 = 16.0;
pub const DEFAULT_HANDLE_HIT_RADIUS: f32 = 20.0;
pub const DEFAULT_STICKY_FACTOR: f32 = 2.0;
pub const DEFAULT_CAPTURE_PADDING: f32 = 5.0;

/// Tunable constants of the interaction engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Smallest width/height a ROI may have, in image pixels.
    pub min_roi_size: f32,
    /// Edge length of the square drawn for each corner handle.
    pub handle_size: f32,
    /// Half-extent of the square around a corner that counts as a handle hit.
    pub handle_hit_radius: f32,
    /// Multiplier applied to the hit radius of the engaged handle.
    pub sticky_factor: f32,
    /// Inward margin kept between a ROI and the image edge, also used as the
    /// capture padding.
    pub capture_padding: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_roi_size: DEFAULT_MIN_ROI_SIZE,
            handle_size: DEFAULT_HANDLE_SIZE,
            handle_hit_radius: DEFAULT_HANDLE_HIT_RADIUS,
            sticky_factor: DEFAULT_STICKY_FACTOR,
            capture_padding: DEFAULT_CAPTURE_PADDING,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let mut builder = Self::builder();
        if let Some(v) = env_override("ROI_MIN_SIZE")? {
            builder = builder.with_min_roi_size(v);
        }
        if let Some(v) = env_override("ROI_HANDLE_SIZE")? {
            builder = builder.with_handle_size(v);
        }
        if let Some(v) = env_override("ROI_HANDLE_RADIUS")? {
            builder = builder.with_handle_hit_radius(v);
        }
        if let Some(v) = env_override("ROI_STICKY_FACTOR")? {
            builder = builder.with_sticky_factor(v);
        }
        if let Some(v) = env_override("ROI_CAPTURE_PADDING")? {
            builder = builder.with_capture_padding(v);
        }
        builder.build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            config: Self::default(),
        }
    }

    /// Capture padding in pixels. Validation keeps it whole, so the capture
    /// margin equals the bounds margin the solver keeps.
    pub fn padding_px(&self) -> u32 {
        self.capture_padding.max(0.0) as u32
    }

    fn validate(&self) -> Result<()> {
        if !(self.min_roi_size > 0.0) {
            return Err(AppError::config("min_roi_size must be positive"));
        }
        if !(self.handle_size > 0.0) {
            return Err(AppError::config("handle_size must be positive"));
        }
        if !(self.handle_hit_radius > 0.0) {
            return Err(AppError::config("handle_hit_radius must be positive"));
        }
        if !(self.sticky_factor >= 1.0) {
            return Err(AppError::config("sticky_factor must be at least 1"));
        }
        if !(self.capture_padding >= 0.0) {
            return Err(AppError::config("capture_padding must not be negative"));
        }
        if self.capture_padding.fract() != 0.0 {
            return Err(AppError::config("capture_padding must be a whole number of pixels"));
        }
        Ok(())
    }
}

fn env_override<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::InvalidEnvVar {
                name: name.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn with_min_roi_size(mut self, value: f32) -> Self {
        self.config.min_roi_size = value;
        self
    }

    pub fn with_handle_size(mut self, value: f32) -> Self {
        self.config.handle_size = value;
        self
    }

    pub fn with_handle_hit_radius(mut self, value: f32) -> Self {
        self.config.handle_hit_radius = value;
        self
    }

    pub fn with_sticky_factor(mut self, value: f32) -> Self {
        self.config.sticky_factor = value;
        self
    }

    pub fn with_capture_padding(mut self, value: f32) -> Self {
        self.config.capture_padding = value;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
