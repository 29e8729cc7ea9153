//! ROI capture pipeline.
//!
//! Rasterizes a ROI of the source image into a standalone PNG. Cropping
//! exactly at a rectangle's edge is prone to a one-pixel fringe, so the
//! pipeline draws in two stages:
//!
//! 1. the ROI grown by `padding` on every side is copied onto a private
//!    `(w + 2p) × (h + 2p)` surface (source pixels outside the image stay
//!    transparent);
//! 2. that surface, cropped by `padding` on every side, becomes the final
//!    `w × h` image.
//!
//! # Concurrency
//!
//! Captures run on tokio's blocking pool and report back through a channel
//! drained by the thread that owns the document. Each job carries the ROI's
//! capture generation so stale results can be rejected on arrival.
//!
//! # Example
//!
//! ```ignore
//! let dispatcher = CaptureDispatcher::new(runtime.handle().clone());
//! if let Some(job) = document.pointer_up() {
//!     dispatcher.dispatch(job, Some(image.clone()));
//! }
//! for outcome in dispatcher.drain() {
//!     document.apply_capture(outcome);
//! }
//! ```

use crate::error::{AppError, Result};
use crate::geometry::RoiRect;
use crate::image_processing::ImageProcessor;
use crate::roi::RoiId;
use image::{imageops, DynamicImage, GenericImageView, RgbaImage};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Encoded pixels of a captured ROI.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterPayload {
    pub width: u32,
    pub height: u32,
    /// PNG-encoded image.
    pub png: Vec<u8>,
}

impl RasterPayload {
    /// `data:image/png;base64,...` URL for display or upload.
    pub fn to_data_url(&self) -> String {
        ImageProcessor::to_data_url(&self.png)
    }

    /// Decodes the PNG back into pixels.
    pub fn decode(&self) -> Result<RgbaImage> {
        Ok(ImageProcessor::decode(&self.png)?.into_rgba8())
    }
}

impl std::fmt::Debug for RasterPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterPayload")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_bytes", &self.png.len())
            .finish()
    }
}

/// A ROI rectangle snapped to whole pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRegion {
    /// Rounds a (normalized) rectangle to pixels. `None` when either extent
    /// rounds to zero.
    pub fn from_rect(rect: &RoiRect) -> Option<Self> {
        let r = rect.normalized();
        let width = r.width.round() as u32;
        let height = r.height.round() as u32;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            x: r.x.round() as i64,
            y: r.y.round() as i64,
            width,
            height,
        })
    }
}

/// Stage one: copies `region` grown by `padding` onto a fresh surface.
pub fn render_padded(source: &DynamicImage, region: PixelRegion, padding: u32) -> RgbaImage {
    let pad = i64::from(padding);
    let surface_w = region.width + 2 * padding;
    let surface_h = region.height + 2 * padding;
    let mut surface = RgbaImage::new(surface_w, surface_h);

    let origin_x = region.x - pad;
    let origin_y = region.y - pad;
    let (src_w, src_h) = source.dimensions();

    let x0 = origin_x.max(0);
    let y0 = origin_y.max(0);
    let x1 = (origin_x + i64::from(surface_w)).min(i64::from(src_w));
    let y1 = (origin_y + i64::from(surface_h)).min(i64::from(src_h));

    if x1 > x0 && y1 > y0 {
        let piece = source
            .crop_imm(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
            .to_rgba8();
        imageops::replace(&mut surface, &piece, x0 - origin_x, y0 - origin_y);
    }

    surface
}

/// Stage two: strips `padding` from every side of a stage-one surface.
pub fn crop_padding(surface: &RgbaImage, padding: u32, width: u32, height: u32) -> RgbaImage {
    imageops::crop_imm(surface, padding, padding, width, height).to_image()
}

/// Runs both stages and returns the raw pixels of the ROI.
pub fn capture_pixels(source: &DynamicImage, rect: &RoiRect, padding: u32) -> Result<RgbaImage> {
    let region = PixelRegion::from_rect(rect).ok_or(AppError::EmptySelection)?;
    let surface = render_padded(source, region, padding);
    Ok(crop_padding(&surface, padding, region.width, region.height))
}

/// Captures and encodes a ROI. A missing source image or a failed encode
/// yields `None`.
pub fn capture(source: Option<&DynamicImage>, rect: &RoiRect, padding: u32) -> Option<RasterPayload> {
    let source = source?;
    let encoded = capture_pixels(source, rect, padding).and_then(|pixels| {
        let png = ImageProcessor::encode_png(&pixels)?;
        Ok(RasterPayload {
            width: pixels.width(),
            height: pixels.height(),
            png,
        })
    });
    match encoded {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::warn!(?rect, "ROI capture failed: {}", e);
            None
        }
    }
}

/// Work order for one capture.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureJob {
    pub roi: RoiId,
    /// Generation of the ROI when the job was issued.
    pub generation: u64,
    pub rect: RoiRect,
    pub padding: u32,
}

/// Completed capture, to be handed to `RoiDocument::apply_capture`.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureOutcome {
    pub roi: RoiId,
    pub generation: u64,
    pub payload: Option<RasterPayload>,
}

/// Runs a capture on the blocking pool.
pub async fn capture_async(job: CaptureJob, source: Option<Arc<DynamicImage>>) -> CaptureOutcome {
    let CaptureJob {
        roi,
        generation,
        rect,
        padding,
    } = job;

    let payload = match source {
        Some(image) => {
            match tokio::task::spawn_blocking(move || capture(Some(image.as_ref()), &rect, padding)).await {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!(%roi, "Capture task failed: {}", e);
                    None
                }
            }
        }
        None => {
            tracing::debug!(%roi, "No source image loaded, capture yields no payload");
            None
        }
    };

    CaptureOutcome {
        roi,
        generation,
        payload,
    }
}

/// Fans capture jobs out onto a tokio runtime and collects their results.
pub struct CaptureDispatcher {
    runtime: Handle,
    tx: Sender<CaptureOutcome>,
    rx: Receiver<CaptureOutcome>,
}

impl CaptureDispatcher {
    pub fn new(runtime: Handle) -> Self {
        let (tx, rx) = channel();
        Self { runtime, tx, rx }
    }

    /// Starts a capture. The returned handle resolves once the outcome has
    /// been queued for [`drain`](Self::drain).
    pub fn dispatch(&self, job: CaptureJob, source: Option<Arc<DynamicImage>>) -> JoinHandle<()> {
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let outcome = capture_async(job, source).await;
            // Receiver gone means the editor closed.
            let _ = tx.send(outcome);
        })
    }

    /// Completed captures, in completion order.
    pub fn drain(&self) -> Vec<CaptureOutcome> {
        self.rx.try_iter().collect()
    }
}
