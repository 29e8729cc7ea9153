//! Image loading and encoding utilities.
//!
//! The interaction engine never decodes images itself; the front-ends load
//! the source through [`ImageProcessor::load`] and the capture pipeline
//! encodes its output through [`ImageProcessor::encode_png`].

use crate::error::{AppError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Image processing utilities for the capture and export workflow.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Reads and decodes an image file.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ImageLoad`] if the file cannot be read or decoded.
    pub fn load(path: &Path) -> Result<DynamicImage> {
        image::open(path)
            .map_err(|e| AppError::ImageLoad(format!("{}: {}", path.display(), e)))
    }

    /// Decodes an in-memory image, guessing its format from the content.
    pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).map_err(|e| AppError::ImageLoad(e.to_string()))
    }

    /// Encodes RGBA pixels as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::EmptySelection`] for a zero-area image and
    /// [`AppError::ImageProcessing`] if encoding fails.
    pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
        if image.width() == 0 || image.height() == 0 {
            return Err(AppError::EmptySelection);
        }

        let mut buffer: Vec<u8> = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| AppError::image(format!("Failed to encode image: {}", e)))?;

        Ok(buffer)
    }

    /// Wraps PNG bytes in a `data:` URL.
    pub fn to_data_url(png: &[u8]) -> String {
        format!("{}{}", PNG_DATA_URL_PREFIX, BASE64.encode(png))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn data_url_round_trip() {
        let pixels = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
        let png = ImageProcessor::encode_png(&pixels).unwrap();
        let url = ImageProcessor::to_data_url(&png);
        assert!(url.starts_with(PNG_DATA_URL_PREFIX));
        assert_eq!(BASE64.decode(&url[PNG_DATA_URL_PREFIX.len()..]).unwrap(), png);

        let decoded = ImageProcessor::decode(&png).unwrap().into_rgba8();
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn empty_image_is_not_encoded() {
        let empty = RgbaImage::new(0, 5);
        assert!(matches!(
            ImageProcessor::encode_png(&empty),
            Err(AppError::EmptySelection)
        ));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = ImageProcessor::load(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, AppError::ImageLoad(_)));
    }
}
