mod capture;
mod export;
mod interaction;

use image::{DynamicImage, Rgba, RgbaImage};

/// Every pixel encodes its own coordinates, so crops can be checked exactly.
pub fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    }))
}
