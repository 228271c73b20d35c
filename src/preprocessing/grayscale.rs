//! # Grayscale Conversion Module
//!
//! Converts color frames to single-channel intensity using the perceptual
//! Rec.601 luma weighting `Y = 0.299R + 0.587G + 0.114B`, which is what the
//! downstream binarization cutoffs are tuned against.

use image::{DynamicImage, GrayImage, Luma};

use super::types::GrayscaleImageResult;

/// Convert `image` to grayscale with Rec.601 luma weights.
/// Returns a new buffer; the input is not mutated.
pub fn to_grayscale(image: &DynamicImage) -> GrayscaleImageResult {
    let start_time = std::time::Instant::now();

    let rgb = image.to_rgb8();
    let mut gray = GrayImage::new(rgb.width(), rgb.height());
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let luma = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
        gray.put_pixel(x, y, Luma([luma.round().min(255.0) as u8]));
    }

    let processing_time = start_time.elapsed();
    tracing::debug!(
        target: "preprocessing",
        "Grayscale conversion completed in {}ms: {}x{}",
        processing_time.as_millis(),
        gray.width(),
        gray.height()
    );

    GrayscaleImageResult {
        image: DynamicImage::ImageLuma8(gray),
        processing_time_ms: processing_time.as_millis() as u32,
    }
}
