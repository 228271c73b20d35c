//! # Image Scaling Module
//!
//! Aspect-preserving downscale to a maximum bounding box, used to bound the
//! OCR engine's latency on large stills. Images already inside the box pass
//! through untouched; upscaling is never performed.

use image::{imageops::FilterType, DynamicImage};

use super::types::ScaledImageResult;

/// Downscale `image` so it fits inside `max_width` x `max_height`,
/// preserving aspect ratio. Returns a new buffer; the input is not mutated.
pub fn downscale_to_fit(
    image: &DynamicImage,
    max_width: u32,
    max_height: u32,
) -> ScaledImageResult {
    let start_time = std::time::Instant::now();
    let original_dimensions = (image.width(), image.height());

    let scaled = if image.width() > max_width || image.height() > max_height {
        image.resize(max_width, max_height, FilterType::Lanczos3)
    } else {
        image.clone()
    };

    let new_dimensions = (scaled.width(), scaled.height());
    let scale_factor = new_dimensions.0 as f32 / original_dimensions.0.max(1) as f32;
    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "preprocessing",
        "Downscale completed in {}ms: {}x{} -> {}x{} (factor {:.3})",
        processing_time.as_millis(),
        original_dimensions.0,
        original_dimensions.1,
        new_dimensions.0,
        new_dimensions.1,
        scale_factor
    );

    ScaledImageResult {
        image: scaled,
        original_dimensions,
        new_dimensions,
        scale_factor,
        processing_time_ms: processing_time.as_millis() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 90, 60]),
        ))
    }

    #[test]
    fn test_downscale_bounds_large_image() {
        let img = solid_image(2000, 1000);
        let result = downscale_to_fit(&img, 1000, 1000);

        assert!(result.new_dimensions.0 <= 1000);
        assert!(result.new_dimensions.1 <= 1000);
        // Aspect ratio preserved (2:1)
        assert_eq!(result.new_dimensions.0, result.new_dimensions.1 * 2);
        assert!(result.scale_factor < 1.0);
    }

    #[test]
    fn test_small_image_passes_through() {
        let img = solid_image(320, 240);
        let result = downscale_to_fit(&img, 1024, 768);

        assert_eq!(result.new_dimensions, (320, 240));
        assert_eq!(result.scale_factor, 1.0);
    }

    #[test]
    fn test_input_not_mutated() {
        let img = solid_image(2000, 1000);
        let before = img.clone();
        let _ = downscale_to_fit(&img, 500, 500);
        assert_eq!(img.as_bytes(), before.as_bytes());
    }
}
