//! # Contrast Enhancement Module
//!
//! This module provides the contrast step of the OCR preprocessing pipeline.
//! Three strategies are supported: fixed-cutoff binarization, multiplicative
//! gain, and automatic binarization with the cutoff chosen by Otsu's method.

use image::DynamicImage;
use imageproc::contrast::{otsu_level, threshold, ThresholdType};

use super::types::{ContrastImageResult, ContrastMode};

/// Apply the configured contrast enhancement to a grayscale image.
///
/// `Threshold`/`Otsu` binarize to {0, 255}; `Gain` multiplies intensities
/// and clamps into [0, 255]; `Disabled` passes the image through. Returns a
/// new buffer; the input is not mutated.
pub fn apply_contrast(image: &DynamicImage, mode: ContrastMode) -> ContrastImageResult {
    let start_time = std::time::Instant::now();
    let gray = image.to_luma8();

    let (enhanced, cutoff) = match mode {
        ContrastMode::Threshold(cutoff) => (
            threshold(&gray, cutoff, ThresholdType::Binary),
            Some(cutoff),
        ),
        ContrastMode::Otsu => {
            let level = otsu_level(&gray);
            (threshold(&gray, level, ThresholdType::Binary), Some(level))
        }
        ContrastMode::Gain(gain) => {
            let mut boosted = gray;
            for pixel in boosted.pixels_mut() {
                let scaled = (f32::from(pixel[0]) * gain).clamp(0.0, 255.0);
                pixel[0] = scaled.round().min(255.0) as u8;
            }
            (boosted, None)
        }
        ContrastMode::Disabled => (gray, None),
    };

    let processing_time = start_time.elapsed();
    tracing::debug!(
        target: "preprocessing",
        "Contrast enhancement ({:?}) completed in {}ms: cutoff={:?}, dimensions={}x{}",
        mode,
        processing_time.as_millis(),
        cutoff,
        enhanced.width(),
        enhanced.height()
    );

    ContrastImageResult {
        image: DynamicImage::ImageLuma8(enhanced),
        mode,
        threshold: cutoff,
        processing_time_ms: processing_time.as_millis() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};

    fn bimodal_image() -> DynamicImage {
        // Left half dark, right half light
        let mut img = GrayImage::new(10, 10);
        for y in 0..10 {
            for x in 0..10 {
                let value = if x < 5 { 25 } else { 225 };
                img.put_pixel(x, y, Luma([value]));
            }
        }
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn test_fixed_threshold_is_binary() {
        let result = apply_contrast(&bimodal_image(), ContrastMode::Threshold(128));
        assert_eq!(result.threshold, Some(128));
        for pixel in result.image.to_luma8().pixels() {
            assert!(pixel[0] == 0 || pixel[0] == 255);
        }
    }

    #[test]
    fn test_otsu_is_binary_and_separates_classes() {
        let result = apply_contrast(&bimodal_image(), ContrastMode::Otsu);
        let cutoff = result.threshold.expect("Otsu mode reports its cutoff");
        assert!((25..=225).contains(&cutoff));

        let binary = result.image.to_luma8();
        for pixel in binary.pixels() {
            assert!(pixel[0] == 0 || pixel[0] == 255);
        }
        // Dark half maps to 0, light half to 255
        assert_eq!(binary.get_pixel(0, 0)[0], 0);
        assert_eq!(binary.get_pixel(9, 0)[0], 255);
    }

    #[test]
    fn test_gain_clamps_to_255() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([200])));
        let result = apply_contrast(&img, ContrastMode::Gain(2.0));
        assert_eq!(result.threshold, None);
        for pixel in result.image.to_luma8().pixels() {
            assert_eq!(pixel[0], 255);
        }
    }

    #[test]
    fn test_gain_scales_midtones() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([100])));
        let result = apply_contrast(&img, ContrastMode::Gain(1.5));
        for pixel in result.image.to_luma8().pixels() {
            assert_eq!(pixel[0], 150);
        }
    }

    #[test]
    fn test_disabled_passes_through() {
        let img = bimodal_image();
        let result = apply_contrast(&img, ContrastMode::Disabled);
        assert_eq!(result.image.to_luma8().as_raw(), img.to_luma8().as_raw());
    }
}
