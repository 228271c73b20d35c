//! # Image Preprocessing Module
//!
//! This module turns a raw captured still into an OCR-friendly image.
//! It is pure and deterministic: no shared state, the input buffer is never
//! mutated, and a new image is always returned.
//!
//! The module is organized into focused sub-modules:
//! - `scaling`: aspect-preserving downscale to a maximum bounding box
//! - `grayscale`: Rec.601 luma-weighted grayscale conversion
//! - `contrast`: fixed-cutoff, gain, or Otsu contrast enhancement
//! - `types`: shared option and result types

pub mod contrast;
pub mod grayscale;
pub mod scaling;
pub mod types;

// Re-export commonly used types and functions for convenience
pub use contrast::apply_contrast;
pub use grayscale::to_grayscale;
pub use scaling::downscale_to_fit;
pub use types::{
    ContrastImageResult, ContrastMode, GrayscaleImageResult, PreprocessOptions,
    PreprocessedImageResult, ScaledImageResult,
};

use image::DynamicImage;

/// Run the full preprocessing pipeline: bounded downscale (optional),
/// grayscale conversion, contrast enhancement.
///
/// Infallible: malformed options are rejected up front by
/// [`PreprocessOptions::validate`], and every step handles degenerate inputs
/// (uniform or empty images) rather than failing.
pub fn preprocess(image: &DynamicImage, opts: &PreprocessOptions) -> PreprocessedImageResult {
    let start_time = std::time::Instant::now();
    let original_dimensions = (image.width(), image.height());

    let (scaled, scale_factor) = match opts.max_dimensions {
        Some((max_w, max_h)) => {
            let result = downscale_to_fit(image, max_w, max_h);
            (result.image, result.scale_factor)
        }
        None => (image.clone(), 1.0),
    };

    let gray = to_grayscale(&scaled);
    let contrast = apply_contrast(&gray.image, opts.contrast);

    let final_dimensions = (contrast.image.width(), contrast.image.height());
    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "preprocessing",
        "Preprocessing completed in {}ms: {}x{} -> {}x{}, contrast={:?}",
        processing_time.as_millis(),
        original_dimensions.0,
        original_dimensions.1,
        final_dimensions.0,
        final_dimensions.1,
        opts.contrast
    );

    PreprocessedImageResult {
        image: contrast.image,
        original_dimensions,
        final_dimensions,
        scale_factor,
        threshold: contrast.threshold,
        processing_time_ms: processing_time.as_millis() as u32,
    }
}
