//! # Shared Types for Image Preprocessing
//!
//! This module contains the shared types, structs, and enums used across
//! the preprocessing sub-modules.

use image::DynamicImage;

use crate::errors::{AppError, AppResult};

/// Default bounding box for the optional downscale step
pub const DEFAULT_MAX_WIDTH: u32 = 1024;
pub const DEFAULT_MAX_HEIGHT: u32 = 768;

/// Contrast-enhancement strategy applied after grayscale conversion.
///
/// The surrounding UIs use both fixed-cutoff binarization and multiplicative
/// gain interchangeably, so the mode is configuration, not code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContrastMode {
    /// Binarize to {0, 255} at a fixed cutoff
    Threshold(u8),
    /// Multiply intensities by a gain factor, clamped to [0, 255]
    Gain(f32),
    /// Binarize at an automatically selected cutoff (Otsu's method)
    Otsu,
    /// Leave intensities untouched
    Disabled,
}

impl Default for ContrastMode {
    fn default() -> Self {
        ContrastMode::Otsu
    }
}

/// Options for the preprocessing pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessOptions {
    /// Maximum (width, height) bounding box for the aspect-preserving
    /// downscale; `None` skips the step. Images are never upscaled.
    pub max_dimensions: Option<(u32, u32)>,
    /// Contrast-enhancement mode
    pub contrast: ContrastMode,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            max_dimensions: Some((DEFAULT_MAX_WIDTH, DEFAULT_MAX_HEIGHT)),
            contrast: ContrastMode::default(),
        }
    }
}

impl PreprocessOptions {
    /// Validate preprocessing options
    pub fn validate(&self) -> AppResult<()> {
        if let Some((w, h)) = self.max_dimensions {
            if w == 0 || h == 0 {
                return Err(AppError::Config(format!(
                    "max_dimensions must be non-zero, got {}x{}",
                    w, h
                )));
            }
        }
        if let ContrastMode::Gain(gain) = self.contrast {
            if !gain.is_finite() || gain <= 0.0 {
                return Err(AppError::Config(format!(
                    "contrast gain must be finite and greater than 0, got {}",
                    gain
                )));
            }
        }
        Ok(())
    }
}

/// Result of the bounded downscale operation.
#[derive(Debug, Clone)]
pub struct ScaledImageResult {
    /// The scaled image
    pub image: DynamicImage,
    /// Original image dimensions (width, height)
    pub original_dimensions: (u32, u32),
    /// New image dimensions (width, height)
    pub new_dimensions: (u32, u32),
    /// Scale factor applied (1.0 when no scaling was needed)
    pub scale_factor: f32,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of grayscale conversion.
#[derive(Debug, Clone)]
pub struct GrayscaleImageResult {
    /// The grayscale image
    pub image: DynamicImage,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of contrast enhancement.
#[derive(Debug, Clone)]
pub struct ContrastImageResult {
    /// The contrast-enhanced image
    pub image: DynamicImage,
    /// Mode that was applied
    pub mode: ContrastMode,
    /// Cutoff used when binarizing (fixed or Otsu-selected)
    pub threshold: Option<u8>,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of the full preprocessing pipeline.
#[derive(Debug, Clone)]
pub struct PreprocessedImageResult {
    /// The preprocessed image ready for OCR
    pub image: DynamicImage,
    /// Original image dimensions before preprocessing
    pub original_dimensions: (u32, u32),
    /// Final image dimensions after preprocessing
    pub final_dimensions: (u32, u32),
    /// Scale factor applied during the downscale step (1.0 when skipped)
    pub scale_factor: f32,
    /// Cutoff used for binarization, when a binarizing mode ran
    pub threshold: Option<u8>,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}
