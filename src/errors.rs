//! # Application Error Types
//!
//! This module defines common error types used throughout the plate-scan crate.
//! It provides structured error handling for the capture and recognition pipeline.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Validation errors (pattern tables, option structs, etc.)
    Validation(String),
    /// Camera/video-device errors
    Device(String),
    /// Capture session errors
    Capture(String),
    /// Scan pipeline errors
    Scan(String),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Validation(msg) => write!(f, "[VALIDATION] {}", msg),
            AppError::Device(msg) => write!(f, "[DEVICE] {}", msg),
            AppError::Capture(msg) => write!(f, "[CAPTURE] {}", msg),
            AppError::Scan(msg) => write!(f, "[SCAN] {}", msg),
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crate::scan_errors::ScanError> for AppError {
    fn from(err: crate::scan_errors::ScanError) -> Self {
        AppError::Scan(err.to_string())
    }
}

impl From<crate::camera::DeviceError> for AppError {
    fn from(err: crate::camera::DeviceError) -> Self {
        AppError::Device(err.to_string())
    }
}

impl From<crate::session::SessionError> for AppError {
    fn from(err: crate::session::SessionError) -> Self {
        AppError::Capture(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting across the pipeline
pub mod error_logging {
    use tracing::error;

    /// Log video-device errors with stream context
    pub fn log_device_error(
        error: &impl std::fmt::Display,
        operation: &str,
        facing: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            facing = ?facing,
            "Video device operation failed"
        );
    }

    /// Log capture-session errors with session context
    pub fn log_session_error(
        error: &impl std::fmt::Display,
        operation: &str,
        state: &str,
        photo_count: usize,
    ) {
        error!(
            error = %error,
            operation = %operation,
            state = %state,
            photo_count = %photo_count,
            "Capture session operation failed"
        );
    }

    /// Log scan pipeline errors with image and timing context
    pub fn log_scan_error(
        error: &impl std::fmt::Display,
        operation: &str,
        photo_id: Option<u64>,
        image_size: Option<usize>,
        processing_duration: Option<std::time::Duration>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            photo_id = ?photo_id,
            image_size_bytes = ?image_size,
            processing_duration_ms = ?processing_duration.map(|d| d.as_millis()),
            "Plate scan failed"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}
