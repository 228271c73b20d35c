//! # Video Source Abstraction
//!
//! This module defines the seam between the capture session and the platform
//! video-capture driver. The driver is an external collaborator: it exposes
//! stream acquisition, frame reads, and release, and nothing else. Concrete
//! backends (webcam, test fake) implement the traits defined here.

use std::fmt;

use image::DynamicImage;

/// Which way the active camera points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    /// Camera pointing toward the user
    Front,
    /// Camera pointing away from the user
    #[default]
    Back,
}

impl FacingMode {
    /// The opposite facing mode
    pub fn flipped(&self) -> Self {
        match self {
            FacingMode::Front => FacingMode::Back,
            FacingMode::Back => FacingMode::Front,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::Front => "front",
            FacingMode::Back => "back",
        }
    }
}

/// Constraints handed to the driver when acquiring a stream.
///
/// `ideal_width`/`ideal_height` are hints; the driver may deliver another
/// resolution and the pipeline downscales later as needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

/// Errors produced by the video device.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// No capture device is present for the requested facing mode
    NotFound(String),
    /// The user or platform denied access to the device
    PermissionDenied(String),
    /// The requested constraints cannot be satisfied by any device
    Unsatisfiable(String),
    /// The stream failed while reading a frame
    Stream(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NotFound(msg) => write!(f, "[DEVICE_NOT_FOUND] {}", msg),
            DeviceError::PermissionDenied(msg) => write!(f, "[DEVICE_DENIED] {}", msg),
            DeviceError::Unsatisfiable(msg) => {
                write!(f, "[DEVICE_CONSTRAINTS] Constraints unsatisfiable: {}", msg)
            }
            DeviceError::Stream(msg) => write!(f, "[DEVICE_STREAM] Stream failure: {}", msg),
        }
    }
}

impl std::error::Error for DeviceError {}

/// Handle to an acquired video stream.
///
/// Exactly one handle may be live per session; `release` must be idempotent
/// since the session calls it on every teardown path.
pub trait StreamHandle: Send {
    /// Read the current frame as a decoded image buffer.
    fn current_frame(&mut self) -> Result<DynamicImage, DeviceError>;

    /// Release the underlying device. Safe to call more than once.
    fn release(&mut self);
}

/// A video-capture device that can be opened with constraints.
pub trait VideoSource: Send {
    /// Acquire a stream satisfying `constraints`.
    ///
    /// Acquisition failures map to [`DeviceError::NotFound`],
    /// [`DeviceError::PermissionDenied`] or [`DeviceError::Unsatisfiable`].
    fn open(&mut self, constraints: &StreamConstraints)
        -> Result<Box<dyn StreamHandle>, DeviceError>;
}
