//! # Capture Session Module
//!
//! This module owns the camera lifecycle and the in-memory photo collection.
//! A session is a small state machine (`Idle → Streaming → (Capturing) →
//! Streaming → Idle`, with `Error` reachable from failed acquisitions) that
//! holds at most one live stream handle, appends captured stills in capture
//! order, and maintains the gallery selection cursor.
//!
//! ## Features
//!
//! - Exclusive ownership of the video stream handle (never two live handles)
//! - Facing-mode switching with remembered fallback on re-open failure
//! - Bounded photo collection (configurable capacity, 0 = unbounded)
//! - Selection cursor that stays valid across deletions

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::DynamicImage;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::camera::{DeviceError, FacingMode, StreamConstraints, StreamHandle, VideoSource};
use crate::errors::{AppError, AppResult};

// Constants for session configuration
pub const DEFAULT_CAPACITY: usize = 4;
pub const DEFAULT_IDEAL_WIDTH: u32 = 1280;
pub const DEFAULT_IDEAL_HEIGHT: u32 = 720;
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// A capture session shared across the UI layer and the scan coordinator
pub type SharedSession = Arc<Mutex<CaptureSession>>;

/// Configuration for a capture session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum number of photos held by the session (0 = unbounded)
    pub capacity: usize,
    /// Facing mode used by `open` when none is given explicitly
    pub facing: FacingMode,
    /// Ideal stream width hint passed to the device
    pub ideal_width: u32,
    /// Ideal stream height hint passed to the device
    pub ideal_height: u32,
    /// JPEG quality used when encoding captured stills
    pub jpeg_quality: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            facing: FacingMode::default(),
            ideal_width: DEFAULT_IDEAL_WIDTH,
            ideal_height: DEFAULT_IDEAL_HEIGHT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl SessionConfig {
    /// Validate session configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        if self.ideal_width == 0 {
            return Err(AppError::Config(
                "ideal_width must be greater than 0".to_string(),
            ));
        }
        if self.ideal_height == 0 {
            return Err(AppError::Config(
                "ideal_height must be greater than 0".to_string(),
            ));
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(AppError::Config(format!(
                "jpeg_quality must be in 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    fn constraints(&self, facing: FacingMode) -> StreamConstraints {
        StreamConstraints {
            facing,
            ideal_width: self.ideal_width,
            ideal_height: self.ideal_height,
        }
    }
}

/// Unique identifier of a captured photo, monotonic within a session's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhotoId(pub u64);

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "photo-{}", self.0)
    }
}

/// A captured still owned by the session
#[derive(Debug, Clone)]
pub struct Photo {
    /// Unique id within the session lifetime
    pub id: PhotoId,
    /// Encoded still (quality-configured JPEG)
    pub image_bytes: Vec<u8>,
    /// UTC capture timestamp
    pub timestamp_utc: DateTime<Utc>,
    /// Recognized plate text; absent until scanned, set by explicit scan or user edit
    pub extracted_text: Option<String>,
}

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No stream bound
    #[default]
    Idle,
    /// Stream bound and delivering frames
    Streaming,
    /// A frame read is in progress
    Capturing,
    /// Stream acquisition failed; retriable
    Error,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Streaming => "streaming",
            SessionState::Capturing => "capturing",
            SessionState::Error => "error",
        }
    }
}

/// Errors produced by capture-session operations
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The underlying video device failed
    Device(DeviceError),
    /// Capture rejected: wrong state or capacity reached. No state change.
    CaptureUnavailable(String),
    /// Still encoding failed
    Encode(String),
    /// The referenced photo is not in the collection
    UnknownPhoto(PhotoId),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Device(err) => write!(f, "{}", err),
            SessionError::CaptureUnavailable(msg) => {
                write!(f, "[CAPTURE_UNAVAILABLE] {}", msg)
            }
            SessionError::Encode(msg) => write!(f, "[CAPTURE_ENCODE] Still encoding failed: {}", msg),
            SessionError::UnknownPhoto(id) => write!(f, "[CAPTURE_TARGET] Unknown photo: {}", id),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<DeviceError> for SessionError {
    fn from(err: DeviceError) -> Self {
        SessionError::Device(err)
    }
}

/// Capture session state machine
///
/// Owns the video source, the live stream handle, and the photo collection.
/// All mutating operations take `&mut self`; sharing across the UI layer and
/// the scan coordinator goes through [`SharedSession`], whose lock provides
/// the external serialization required for `open`/`close`/`switch_facing`.
pub struct CaptureSession {
    source: Box<dyn VideoSource>,
    config: SessionConfig,
    state: SessionState,
    facing: FacingMode,
    stream: Option<Box<dyn StreamHandle>>,
    /// Insertion order is capture order, most recent last
    photos: Vec<Photo>,
    cursor: Option<usize>,
    next_photo_id: u64,
    /// Bumped on `reset`; lets an in-flight scan detect teardown before write-back
    generation: u64,
    /// Facing mode that last streamed successfully, kept for `retry` after a failed switch
    last_good_facing: Option<FacingMode>,
}

impl CaptureSession {
    /// Create a session over a video source with the given configuration
    pub fn new(source: Box<dyn VideoSource>, config: SessionConfig) -> AppResult<Self> {
        config.validate()?;
        let facing = config.facing;
        Ok(Self {
            source,
            config,
            state: SessionState::Idle,
            facing,
            stream: None,
            photos: Vec::new(),
            cursor: None,
            next_photo_id: 0,
            generation: 0,
            last_good_facing: None,
        })
    }

    /// Wrap a new session for shared use
    pub fn shared(source: Box<dyn VideoSource>, config: SessionConfig) -> AppResult<SharedSession> {
        Ok(Arc::new(Mutex::new(Self::new(source, config)?)))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn photo(&self, id: PhotoId) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == id)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn selected_photo(&self) -> Option<&Photo> {
        self.cursor.and_then(|i| self.photos.get(i))
    }

    /// Teardown epoch; bumped by `reset`
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Acquire a stream for `facing` and enter Streaming.
    ///
    /// Any previously bound handle is fully released before the new
    /// acquisition, so the session never holds two device handles. On
    /// acquisition failure the session enters the Error state and the error
    /// is returned for the caller to surface.
    pub fn open(&mut self, facing: FacingMode) -> Result<(), SessionError> {
        self.release_stream();

        match self.source.open(&self.config.constraints(facing)) {
            Ok(handle) => {
                info!(facing = facing.as_str(), "Video stream acquired");
                self.stream = Some(handle);
                self.facing = facing;
                self.last_good_facing = Some(facing);
                self.state = SessionState::Streaming;
                Ok(())
            }
            Err(err) => {
                crate::errors::error_logging::log_device_error(
                    &err,
                    "open",
                    Some(facing.as_str()),
                );
                self.facing = facing;
                self.state = SessionState::Error;
                Err(SessionError::Device(err))
            }
        }
    }

    /// Release the stream and return to Idle. No-op when already Idle.
    pub fn close(&mut self) {
        if self.state == SessionState::Idle && self.stream.is_none() {
            return;
        }
        self.release_stream();
        self.state = SessionState::Idle;
        info!("Capture session closed");
    }

    /// Release the current stream, flip the facing mode, and re-open.
    ///
    /// If the re-open fails the session enters Error and the pre-switch
    /// facing mode stays remembered in `last_good_facing` for [`retry`].
    ///
    /// [`retry`]: CaptureSession::retry
    pub fn switch_facing(&mut self) -> Result<(), SessionError> {
        let previous = self.facing;
        let target = previous.flipped();
        debug!(
            from = previous.as_str(),
            to = target.as_str(),
            "Switching camera facing"
        );

        self.release_stream();
        match self.source.open(&self.config.constraints(target)) {
            Ok(handle) => {
                info!(facing = target.as_str(), "Video stream acquired");
                self.stream = Some(handle);
                self.facing = target;
                self.last_good_facing = Some(target);
                self.state = SessionState::Streaming;
                Ok(())
            }
            Err(err) => {
                warn!(
                    facing = target.as_str(),
                    error = %err,
                    "Facing switch failed; previous facing remembered for retry"
                );
                self.facing = target;
                self.last_good_facing = Some(previous);
                self.state = SessionState::Error;
                Err(SessionError::Device(err))
            }
        }
    }

    /// Retry stream acquisition after an Error, preferring the facing mode
    /// that last streamed successfully.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        let facing = self.last_good_facing.unwrap_or(self.facing);
        self.open(facing)
    }

    /// Read one frame from the bound stream and append it as a Photo.
    ///
    /// Valid only in Streaming; rejected synchronously with
    /// [`SessionError::CaptureUnavailable`] (and no state change) when the
    /// session is Idle/Error or the capacity bound is reached. Captures are
    /// serialized through the `&mut self` borrow and the transient Capturing
    /// state, so no two captures can read a partial frame concurrently.
    pub fn capture(&mut self) -> Result<PhotoId, SessionError> {
        if self.state != SessionState::Streaming {
            return Err(SessionError::CaptureUnavailable(format!(
                "cannot capture while {}",
                self.state.as_str()
            )));
        }
        if self.config.capacity != 0 && self.photos.len() >= self.config.capacity {
            return Err(SessionError::CaptureUnavailable(format!(
                "photo capacity reached ({})",
                self.config.capacity
            )));
        }

        self.state = SessionState::Capturing;
        let frame = match self
            .stream
            .as_mut()
            .expect("Streaming state implies a bound stream")
            .current_frame()
        {
            Ok(frame) => frame,
            Err(err) => {
                // The stream may still be healthy; only acquisition failures
                // move the session to Error.
                self.state = SessionState::Streaming;
                crate::errors::error_logging::log_device_error(
                    &err,
                    "capture",
                    Some(self.facing.as_str()),
                );
                return Err(SessionError::Device(err));
            }
        };

        let encoded = match encode_jpeg(&frame, self.config.jpeg_quality) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.state = SessionState::Streaming;
                return Err(err);
            }
        };

        let id = PhotoId(self.next_photo_id);
        self.next_photo_id += 1;
        self.photos.push(Photo {
            id,
            image_bytes: encoded,
            timestamp_utc: Utc::now(),
            extracted_text: None,
        });
        self.cursor = Some(self.photos.len() - 1);
        self.state = SessionState::Streaming;

        info!(
            photo_id = %id,
            photo_count = self.photos.len(),
            "Captured still"
        );
        Ok(id)
    }

    /// Remove a photo; the cursor is re-clamped to the previous index, or
    /// cleared when the collection becomes empty.
    pub fn delete(&mut self, id: PhotoId) -> Result<(), SessionError> {
        let index = self
            .photos
            .iter()
            .position(|p| p.id == id)
            .ok_or(SessionError::UnknownPhoto(id))?;
        self.photos.remove(index);

        self.cursor = match self.cursor {
            None => None,
            Some(_) if self.photos.is_empty() => None,
            Some(cur) if index < cur => Some(cur - 1),
            Some(cur) if index == cur => Some(index.saturating_sub(1).min(self.photos.len() - 1)),
            Some(cur) => Some(cur.min(self.photos.len() - 1)),
        };

        debug!(photo_id = %id, photo_count = self.photos.len(), "Deleted photo");
        Ok(())
    }

    /// Clear all photos, release any active stream, and return to Idle.
    /// Bumps the scan generation so in-flight scans discard their results.
    pub fn reset(&mut self) {
        self.release_stream();
        self.photos.clear();
        self.cursor = None;
        self.state = SessionState::Idle;
        self.generation += 1;
        info!(generation = self.generation, "Capture session reset");
    }

    /// Move the selection cursor to the photo with `id`
    pub fn select(&mut self, id: PhotoId) -> Result<(), SessionError> {
        let index = self
            .photos
            .iter()
            .position(|p| p.id == id)
            .ok_or(SessionError::UnknownPhoto(id))?;
        self.cursor = Some(index);
        Ok(())
    }

    /// Advance the cursor toward the most recent photo (saturating)
    pub fn select_next(&mut self) {
        if let Some(cur) = self.cursor {
            self.cursor = Some((cur + 1).min(self.photos.len().saturating_sub(1)));
        }
    }

    /// Move the cursor toward the oldest photo (saturating)
    pub fn select_prev(&mut self) {
        if let Some(cur) = self.cursor {
            self.cursor = Some(cur.saturating_sub(1));
        }
    }

    /// Explicit user correction of a photo's extracted text.
    pub fn edit_extracted_text(
        &mut self,
        id: PhotoId,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        let photo = self
            .photos
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(SessionError::UnknownPhoto(id))?;
        photo.extracted_text = Some(text.into());
        Ok(())
    }

    /// Write a scan result onto the target photo. Returns `false` when the
    /// photo no longer exists (deleted while the scan was in flight).
    pub(crate) fn apply_scan_result(&mut self, id: PhotoId, text: &str) -> bool {
        match self.photos.iter_mut().find(|p| p.id == id) {
            Some(photo) => {
                photo.extracted_text = Some(text.to_string());
                true
            }
            None => false,
        }
    }

    fn release_stream(&mut self) {
        if let Some(mut handle) = self.stream.take() {
            handle.release();
            debug!("Video stream released");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release_stream();
    }
}

/// Encode a frame as a JPEG still at the configured quality
fn encode_jpeg(frame: &DynamicImage, quality: u8) -> Result<Vec<u8>, SessionError> {
    let mut bytes = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality);
    frame
        .write_with_encoder(encoder)
        .map_err(|e| SessionError::Encode(e.to_string()))?;
    Ok(bytes)
}
