//! # Plate Scan Module
//!
//! This module drives the recognition pipeline for a selected photo:
//! preprocess → OCR engine → normalize → format, and writes the result back
//! onto the photo record.
//!
//! ## Processing Algorithm
//!
//! ```text
//! 1. Single-flight check
//!    - At most one scan per session may be in flight; re-entrant
//!      requests are rejected fast with ScanError::Busy
//!
//! 2. Snapshot
//!    - The photo's encoded bytes and the session generation are read
//!      under the session lock, then the lock is dropped for the slow part
//!
//! 3. Preprocess + recognize (retry loop for transient engine failures)
//!    - The engine call runs on a blocking task under a caller-supplied
//!      timeout; exceeding it is ScanTimeout, empty output is NoTextDetected
//!
//! 4. Normalize + format
//!    - Formatted text becomes the canonical result; unformatted text is
//!      returned as-is rather than discarded
//!
//! 5. Write-back
//!    - The generation and the photo's existence are re-checked under the
//!      session lock; a session torn down mid-scan gets ScanError::Canceled
//!      and no mutation
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::engine::Recognition;
use crate::engine_manager::{EngineHandle, EngineManager, EngineState};
use crate::errors::{error_logging, AppResult};
use crate::normalize::Normalizer;
use crate::plate_format::{CanonicalPlate, PlateFormatter};
use crate::preprocessing;
use crate::scan_config::{RecoveryConfig, ScanConfig};
use crate::scan_errors::ScanError;
use crate::session::{PhotoId, SharedSession};

/// Successful scan result
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Normalized text matched a plate pattern
    Plate(CanonicalPlate),
    /// Recognized text fits no known plate shape; the normalized text is
    /// preserved as a best-effort result
    Unformatted(String),
}

impl ScanOutcome {
    /// The text written back onto the photo record
    pub fn text(&self) -> &str {
        match self {
            ScanOutcome::Plate(plate) => &plate.text,
            ScanOutcome::Unformatted(text) => text,
        }
    }

    pub fn is_plate(&self) -> bool {
        matches!(self, ScanOutcome::Plate(_))
    }
}

/// Recognition pipeline coordinator
///
/// Owns the engine manager, the normalizer, and the plate formatter, and
/// enforces the single-flight rule: the shared engine is never invoked
/// concurrently for the same session.
pub struct ScanCoordinator {
    config: ScanConfig,
    manager: Arc<EngineManager>,
    normalizer: Normalizer,
    formatter: PlateFormatter,
    in_flight: AtomicBool,
}

impl ScanCoordinator {
    /// Create a coordinator backed by the Tesseract engine
    pub fn new(config: ScanConfig) -> AppResult<Self> {
        let manager = Arc::new(EngineManager::tesseract(config.engine.clone()));
        Self::with_manager(config, manager)
    }

    /// Create a coordinator over an explicit engine manager (used by tests
    /// and alternative engine backends)
    pub fn with_manager(config: ScanConfig, manager: Arc<EngineManager>) -> AppResult<Self> {
        config.validate()?;
        let normalizer = Normalizer::with_config(config.normalizer.clone())?;
        Ok(Self {
            config,
            manager,
            normalizer,
            formatter: PlateFormatter::new(),
            in_flight: AtomicBool::new(false),
        })
    }

    /// Load state of the shared engine
    pub fn engine_state(&self) -> EngineState {
        self.manager.state()
    }

    /// Clear a failed engine load so the next scan retries it
    pub fn retry_engine_load(&self) {
        self.manager.retry_load();
    }

    /// Drop the engine instance (e.g. on session teardown)
    pub fn teardown_engine(&self) {
        self.manager.teardown();
    }

    /// Scan one photo and write the recognized plate text onto it.
    ///
    /// Returns the canonical plate when a pattern matched, the normalized
    /// text otherwise. Rejected with [`ScanError::Busy`] while another scan
    /// is in flight; returns [`ScanError::Canceled`] without mutating
    /// anything when the session is reset (or the photo deleted) mid-scan.
    pub async fn scan(
        &self,
        session: &SharedSession,
        photo_id: PhotoId,
    ) -> Result<ScanOutcome, ScanError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ScanError::Busy);
        }
        let _flight = FlightGuard(&self.in_flight);

        let start_time = Instant::now();

        // Snapshot the target under the session lock, then release it for
        // the slow pipeline stages.
        let (image_bytes, generation) = {
            let session = session.lock();
            let photo = session
                .photo(photo_id)
                .ok_or(ScanError::PhotoMissing(photo_id))?;
            (photo.image_bytes.clone(), session.generation())
        };

        info!(photo_id = %photo_id, bytes = image_bytes.len(), "Starting plate scan");

        let engine_png = self.preprocess_for_engine(&image_bytes)?;

        // Engine warm-up happens off the async threads; a failed load fails
        // fast here until retry_engine_load() clears it.
        let manager = Arc::clone(&self.manager);
        let engine = tokio::task::spawn_blocking(move || manager.ensure_loaded())
            .await
            .map_err(|e| ScanError::Extraction(format!("engine load task failed: {}", e)))?
            .map_err(ScanError::from)?;

        let recognition = self.recognize_with_retry(&engine, &engine_png).await?;

        let trimmed = recognition.text.trim();
        if trimmed.is_empty() {
            warn!(photo_id = %photo_id, "Engine returned no text");
            return Err(ScanError::NoText);
        }

        let normalized = self.normalizer.normalize(trimmed);
        if normalized.is_empty() {
            warn!(photo_id = %photo_id, raw = %trimmed, "Nothing left after normalization");
            return Err(ScanError::NoText);
        }

        let outcome = match self.formatter.format(&normalized) {
            Some(plate) => ScanOutcome::Plate(plate),
            None => ScanOutcome::Unformatted(normalized),
        };

        // Re-check liveness before mutating the session: a reset mid-scan
        // must not have its discarded photos written to.
        {
            let mut session = session.lock();
            if session.generation() != generation {
                return Err(ScanError::Canceled(
                    "session reset while the scan was in flight".to_string(),
                ));
            }
            if !session.apply_scan_result(photo_id, outcome.text()) {
                return Err(ScanError::Canceled(format!(
                    "{} was deleted while the scan was in flight",
                    photo_id
                )));
            }
        }

        info!(
            photo_id = %photo_id,
            outcome = outcome.text(),
            matched = outcome.is_plate(),
            confidence = ?recognition.confidence,
            total_ms = start_time.elapsed().as_millis() as u64,
            "Plate scan completed"
        );
        Ok(outcome)
    }

    /// Decode the stored still, run the preprocessing pipeline, and encode
    /// the result for the engine.
    fn preprocess_for_engine(&self, image_bytes: &[u8]) -> Result<Vec<u8>, ScanError> {
        let decoded = image::load_from_memory(image_bytes)
            .map_err(|e| ScanError::Extraction(format!("failed to decode still: {}", e)))?;

        let processed = preprocessing::preprocess(&decoded, &self.config.preprocess);
        debug!(
            original_dims = ?processed.original_dimensions,
            final_dims = ?processed.final_dimensions,
            threshold = ?processed.threshold,
            preprocess_ms = processed.processing_time_ms,
            "Preprocessing completed"
        );

        let mut png = Vec::new();
        processed
            .image
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| ScanError::Extraction(format!("failed to encode engine input: {}", e)))?;
        Ok(png)
    }

    /// Run the engine under the configured timeout, retrying transient
    /// extraction failures with exponential backoff.
    async fn recognize_with_retry(
        &self,
        engine: &EngineHandle,
        image: &[u8],
    ) -> Result<Recognition, ScanError> {
        let max_attempts = self.config.recovery.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.recognize_once(engine, image).await {
                Ok(recognition) => {
                    if attempt > 1 {
                        info!(attempt, "Recognition succeeded after retry");
                    }
                    return Ok(recognition);
                }
                // Timeouts and load failures are surfaced immediately; only
                // transient extraction failures are worth retrying.
                Err(err @ ScanError::Timeout(_)) | Err(err @ ScanError::EngineLoad(_)) => {
                    return Err(err)
                }
                Err(err) => {
                    if attempt >= max_attempts {
                        error_logging::log_scan_error(
                            &err,
                            "recognize_with_retry",
                            None,
                            Some(image.len()),
                            None,
                        );
                        return Err(err);
                    }
                    let delay_ms = calculate_retry_delay(attempt, &self.config.recovery);
                    warn!(attempt, delay_ms, error = %err, "Recognition attempt failed; retrying");
                    tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    /// One engine invocation on a blocking task, bounded by the scan timeout.
    async fn recognize_once(
        &self,
        engine: &EngineHandle,
        image: &[u8],
    ) -> Result<Recognition, ScanError> {
        let timeout = tokio::time::Duration::from_millis(self.config.recovery.scan_timeout_ms);
        let engine = Arc::clone(engine);
        let image = image.to_vec();

        let ocr_start = Instant::now();
        let result = tokio::time::timeout(
            timeout,
            tokio::task::spawn_blocking(move || {
                let mut engine = engine.lock().expect("Failed to acquire engine lock");
                engine.recognize(&image)
            }),
        )
        .await;

        let ocr_ms = ocr_start.elapsed().as_millis() as u64;
        match result {
            Ok(Ok(Ok(recognition))) => {
                debug!(
                    ocr_ms,
                    characters = recognition.text.len(),
                    "Engine invocation completed"
                );
                Ok(recognition)
            }
            Ok(Ok(Err(err))) => {
                warn!(ocr_ms, error = %err, "Engine invocation failed");
                Err(err.into())
            }
            Ok(Err(join_err)) => Err(ScanError::Extraction(format!(
                "engine task failed: {}",
                join_err
            ))),
            Err(_) => {
                warn!(
                    ocr_ms,
                    limit_ms = self.config.recovery.scan_timeout_ms,
                    "Engine invocation timed out"
                );
                Err(ScanError::Timeout(format!(
                    "engine exceeded {}ms",
                    self.config.recovery.scan_timeout_ms
                )))
            }
        }
    }
}

struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Calculate retry delay with exponential backoff and jitter
///
/// `delay = min(base_delay * 2^(attempt-1), max_delay)` plus a random
/// jitter of up to a quarter of the delay.
pub fn calculate_retry_delay(attempt: u32, recovery: &RecoveryConfig) -> u64 {
    #[allow(clippy::cast_precision_loss)]
    let base_delay = recovery.base_retry_delay_ms as f64;

    #[allow(clippy::cast_precision_loss)]
    let exponential_delay = base_delay * (2.0_f64).powf(f64::from(attempt.saturating_sub(1)));

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let delay = exponential_delay.min(recovery.max_retry_delay_ms as f64) as u64;

    // Jitter ceiling stays at least 1 so the modulus is never zero
    let jitter = rand::random::<u64>() % (delay / 4).max(1);
    delay + jitter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_progression() {
        let recovery = RecoveryConfig {
            max_retries: 3,
            base_retry_delay_ms: 100,
            max_retry_delay_ms: 300,
            ..Default::default()
        };

        let first = calculate_retry_delay(1, &recovery);
        assert!((100..=125).contains(&first));

        let second = calculate_retry_delay(2, &recovery);
        assert!((200..=250).contains(&second));

        // Capped at max_retry_delay_ms plus jitter
        let fifth = calculate_retry_delay(5, &recovery);
        assert!((300..=375).contains(&fifth));
    }

    #[test]
    fn test_retry_delay_tiny_base_does_not_panic() {
        let recovery = RecoveryConfig {
            max_retries: 1,
            base_retry_delay_ms: 1,
            max_retry_delay_ms: 2,
            ..Default::default()
        };
        let delay = calculate_retry_delay(1, &recovery);
        assert!(delay >= 1);
    }

    #[test]
    fn test_outcome_text() {
        let outcome = ScanOutcome::Unformatted("HR26XYZ".to_string());
        assert_eq!(outcome.text(), "HR26XYZ");
        assert!(!outcome.is_plate());
    }
}
