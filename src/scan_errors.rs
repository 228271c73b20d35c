//! # Scan Error Types Module
//!
//! This module defines the error types used by the recognition pipeline.
//! "No pattern matched" is deliberately absent: it is a valid scan outcome
//! carried in the result type, not an error.

use crate::engine::EngineError;
use crate::session::PhotoId;

/// Errors produced by the scan pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum ScanError {
    /// The OCR engine failed to initialize; fails fast until a retry succeeds
    EngineLoad(String),
    /// The engine ran but recognition itself failed
    Extraction(String),
    /// The engine ran and returned empty or whitespace-only text
    NoText,
    /// The engine exceeded the configured time bound
    Timeout(String),
    /// Another scan is already in flight for this session
    Busy,
    /// The session was torn down while the scan was in flight
    Canceled(String),
    /// The target photo is not in the session's collection
    PhotoMissing(PhotoId),
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::EngineLoad(msg) => {
                write!(f, "[ENGINE_LOAD] OCR engine initialization failed: {}", msg)
            }
            ScanError::Extraction(msg) => {
                write!(f, "[SCAN_EXTRACT] Text extraction failed: {}", msg)
            }
            ScanError::NoText => write!(
                f,
                "[SCAN_NO_TEXT] No text detected; retry with better framing"
            ),
            ScanError::Timeout(msg) => write!(f, "[SCAN_TIMEOUT] Scan timed out: {}", msg),
            ScanError::Busy => write!(f, "[SCAN_BUSY] A scan is already in flight"),
            ScanError::Canceled(msg) => write!(f, "[SCAN_CANCELED] Scan canceled: {}", msg),
            ScanError::PhotoMissing(id) => write!(f, "[SCAN_TARGET] Unknown photo: {}", id),
        }
    }
}

impl std::error::Error for ScanError {}

impl From<EngineError> for ScanError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Load(msg) => ScanError::EngineLoad(msg),
            EngineError::Recognition(msg) => ScanError::Extraction(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_tags() {
        assert!(ScanError::NoText.to_string().starts_with("[SCAN_NO_TEXT]"));
        assert!(ScanError::Busy.to_string().starts_with("[SCAN_BUSY]"));
        assert!(ScanError::Timeout("15000ms".to_string())
            .to_string()
            .starts_with("[SCAN_TIMEOUT]"));
    }

    #[test]
    fn test_engine_error_mapping() {
        let err: ScanError = EngineError::Load("missing tessdata".to_string()).into();
        assert!(matches!(err, ScanError::EngineLoad(_)));

        let err: ScanError = EngineError::Recognition("decode failed".to_string()).into();
        assert!(matches!(err, ScanError::Extraction(_)));
    }
}
