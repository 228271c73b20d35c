//! # Scan Configuration Module
//!
//! This module defines configuration structures for the recognition
//! pipeline: the explicit OCR engine options (replacing the loose options
//! objects the duplicated UIs passed around), recovery settings, and the
//! aggregate scan configuration.

use crate::errors::{AppError, AppResult};
use crate::normalize::NormalizerConfig;
use crate::preprocessing::PreprocessOptions;

// Constants for scan configuration
pub const DEFAULT_LANGUAGES: &str = "eng";
pub const DEFAULT_CHAR_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const DEFAULT_SCAN_TIMEOUT_MS: u64 = 15_000;

/// Recovery configuration for error handling
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryConfig {
    /// Maximum number of retry attempts for transient extraction failures
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
    /// Upper bound for a single engine invocation in milliseconds
    pub scan_timeout_ms: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_retry_delay_ms: 250,
            max_retry_delay_ms: 2000,
            scan_timeout_ms: DEFAULT_SCAN_TIMEOUT_MS,
        }
    }
}

impl RecoveryConfig {
    /// Validate recovery configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        if self.base_retry_delay_ms == 0 {
            return Err(AppError::Config(
                "base_retry_delay_ms must be greater than 0".to_string(),
            ));
        }
        if self.max_retry_delay_ms < self.base_retry_delay_ms {
            return Err(AppError::Config(format!(
                "max_retry_delay_ms ({}) must be >= base_retry_delay_ms ({})",
                self.max_retry_delay_ms, self.base_retry_delay_ms
            )));
        }
        if self.scan_timeout_ms == 0 {
            return Err(AppError::Config(
                "scan_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Page Segmentation Mode for Tesseract OCR
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageSegMode {
    /// Orientation and script detection (OSD) only
    OsdOnly = 0,
    /// Automatic page segmentation with OSD
    AutoOsd = 1,
    /// Automatic page segmentation, no OSD
    AutoNoOsd = 2,
    /// Fully automatic page segmentation
    Auto = 3,
    /// Assume a single column of text
    SingleColumn = 4,
    /// Assume a single uniform block of vertically aligned text
    SingleBlockVert = 5,
    /// Assume a single uniform block of text
    SingleBlock = 6,
    /// Treat the image as a single text line (a plate strip)
    #[default]
    SingleLine = 7,
    /// Treat the image as a single word
    SingleWord = 8,
    /// Treat the image as a single word in a circle
    WordInCircle = 9,
    /// Treat the image as a single character
    SingleChar = 10,
    /// Find as much text as possible in no particular order
    SparseText = 11,
    /// Sparse text with OSD
    SparseTextOsd = 12,
    /// Treat the image as a single text line, bypassing Tesseract-specific hacks
    RawLine = 13,
}

impl PageSegMode {
    /// Convert PSM mode to string value for Tesseract
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSegMode::OsdOnly => "0",
            PageSegMode::AutoOsd => "1",
            PageSegMode::AutoNoOsd => "2",
            PageSegMode::Auto => "3",
            PageSegMode::SingleColumn => "4",
            PageSegMode::SingleBlockVert => "5",
            PageSegMode::SingleBlock => "6",
            PageSegMode::SingleLine => "7",
            PageSegMode::SingleWord => "8",
            PageSegMode::WordInCircle => "9",
            PageSegMode::SingleChar => "10",
            PageSegMode::SparseText => "11",
            PageSegMode::SparseTextOsd => "12",
            PageSegMode::RawLine => "13",
        }
    }
}

/// Explicit OCR engine options
///
/// The recognized options are enumerated here instead of travelling as
/// untyped key/value bags: the character whitelist, the page segmentation
/// mode, and inter-word space preservation.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// OCR language codes (e.g., "eng")
    pub languages: String,
    /// Character whitelist restricting engine output to plate characters
    pub char_whitelist: Option<String>,
    /// Page segmentation mode for the plate strip
    pub psm: PageSegMode,
    /// Keep inter-word spaces in the engine output
    pub preserve_interword_spaces: bool,
    /// Optional tessdata directory override
    pub tessdata_path: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            languages: DEFAULT_LANGUAGES.to_string(),
            char_whitelist: Some(DEFAULT_CHAR_WHITELIST.to_string()),
            psm: PageSegMode::default(),
            preserve_interword_spaces: false,
            tessdata_path: None,
        }
    }
}

impl EngineConfig {
    /// Validate engine configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        if self.languages.trim().is_empty() {
            return Err(AppError::Config("languages cannot be empty".to_string()));
        }
        if let Some(whitelist) = &self.char_whitelist {
            if whitelist.trim().is_empty() {
                return Err(AppError::Config(
                    "char_whitelist cannot be empty if provided".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Aggregate configuration for the recognition pipeline
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// OCR engine options
    pub engine: EngineConfig,
    /// Preprocessing options applied before the engine runs
    pub preprocess: PreprocessOptions,
    /// Text normalization options
    pub normalizer: NormalizerConfig,
    /// Recovery and timeout configuration
    pub recovery: RecoveryConfig,
}

impl ScanConfig {
    /// Validate all nested configuration
    pub fn validate(&self) -> AppResult<()> {
        self.engine.validate()?;
        self.preprocess.validate()?;
        self.normalizer.validate()?;
        self.recovery.validate()?;
        Ok(())
    }
}
