//! # OCR Engine Module
//!
//! This module defines the seam between the scan pipeline and the text
//! recognition engine, plus the Tesseract-backed implementation used in
//! production. The engine is a black box to the rest of the pipeline: it
//! receives an encoded image and returns raw text with an optional
//! confidence. Engine construction is separated from recognition so load
//! failures surface distinctly from recognition failures.

use std::fmt;

use leptess::LepTess;
use tracing::{debug, info};

use crate::scan_config::EngineConfig;

/// Raw engine output for one recognition call
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    /// Recognized text, untrimmed
    pub text: String,
    /// Engine-reported mean confidence in [0, 1], when available
    pub confidence: Option<f32>,
}

/// Errors produced at the engine seam
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Engine construction/warm-up failed
    Load(String),
    /// The engine ran but recognition failed
    Recognition(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Load(msg) => write!(f, "[ENGINE_LOAD] Engine failed to load: {}", msg),
            EngineError::Recognition(msg) => {
                write!(f, "[ENGINE_RECOGNIZE] Recognition failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// A text recognition engine.
///
/// Implementations are not assumed reentrant: the engine manager serializes
/// all calls through a single instance.
pub trait RecognitionEngine: Send {
    /// Engine identifier for logs
    fn name(&self) -> &'static str;

    /// Recognize text in an encoded (PNG/JPEG) image.
    fn recognize(&mut self, image: &[u8]) -> Result<Recognition, EngineError>;
}

/// Tesseract-backed recognition engine
pub struct TesseractEngine {
    tess: LepTess,
}

impl TesseractEngine {
    /// Initialize Tesseract with the given engine options.
    ///
    /// Construction performs the engine's slow warm-up/load phase; callers
    /// go through the engine manager so it happens lazily and at most once.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        info!(
            languages = %config.languages,
            psm = config.psm.as_str(),
            "Initializing Tesseract engine"
        );

        let mut tess = LepTess::new(config.tessdata_path.as_deref(), &config.languages)
            .map_err(|e| EngineError::Load(format!("Failed to initialize Tesseract: {}", e)))?;

        tess.set_variable(leptess::Variable::TesseditPagesegMode, config.psm.as_str())
            .map_err(|e| EngineError::Load(format!("Failed to set PSM mode: {}", e)))?;

        if let Some(whitelist) = &config.char_whitelist {
            tess.set_variable(leptess::Variable::TesseditCharWhitelist, whitelist)
                .map_err(|e| EngineError::Load(format!("Failed to set character whitelist: {}", e)))?;
        }

        if config.preserve_interword_spaces {
            tess.set_variable(leptess::Variable::PreserveInterwordSpaces, "1")
                .map_err(|e| {
                    EngineError::Load(format!("Failed to set interword space preservation: {}", e))
                })?;
        }

        Ok(Self { tess })
    }
}

impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&mut self, image: &[u8]) -> Result<Recognition, EngineError> {
        self.tess
            .set_image_from_mem(image)
            .map_err(|e| EngineError::Recognition(format!("Failed to load image: {}", e)))?;

        let text = self
            .tess
            .get_utf8_text()
            .map_err(|e| EngineError::Recognition(format!("Failed to extract text: {}", e)))?;

        let confidence = self.tess.mean_text_conf();
        let confidence = (confidence >= 0).then(|| confidence as f32 / 100.0);

        debug!(
            characters = text.len(),
            confidence = ?confidence,
            "Tesseract recognition completed"
        );
        Ok(Recognition { text, confidence })
    }
}
