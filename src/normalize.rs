//! # Plate Text Normalization Module
//!
//! This module cleans raw OCR output into the canonical character set used
//! by the plate format matcher: uppercase, `[A-Z0-9]` only (optionally with
//! collapsed single spaces for pattern segmentation), followed by a fixed,
//! ordered table of confusion corrections for characters the OCR engine
//! commonly misreads.
//!
//! The confusion substitutions are applied globally and unconditionally.
//! They are a heuristic, not context-aware: a letter legitimately meant to
//! be `O`, `I`, `Z` or `S` is indistinguishable from a misread digit here.
//! The precision/recall tradeoff is pinned by tests rather than patched.

use tracing::debug;

use crate::errors::{AppError, AppResult};

/// One confusion-correction substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfusionRule {
    /// Character the engine reported
    pub from: char,
    /// Character it is rewritten to
    pub to: char,
}

/// Basic confusion table: letter/digit pairs misread on nearly every plate font
pub const BASIC_CONFUSIONS: &[ConfusionRule] = &[
    ConfusionRule { from: 'O', to: '0' },
    ConfusionRule { from: 'I', to: '1' },
];

/// Strict confusion table: the basic pairs plus the rarer `Z`/`S` misreads
pub const STRICT_CONFUSIONS: &[ConfusionRule] = &[
    ConfusionRule { from: 'O', to: '0' },
    ConfusionRule { from: 'I', to: '1' },
    ConfusionRule { from: 'Z', to: '2' },
    ConfusionRule { from: 'S', to: '5' },
];

/// Which confusion-correction table to apply
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConfusionSet {
    /// `O→0`, `I→1`
    #[default]
    Basic,
    /// `O→0`, `I→1`, `Z→2`, `S→5`
    Strict,
    /// Caller-supplied ordered table
    Custom(Vec<ConfusionRule>),
}

impl ConfusionSet {
    /// The ordered substitution table for this set
    pub fn rules(&self) -> &[ConfusionRule] {
        match self {
            ConfusionSet::Basic => BASIC_CONFUSIONS,
            ConfusionSet::Strict => STRICT_CONFUSIONS,
            ConfusionSet::Custom(rules) => rules,
        }
    }
}

/// Configuration options for text normalization
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizerConfig {
    /// Confusion-correction table to apply after charset filtering
    pub confusions: ConfusionSet,
    /// Keep whitespace (collapsed to single spaces) for pattern segmentation
    pub preserve_whitespace: bool,
}

impl NormalizerConfig {
    /// Validate normalizer configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        for rule in self.confusions.rules() {
            if !rule.from.is_ascii_uppercase() && !rule.from.is_ascii_digit() {
                return Err(AppError::Config(format!(
                    "confusion rule source '{}' is outside [A-Z0-9]",
                    rule.from
                )));
            }
            if !rule.to.is_ascii_uppercase() && !rule.to.is_ascii_digit() {
                return Err(AppError::Config(format!(
                    "confusion rule target '{}' is outside [A-Z0-9]",
                    rule.to
                )));
            }
        }
        Ok(())
    }
}

/// Plate text normalizer
///
/// Deterministic and pure: the same input always produces the same output,
/// no input ever fails, and the worst case is an empty string.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// Create a normalizer with the default configuration (basic confusion
    /// set, whitespace stripped)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a normalizer with custom configuration
    pub fn with_config(config: NormalizerConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize raw OCR text.
    ///
    /// Sequence: uppercase; drop characters outside `[A-Z0-9]` (whitespace
    /// survives as collapsed single spaces in the whitespace-preserving
    /// mode); apply the configured confusion table in order, globally.
    pub fn normalize(&self, raw: &str) -> String {
        let upper = raw.to_uppercase();

        let mut cleaned = String::with_capacity(upper.len());
        let mut pending_space = false;
        for ch in upper.chars() {
            if ch.is_ascii_uppercase() || ch.is_ascii_digit() {
                if pending_space && !cleaned.is_empty() {
                    cleaned.push(' ');
                }
                pending_space = false;
                cleaned.push(ch);
            } else if self.config.preserve_whitespace && ch.is_whitespace() {
                pending_space = true;
            }
        }

        let corrected: String = cleaned
            .chars()
            .map(|ch| {
                self.config
                    .confusions
                    .rules()
                    .iter()
                    .find(|rule| rule.from == ch)
                    .map_or(ch, |rule| rule.to)
            })
            .collect();

        if corrected != raw {
            debug!(
                raw_len = raw.len(),
                normalized_len = corrected.len(),
                "Normalized OCR text"
            );
        }
        corrected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uppercase_and_charset_filter() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize("hr-26.ab 1234"), "HR26AB1234");
        assert_eq!(normalizer.normalize("!@#$%^"), "");
        assert_eq!(normalizer.normalize(""), "");
    }

    #[test]
    fn test_whitespace_preserving_collapse() {
        let normalizer = Normalizer::with_config(NormalizerConfig {
            preserve_whitespace: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(normalizer.normalize("  hr  26\t ab\n1234  "), "HR 26 AB 1234");
        // Leading/trailing whitespace never survives
        assert_eq!(normalizer.normalize("   "), "");
    }

    #[test]
    fn test_confusion_rules_apply_in_order() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize("OIOI"), "0101");

        let strict = Normalizer::with_config(NormalizerConfig {
            confusions: ConfusionSet::Strict,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(strict.normalize("ZOSI"), "2051");
    }

    #[test]
    fn test_custom_rules_validated() {
        let config = NormalizerConfig {
            confusions: ConfusionSet::Custom(vec![ConfusionRule { from: 'é', to: 'E' }]),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = NormalizerConfig {
            confusions: ConfusionSet::Custom(vec![ConfusionRule { from: 'B', to: '8' }]),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
