//! # Plate Format Validation Module
//!
//! This module matches normalized plate text against an ordered table of
//! plate-shape patterns and reformats matches into the canonical segmented
//! form. The table is data, not code: each entry pairs an anchored regex
//! (one capture group per semantic segment) with the segment role names,
//! and the ordered list can be replaced from a JSON config file without
//! touching the matching algorithm.
//!
//! Evaluation is first-match-wins over the ordered list, most specific
//! pattern first. "No match" is a valid outcome, not an error: callers fall
//! back to presenting the normalized-but-unformatted text.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};

/// A semantic segment of a matched plate (e.g. state code, serial number)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateSegment {
    /// Role name from the pattern table (`state`, `district`, `series`, ...)
    pub role: String,
    /// Matched text for this segment
    pub value: String,
}

/// Canonical formatted plate produced by a successful pattern match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPlate {
    /// Name of the winning pattern-table entry
    pub pattern: String,
    /// Semantic segments in pattern order
    pub segments: Vec<PlateSegment>,
    /// Space-joined canonical form, e.g. `"HR 26 AB 1234"`
    pub text: String,
}

/// One pattern-table entry as it appears in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternEntry {
    /// Entry name, used in logs and results
    pub name: String,
    /// Anchored regex with one capture group per segment
    pub pattern: String,
    /// Role name for each capture group, in order
    pub segments: Vec<String>,
}

/// Ordered plate-pattern table loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternTableConfig {
    pub patterns: Vec<PatternEntry>,
}

impl PatternTableConfig {
    /// Validate the pattern table configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.patterns.is_empty() {
            return Err(AppError::Config("pattern table cannot be empty".to_string()));
        }
        for (i, entry) in self.patterns.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(AppError::Config(format!("patterns[{}] name cannot be empty", i)));
            }
            if !entry.pattern.starts_with('^') || !entry.pattern.ends_with('$') {
                return Err(AppError::Config(format!(
                    "patterns[{}] '{}' must be anchored with ^ and $",
                    i, entry.name
                )));
            }
            let regex = Regex::new(&entry.pattern).map_err(|e| {
                AppError::Config(format!(
                    "patterns[{}] '{}' is not a valid regex: {}",
                    i, entry.name, e
                ))
            })?;
            if entry.segments.is_empty() {
                return Err(AppError::Config(format!(
                    "patterns[{}] '{}' must declare at least one segment",
                    i, entry.name
                )));
            }
            if regex.captures_len() != entry.segments.len() + 1 {
                return Err(AppError::Config(format!(
                    "patterns[{}] '{}' has {} capture groups but declares {} segments",
                    i,
                    entry.name,
                    regex.captures_len() - 1,
                    entry.segments.len()
                )));
            }
            if entry.segments.iter().any(|role| role.trim().is_empty()) {
                return Err(AppError::Config(format!(
                    "patterns[{}] '{}' has an empty segment role",
                    i, entry.name
                )));
            }
        }
        Ok(())
    }
}

/// Built-in Indian plate taxonomy, most specific first
fn builtin_pattern_table() -> PatternTableConfig {
    PatternTableConfig {
        patterns: vec![
            PatternEntry {
                name: "ind-prefixed".to_string(),
                pattern: r"^(IND)([A-Z]{2})([0-9]{2})([A-Z]{1,2})([0-9]{4})$".to_string(),
                segments: vec![
                    "country".to_string(),
                    "state".to_string(),
                    "district".to_string(),
                    "series".to_string(),
                    "serial".to_string(),
                ],
            },
            PatternEntry {
                name: "standard".to_string(),
                pattern: r"^([A-Z]{2})([0-9]{2})([A-Z]{1,2})([0-9]{4})$".to_string(),
                segments: vec![
                    "state".to_string(),
                    "district".to_string(),
                    "series".to_string(),
                    "serial".to_string(),
                ],
            },
            PatternEntry {
                name: "special-series".to_string(),
                pattern: r"^([A-Z]{3})([0-9]{4})$".to_string(),
                segments: vec!["series".to_string(), "serial".to_string()],
            },
            PatternEntry {
                name: "legacy".to_string(),
                pattern: r"^([A-Z]{2})([0-9]{2})([0-9]{4,6})$".to_string(),
                segments: vec![
                    "state".to_string(),
                    "district".to_string(),
                    "serial".to_string(),
                ],
            },
        ],
    }
}

/// Load the pattern table configuration from JSON
///
/// Tries `PLATE_PATTERNS_CONFIG_PATH`, then the conventional fallback paths,
/// then the built-in table. A malformed file is logged and skipped, never
/// fatal.
pub fn load_pattern_table_config() -> PatternTableConfig {
    if let Ok(config_path) = std::env::var("PLATE_PATTERNS_CONFIG_PATH") {
        info!(
            "Loading plate pattern table from environment variable: {}",
            config_path
        );
        match read_pattern_table(&config_path) {
            Ok(config) => return config,
            Err(e) => {
                warn!(
                    "Failed to load plate pattern table from '{}': {}. Falling back to default paths.",
                    config_path, e
                );
            }
        }
    }

    let possible_paths = [
        "config/plate_patterns.json",    // Local development path
        "../config/plate_patterns.json", // Test path
    ];
    for config_path in &possible_paths {
        match read_pattern_table(config_path) {
            Ok(config) => {
                info!(
                    "Successfully loaded plate pattern table from fallback path: {}",
                    config_path
                );
                return config;
            }
            Err(_) => continue, // Try next path
        }
    }

    debug!("No plate pattern config file found; using the built-in table");
    builtin_pattern_table()
}

fn read_pattern_table(path: &str) -> AppResult<PatternTableConfig> {
    let content =
        fs::read_to_string(path).map_err(|e| AppError::Config(format!("{}: {}", path, e)))?;
    let config: PatternTableConfig = serde_json::from_str(&content)
        .map_err(|e| AppError::Config(format!("{}: {}", path, e)))?;
    config.validate()?;
    Ok(config)
}

/// One compiled pattern-table entry
#[derive(Debug, Clone)]
pub struct PlatePattern {
    pub name: String,
    pub regex: Regex,
    pub segments: Vec<String>,
}

fn compile_table(config: &PatternTableConfig) -> AppResult<Vec<PlatePattern>> {
    config.validate()?;
    config
        .patterns
        .iter()
        .map(|entry| {
            let regex = Regex::new(&entry.pattern)
                .map_err(|e| AppError::Config(format!("'{}': {}", entry.name, e)))?;
            Ok(PlatePattern {
                name: entry.name.clone(),
                regex,
                segments: entry.segments.clone(),
            })
        })
        .collect()
}

// Lazy static default table to avoid recompilation
lazy_static! {
    static ref DEFAULT_PATTERNS: Vec<PlatePattern> =
        compile_table(&load_pattern_table_config()).expect("Built-in pattern table should be valid");
}

/// Plate format validator/formatter over an ordered pattern table
#[derive(Debug, Clone)]
pub struct PlateFormatter {
    patterns: Vec<PlatePattern>,
}

impl PlateFormatter {
    /// Create a formatter with the default table (config file when present,
    /// built-in Indian taxonomy otherwise)
    pub fn new() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS.clone(),
        }
    }

    /// Create a formatter from an explicit pattern table
    pub fn from_config(config: &PatternTableConfig) -> AppResult<Self> {
        Ok(Self {
            patterns: compile_table(config)?,
        })
    }

    /// Names of the table entries, in evaluation order
    pub fn pattern_names(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.name.as_str()).collect()
    }

    /// Match `normalized` against the ordered table, first-match-wins.
    ///
    /// On a match the text is decomposed into its semantic segments and
    /// joined with single spaces into the canonical form. `None` means no
    /// pattern in the table fits; callers present the normalized text
    /// instead of discarding it.
    pub fn format(&self, normalized: &str) -> Option<CanonicalPlate> {
        for pattern in &self.patterns {
            if let Some(captures) = pattern.regex.captures(normalized) {
                let segments: Vec<PlateSegment> = pattern
                    .segments
                    .iter()
                    .zip(captures.iter().skip(1))
                    .map(|(role, group)| PlateSegment {
                        role: role.clone(),
                        value: group.map_or(String::new(), |m| m.as_str().to_string()),
                    })
                    .collect();
                let text = segments
                    .iter()
                    .map(|s| s.value.as_str())
                    .filter(|v| !v.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");

                debug!(
                    pattern = %pattern.name,
                    canonical = %text,
                    "Plate format matched"
                );
                return Some(CanonicalPlate {
                    pattern: pattern.name.clone(),
                    segments,
                    text,
                });
            }
        }
        debug!(input = %normalized, "No plate pattern matched");
        None
    }
}

impl Default for PlateFormatter {
    fn default() -> Self {
        Self::new()
    }
}
