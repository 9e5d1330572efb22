//! Session configuration management.
//!
//! Handles loading of session configuration from TOML files with
//! environment variable override support.

use calib_core::synthetic::{
    DEFAULT_HISTOGRAM_BINS, DEFAULT_SAMPLE_COUNT, DEFAULT_SEED, DEFAULT_SPREAD_RATIO,
};
use calib_core::ReprojectionErrorSampler;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Largest accepted JSON indentation.
pub const MAX_JSON_INDENT: usize = 16;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Synthetic test settings (`[test]` table).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyntheticTestConfig {
    /// RNG seed
    pub seed: u64,
    /// Samples per run
    pub sample_count: usize,
    /// Standard deviation as a fraction of the mean error
    pub spread_ratio: f64,
    /// Histogram bins
    pub histogram_bins: usize,
}

impl Default for SyntheticTestConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            sample_count: DEFAULT_SAMPLE_COUNT,
            spread_ratio: DEFAULT_SPREAD_RATIO,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl SyntheticTestConfig {
    /// Sampler described by this configuration.
    pub fn sampler(&self) -> ReprojectionErrorSampler {
        ReprojectionErrorSampler::new(self.seed, self.sample_count, self.spread_ratio)
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Reject inconsistent records on load instead of warning
    #[serde(default)]
    pub strict_validation: bool,

    /// Spaces per indentation level in saved calibration files
    #[serde(default = "default_json_indent")]
    pub json_indent: usize,

    /// Synthetic test settings
    #[serde(default)]
    pub test: SyntheticTestConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json_indent() -> usize {
    calib_core::document::DEFAULT_INDENT
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            strict_validation: false,
            json_indent: default_json_indent(),
            test: SyntheticTestConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn with_env_override(mut self) -> Self {
        if let Ok(log_level) = std::env::var("CALIB_LOG_LEVEL") {
            self.log_level = log_level;
        }

        if let Ok(strict) = std::env::var("CALIB_STRICT_VALIDATION") {
            self.strict_validation = match strict.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => self.strict_validation,
            };
        }

        if let Ok(seed) = std::env::var("CALIB_TEST_SEED") {
            if let Ok(seed) = seed.parse() {
                self.test.seed = seed;
            }
        }

        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(format!(
                "Invalid log_level '{}'. Valid values: {:?}",
                self.log_level, VALID_LOG_LEVELS
            ));
        }

        if self.json_indent > MAX_JSON_INDENT {
            errors.push(format!(
                "json_indent {} exceeds maximum allowed ({})",
                self.json_indent, MAX_JSON_INDENT
            ));
        }

        if self.test.sample_count == 0 {
            errors.push("test.sample_count must be greater than 0".to_string());
        }

        if self.test.histogram_bins == 0 {
            errors.push("test.histogram_bins must be greater than 0".to_string());
        }

        if !self.test.spread_ratio.is_finite() || self.test.spread_ratio < 0.0 {
            errors.push(format!(
                "test.spread_ratio must be finite and non-negative, got {}",
                self.test.spread_ratio
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load from file with environment overrides and validate
    pub fn load_with_env_and_validate(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?.with_env_override();
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides, validated
    pub fn default_with_env_and_validate() -> Result<Self, ConfigError> {
        let config = Self::default().with_env_override();
        config.validate()?;
        Ok(config)
    }
}

/// Configuration error type
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(String),
    /// Parse error in config file
    #[error("Parse error: {0}")]
    Parse(String),
    /// Validation error
    #[error("Validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
