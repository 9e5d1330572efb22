//! Error types for the calibration form application.

use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Record store error
    #[error("{0}")]
    Record(#[from] calib_core::CalibError),

    /// Malformed command-line edit
    #[error("Invalid field assignment '{0}': expected KEY=VALUE")]
    Assignment(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use calib_core::CalibError;

    #[test]
    fn test_error_display() {
        let err = AppError::from(ConfigError::Parse("bad".to_string()));
        assert_eq!(err.to_string(), "Configuration error: Parse error: bad");

        let err = AppError::from(CalibError::schema("ImageSize"));
        assert_eq!(err.to_string(), "Missing required key: ImageSize");

        let err = AppError::Assignment("fx".to_string());
        assert!(err.to_string().contains("KEY=VALUE"));
    }
}
