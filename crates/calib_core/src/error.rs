//! Error types for the calibration record store.
//!
//! This module provides:
//! - `CalibError`: every failure a record-store operation can report
//! - `Result<T>`: crate-wide result alias

use std::path::PathBuf;
use thiserror::Error;

/// Categorised record-store errors.
///
/// Every operation fails atomically: an `Err` carries no partial record.
///
/// # Variants
/// - `Parse`: a form field could not be converted from text
/// - `Schema`: a required key is missing from a calibration document
/// - `Type`: a key is present but its value has the wrong shape
/// - `Io`: a file could not be opened, read or written
/// - `Validation`: strict consistency checks rejected the record
/// - `Sampling`: the synthetic reprojection test could not run
///
/// # Examples
/// ```
/// use calib_core::CalibError;
///
/// let err = CalibError::schema("CameraIntrinsics.Skew");
/// assert_eq!(err.to_string(), "Missing required key: CameraIntrinsics.Skew");
/// ```
#[derive(Error, Debug)]
pub enum CalibError {
    /// Text-to-number conversion failed for a form field.
    #[error("Invalid value {value:?} for field '{field}': {reason}")]
    Parse {
        /// Short key of the offending field (e.g. `fx`, `k2`)
        field: String,
        /// Text that failed to parse
        value: String,
        /// Why the text was rejected
        reason: String,
    },

    /// Required key absent from a calibration document.
    #[error("Missing required key: {path}")]
    Schema {
        /// Dotted key path (e.g. `CalibrationSettings.NumPatterns`)
        path: String,
    },

    /// Key present but its value is malformed.
    #[error("Malformed value at {path}: expected {expected}")]
    Type {
        /// Dotted key path, `$` for the document root
        path: String,
        /// Description of the expected shape
        expected: String,
    },

    /// File open/read/write failure.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File involved in the failed operation
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Consistency findings rejected in strict mode.
    #[error("Inconsistent calibration record: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Synthetic sampling or histogram binning failed.
    #[error("Sampling error: {0}")]
    Sampling(String),
}

impl CalibError {
    /// Create a parse error for a field
    pub fn parse(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Parse {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing-key error
    pub fn schema(path: impl Into<String>) -> Self {
        Self::Schema { path: path.into() }
    }

    /// Create a malformed-value error
    pub fn type_mismatch(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::Type {
            path: path.into(),
            expected: expected.into(),
        }
    }

    /// Create an I/O error for a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a sampling error
    pub fn sampling(msg: impl Into<String>) -> Self {
        Self::Sampling(msg.into())
    }

    /// Short category name, matching the error taxonomy used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "ParseError",
            Self::Schema { .. } => "SchemaError",
            Self::Type { .. } => "TypeError",
            Self::Io { .. } => "IOError",
            Self::Validation(_) => "ValidationError",
            Self::Sampling(_) => "SamplingError",
        }
    }
}

/// Result alias for record-store operations.
pub type Result<T> = std::result::Result<T, CalibError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_field() {
        let err = CalibError::parse("fx", "abc", "invalid float literal");
        let msg = err.to_string();
        assert!(msg.contains("'fx'"));
        assert!(msg.contains("\"abc\""));
        assert_eq!(err.kind(), "ParseError");
    }

    #[test]
    fn test_type_error_display() {
        let err = CalibError::type_mismatch("CameraIntrinsics.FocalLength", "array of 2 numbers");
        assert_eq!(
            err.to_string(),
            "Malformed value at CameraIntrinsics.FocalLength: expected array of 2 numbers"
        );
        assert_eq!(err.kind(), "TypeError");
    }

    #[test]
    fn test_io_error_includes_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = CalibError::io("/tmp/missing.json", source);
        assert!(err.to_string().contains("/tmp/missing.json"));
        assert_eq!(err.kind(), "IOError");
    }

    #[test]
    fn test_validation_error_joins_findings() {
        let err = CalibError::Validation(vec!["first".to_string(), "second".to_string()]);
        assert_eq!(
            err.to_string(),
            "Inconsistent calibration record: first; second"
        );
    }
}
