//! File persistence for calibration documents.
//!
//! Paths are always chosen by the caller. Each call opens, fully reads or
//! writes, and releases its file before returning.

use crate::document;
use crate::error::{CalibError, Result};
use crate::record::CalibrationRecord;
use std::fs;
use std::path::Path;
use tracing::info;

/// Write `record` to `path` as a calibration document.
///
/// The file is created or truncated. Serialisation happens before the file
/// is touched, so a record that cannot be serialised leaves any existing
/// file intact.
pub fn save_record(path: &Path, record: &CalibrationRecord, indent: usize) -> Result<()> {
    let content = document::serialize_with_indent(record, indent)?;

    fs::write(path, content.as_bytes()).map_err(|e| CalibError::io(path, e))?;

    info!(
        path = %path.display(),
        size = content.len(),
        "Calibration record written to file"
    );

    Ok(())
}

/// Read and decode the calibration document at `path`.
pub fn load_record(path: &Path) -> Result<CalibrationRecord> {
    let content = fs::read_to_string(path).map_err(|e| CalibError::io(path, e))?;
    let record = document::from_json_str(&content)?;

    info!(
        path = %path.display(),
        size = content.len(),
        "Calibration record read from file"
    );

    Ok(record)
}
