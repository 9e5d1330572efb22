//! Session log panel.
//!
//! Keeps every line shown to the user, in order, and mirrors each append to
//! `tracing`. Exported logs are the lines joined by `\n`.

use calib_core::{CalibError, Result};
use std::fs;
use std::path::Path;

/// Severity of a log line, used only for the `tracing` mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Normal progress
    Info,
    /// Consistency findings
    Warn,
    /// Failed action
    Error,
}

/// Ordered, append-only list of log lines.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    lines: Vec<String>,
}

impl SessionLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an informational line
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    /// Append a warning line
    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message.into());
    }

    /// Append an error line
    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message.into());
    }

    fn push(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => tracing::info!(target: "calib_app::log", "{}", message),
            LogLevel::Warn => tracing::warn!(target: "calib_app::log", "{}", message),
            LogLevel::Error => tracing::error!(target: "calib_app::log", "{}", message),
        }
        self.lines.push(message);
    }

    /// All lines in append order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Most recent line
    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing has been logged
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Plain-text rendering of the whole log
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    /// Write the plain-text log to `path`
    pub fn export(&self, path: &Path) -> Result<()> {
        let text = self.to_text();
        fs::write(path, text.as_bytes()).map_err(|e| CalibError::io(path, e))?;

        tracing::info!(
            path = %path.display(),
            lines = self.lines.len(),
            "Session log exported"
        );
        Ok(())
    }
}
