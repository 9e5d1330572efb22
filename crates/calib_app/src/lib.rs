//! # Calibration Form Application
//!
//! Command layer over [`calib_core`]: the form state, the log panel and one
//! method per user action, plus a terminal front end.
//!
//! ## Actions
//!
//! - **Auto fill**: populate the form with the canned default calibration
//! - **Save / Load**: persist the form as a calibration JSON file, or replace
//!   the form wholesale from one
//! - **Run test**: draw illustrative reprojection errors around the entered
//!   mean and bin them into a histogram
//! - **Save log**: export the session log as plain text
//!
//! Every action runs synchronously, reports failures through the session log
//! and never aborts the process.

pub mod cli;
pub mod config;
pub mod error;
pub mod log;
pub mod render;
pub mod session;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ConfigError, SessionConfig, SyntheticTestConfig};
    pub use crate::error::AppError;
    pub use crate::log::SessionLog;
    pub use crate::session::{ActionOutcome, CalibrationSession, TestRun};
}
