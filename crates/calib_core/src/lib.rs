//! # calib_core: Camera Calibration Record Store
//!
//! Converts between a user-editable set of text fields and a canonical JSON
//! document describing a camera calibration, and persists that document.
//!
//! ## Modules
//!
//! - `record`: the typed [`CalibrationRecord`], the canned default and
//!   consistency checks
//! - `form`: text form state ([`FormFields`]) and the all-or-nothing
//!   `collect` conversion
//! - `document`: exact-shape JSON serialisation and key-path extraction
//! - `store`: file save/load
//! - `synthetic`: illustrative reprojection-error samples and histogram
//! - `error`: the [`CalibError`] taxonomy
//!
//! ## Usage Examples
//!
//! ```rust
//! use calib_core::{default_record, document, FieldId, FormFields};
//!
//! let mut form = FormFields::from_record(&default_record());
//! form.set(FieldId::FocalLengthX, "1400.0");
//!
//! let record = form.collect().unwrap();
//! let text = document::serialize(&record).unwrap();
//! assert_eq!(document::from_json_str(&text).unwrap(), record);
//! ```
//!
//! All operations are synchronous and run to completion on the calling
//! thread.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod document;
pub mod error;
pub mod form;
pub mod record;
pub mod store;
pub mod synthetic;

pub use error::{CalibError, Result};
pub use form::{FieldId, FormFields};
pub use record::{
    default_record, CalibrationRecord, CalibrationSettings, CameraIntrinsics, ImageSize,
};
pub use synthetic::{Histogram, ReprojectionErrorSampler};
