//! Calibration record types.
//!
//! A [`CalibrationRecord`] is the fixed-shape, fully typed form of the
//! calibration parameters. It is built from form text by
//! [`FormFields::collect`](crate::form::FormFields::collect) or from a JSON
//! document by [`deserialize`](crate::document::deserialize), and replaced
//! wholesale, never merged.

use crate::error::{CalibError, Result};

/// World-unit labels recognised by the consistency checks.
pub const KNOWN_WORLD_UNITS: [&str; 4] = ["millimeters", "centimeters", "meters", "inches"];

/// Camera intrinsics in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraIntrinsics {
    /// Focal length (fx, fy)
    pub focal_length: [f64; 2],
    /// Axis skew, typically 0
    pub skew: f64,
    /// Principal point (cx, cy)
    pub principal_point: [f64; 2],
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    /// Rows
    pub height: u32,
    /// Columns
    pub width: u32,
}

/// Settings the calibration was run with.
///
/// The two `estimate_*` flags are stored as integers because the persisted
/// format carries them as `0`/`1` and lenient loading keeps whatever integer
/// the file holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationSettings {
    /// Number of calibration pattern views
    pub num_patterns: u32,
    /// Free-text unit label (e.g. "millimeters")
    pub world_units: String,
    /// Whether skew was estimated (0 or 1)
    pub estimate_skew: i64,
    /// Number of radial distortion coefficients
    pub num_radial_coefficients: u32,
    /// Whether tangential distortion was estimated (0 or 1)
    pub estimate_tangential_distortion: i64,
}

/// Complete set of calibration parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationRecord {
    /// Focal length, skew and principal point
    pub intrinsics: CameraIntrinsics,
    /// Radial coefficients k1, k2, ...
    pub radial_distortion: Vec<f64>,
    /// Tangential coefficients (p1, p2)
    pub tangential_distortion: [f64; 2],
    /// Image height and width
    pub image_size: ImageSize,
    /// Calibration run settings
    pub settings: CalibrationSettings,
    /// Mean reprojection error in pixels
    pub mean_reprojection_error: f64,
}

/// Canned record used by the auto-fill action.
///
/// # Examples
/// ```
/// use calib_core::default_record;
///
/// let record = default_record();
/// assert_eq!(record.image_size.width, 1920);
/// assert_eq!(record.settings.world_units, "millimeters");
/// ```
pub fn default_record() -> CalibrationRecord {
    CalibrationRecord {
        intrinsics: CameraIntrinsics {
            focal_length: [1413.3, 1418.8],
            skew: 0.0,
            principal_point: [950.0639, 543.3796],
        },
        radial_distortion: vec![-0.0091, 0.0666],
        tangential_distortion: [0.0, 0.0],
        image_size: ImageSize {
            height: 1080,
            width: 1920,
        },
        settings: CalibrationSettings {
            num_patterns: 33,
            world_units: "millimeters".to_string(),
            estimate_skew: 0,
            num_radial_coefficients: 2,
            estimate_tangential_distortion: 0,
        },
        mean_reprojection_error: 0.6450,
    }
}

impl CalibrationRecord {
    /// Collect consistency problems that parsing alone does not catch.
    ///
    /// An empty vector means the record is internally consistent.
    pub fn consistency_findings(&self) -> Vec<String> {
        let mut findings = Vec::new();
        let settings = &self.settings;

        if self.radial_distortion.len() != settings.num_radial_coefficients as usize {
            findings.push(format!(
                "RadialDistortion has {} coefficients but NumRadialDistortionCoefficients is {}",
                self.radial_distortion.len(),
                settings.num_radial_coefficients
            ));
        }

        if !matches!(settings.estimate_skew, 0 | 1) {
            findings.push(format!("EstimateSkew must be 0 or 1, got {}", settings.estimate_skew));
        }

        if !matches!(settings.estimate_tangential_distortion, 0 | 1) {
            findings.push(format!(
                "EstimateTangentialDistortion must be 0 or 1, got {}",
                settings.estimate_tangential_distortion
            ));
        }

        let [fx, fy] = self.intrinsics.focal_length;
        if fx <= 0.0 || fy <= 0.0 {
            findings.push(format!("FocalLength must be positive, got [{}, {}]", fx, fy));
        }

        if self.image_size.height == 0 || self.image_size.width == 0 {
            findings.push(format!(
                "ImageSize must be positive, got [{}, {}]",
                self.image_size.height, self.image_size.width
            ));
        }

        if settings.num_patterns == 0 {
            findings.push("NumPatterns must be greater than 0".to_string());
        }

        if self.mean_reprojection_error < 0.0 {
            findings.push(format!(
                "MeanReprojectionError must be non-negative, got {}",
                self.mean_reprojection_error
            ));
        }

        if !KNOWN_WORLD_UNITS.contains(&settings.world_units.as_str()) {
            findings.push(format!(
                "WorldUnits '{}' is not one of {:?}",
                settings.world_units, KNOWN_WORLD_UNITS
            ));
        }

        findings
    }

    /// Run the consistency checks.
    ///
    /// In strict mode any finding rejects the record with
    /// [`CalibError::Validation`]. Otherwise the findings are handed back for
    /// the caller to report.
    pub fn validate(&self, strict: bool) -> Result<Vec<String>> {
        let findings = self.consistency_findings();
        if strict && !findings.is_empty() {
            return Err(CalibError::Validation(findings));
        }
        Ok(findings)
    }
}
