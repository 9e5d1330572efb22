//! Text form state and its conversion to and from [`CalibrationRecord`].
//!
//! The presentation layer owns a [`FormFields`] value, edits it one field at
//! a time and calls [`FormFields::collect`] when the user asks for a save or
//! a test run. Collection is all-or-nothing: the first field that fails to
//! parse aborts the whole conversion.

use crate::error::{CalibError, Result};
use crate::record::{CalibrationRecord, CalibrationSettings, CameraIntrinsics, ImageSize};
use std::fmt;
use std::str::FromStr;

/// Number of radial coefficient slots on a fresh form.
pub const DEFAULT_RADIAL_SLOTS: usize = 2;

/// Highest radial coefficient slot count a form accepts (`k1` to `k8`).
pub const MAX_RADIAL_SLOTS: usize = 8;

/// Identifies one editable field of the form.
///
/// Displays as its short key (`fx`, `k1`, `estimate_skew`, ...) and parses
/// back from the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    /// Focal length fx
    FocalLengthX,
    /// Focal length fy
    FocalLengthY,
    /// Skew
    Skew,
    /// Principal point cx
    PrincipalPointX,
    /// Principal point cy
    PrincipalPointY,
    /// Radial coefficient, zero-based (`Radial(0)` is `k1`)
    Radial(usize),
    /// Tangential coefficient p1
    TangentialP1,
    /// Tangential coefficient p2
    TangentialP2,
    /// Image height
    ImageHeight,
    /// Image width
    ImageWidth,
    /// Number of patterns
    NumPatterns,
    /// World units label
    WorldUnits,
    /// Estimate-skew flag
    EstimateSkew,
    /// Number of radial coefficients
    NumRadialCoefficients,
    /// Estimate-tangential flag
    EstimateTangential,
    /// Mean reprojection error
    MeanReprojectionError,
}

impl FieldId {
    /// Every field in form order, with `radial_slots` radial coefficients.
    pub fn all(radial_slots: usize) -> Vec<FieldId> {
        let mut ids = vec![
            Self::FocalLengthX,
            Self::FocalLengthY,
            Self::Skew,
            Self::PrincipalPointX,
            Self::PrincipalPointY,
        ];
        ids.extend((0..radial_slots).map(Self::Radial));
        ids.extend([
            Self::TangentialP1,
            Self::TangentialP2,
            Self::ImageHeight,
            Self::ImageWidth,
            Self::NumPatterns,
            Self::WorldUnits,
            Self::EstimateSkew,
            Self::NumRadialCoefficients,
            Self::EstimateTangential,
            Self::MeanReprojectionError,
        ]);
        ids
    }

    /// Human-readable label as shown next to the input.
    pub fn label(&self) -> String {
        match self {
            Self::FocalLengthX => "Focal Length fx".to_string(),
            Self::FocalLengthY => "Focal Length fy".to_string(),
            Self::Skew => "Skew".to_string(),
            Self::PrincipalPointX => "Principal Point cx".to_string(),
            Self::PrincipalPointY => "Principal Point cy".to_string(),
            Self::Radial(i) => format!("Radial Distortion k{}", i + 1),
            Self::TangentialP1 => "Tangential Distortion p1".to_string(),
            Self::TangentialP2 => "Tangential Distortion p2".to_string(),
            Self::ImageHeight => "Height (pixels)".to_string(),
            Self::ImageWidth => "Width (pixels)".to_string(),
            Self::NumPatterns => "Number of Patterns".to_string(),
            Self::WorldUnits => "World Units".to_string(),
            Self::EstimateSkew => "Estimate Skew (0 or 1)".to_string(),
            Self::NumRadialCoefficients => "Num Radial Distortion Coefficients".to_string(),
            Self::EstimateTangential => "Estimate Tangential Distortion (0 or 1)".to_string(),
            Self::MeanReprojectionError => "Mean Reprojection Error".to_string(),
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FocalLengthX => write!(f, "fx"),
            Self::FocalLengthY => write!(f, "fy"),
            Self::Skew => write!(f, "skew"),
            Self::PrincipalPointX => write!(f, "cx"),
            Self::PrincipalPointY => write!(f, "cy"),
            Self::Radial(i) => write!(f, "k{}", i + 1),
            Self::TangentialP1 => write!(f, "p1"),
            Self::TangentialP2 => write!(f, "p2"),
            Self::ImageHeight => write!(f, "height"),
            Self::ImageWidth => write!(f, "width"),
            Self::NumPatterns => write!(f, "patterns"),
            Self::WorldUnits => write!(f, "units"),
            Self::EstimateSkew => write!(f, "estimate_skew"),
            Self::NumRadialCoefficients => write!(f, "radial_count"),
            Self::EstimateTangential => write!(f, "estimate_tangential"),
            Self::MeanReprojectionError => write!(f, "mean_error"),
        }
    }
}

impl FromStr for FieldId {
    type Err = CalibError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        let id = match key.as_str() {
            "fx" => Self::FocalLengthX,
            "fy" => Self::FocalLengthY,
            "skew" => Self::Skew,
            "cx" => Self::PrincipalPointX,
            "cy" => Self::PrincipalPointY,
            "p1" => Self::TangentialP1,
            "p2" => Self::TangentialP2,
            "height" => Self::ImageHeight,
            "width" => Self::ImageWidth,
            "patterns" => Self::NumPatterns,
            "units" => Self::WorldUnits,
            "estimate_skew" => Self::EstimateSkew,
            "radial_count" => Self::NumRadialCoefficients,
            "estimate_tangential" => Self::EstimateTangential,
            "mean_error" => Self::MeanReprojectionError,
            other => match other.strip_prefix('k').map(str::parse::<usize>) {
                Some(Ok(n)) if (1..=MAX_RADIAL_SLOTS).contains(&n) => Self::Radial(n - 1),
                Some(Ok(n)) if n > MAX_RADIAL_SLOTS => {
                    return Err(CalibError::parse(
                        "field",
                        s,
                        "radial coefficient index out of range",
                    ))
                }
                _ => return Err(CalibError::parse("field", s, "unknown field key")),
            },
        };
        Ok(id)
    }
}

/// Text value of every form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFields {
    /// fx
    pub focal_length_x: String,
    /// fy
    pub focal_length_y: String,
    /// skew
    pub skew: String,
    /// cx
    pub principal_point_x: String,
    /// cy
    pub principal_point_y: String,
    /// k1, k2, ...
    pub radial: Vec<String>,
    /// p1
    pub tangential_p1: String,
    /// p2
    pub tangential_p2: String,
    /// height
    pub image_height: String,
    /// width
    pub image_width: String,
    /// patterns
    pub num_patterns: String,
    /// units, taken verbatim
    pub world_units: String,
    /// estimate_skew
    pub estimate_skew: String,
    /// radial_count
    pub num_radial_coefficients: String,
    /// estimate_tangential
    pub estimate_tangential: String,
    /// mean_error
    pub mean_reprojection_error: String,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            focal_length_x: String::new(),
            focal_length_y: String::new(),
            skew: String::new(),
            principal_point_x: String::new(),
            principal_point_y: String::new(),
            radial: vec![String::new(); DEFAULT_RADIAL_SLOTS],
            tangential_p1: String::new(),
            tangential_p2: String::new(),
            image_height: String::new(),
            image_width: String::new(),
            num_patterns: String::new(),
            world_units: String::new(),
            estimate_skew: String::new(),
            num_radial_coefficients: String::new(),
            estimate_tangential: String::new(),
            mean_reprojection_error: String::new(),
        }
    }
}

impl FormFields {
    /// Empty form with the default number of radial slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a record as form text.
    ///
    /// Reals use Rust's shortest round-trip decimal form, so
    /// `FormFields::from_record(&r).collect()` gives back `r`.
    pub fn from_record(record: &CalibrationRecord) -> Self {
        let intr = &record.intrinsics;
        let settings = &record.settings;
        Self {
            focal_length_x: intr.focal_length[0].to_string(),
            focal_length_y: intr.focal_length[1].to_string(),
            skew: intr.skew.to_string(),
            principal_point_x: intr.principal_point[0].to_string(),
            principal_point_y: intr.principal_point[1].to_string(),
            radial: record.radial_distortion.iter().map(f64::to_string).collect(),
            tangential_p1: record.tangential_distortion[0].to_string(),
            tangential_p2: record.tangential_distortion[1].to_string(),
            image_height: record.image_size.height.to_string(),
            image_width: record.image_size.width.to_string(),
            num_patterns: settings.num_patterns.to_string(),
            world_units: settings.world_units.clone(),
            estimate_skew: settings.estimate_skew.to_string(),
            num_radial_coefficients: settings.num_radial_coefficients.to_string(),
            estimate_tangential: settings.estimate_tangential_distortion.to_string(),
            mean_reprojection_error: record.mean_reprojection_error.to_string(),
        }
    }

    /// Current text of a field, `None` for a radial slot past the end.
    pub fn get(&self, field: FieldId) -> Option<&str> {
        let text = match field {
            FieldId::FocalLengthX => &self.focal_length_x,
            FieldId::FocalLengthY => &self.focal_length_y,
            FieldId::Skew => &self.skew,
            FieldId::PrincipalPointX => &self.principal_point_x,
            FieldId::PrincipalPointY => &self.principal_point_y,
            FieldId::Radial(i) => return self.radial.get(i).map(String::as_str),
            FieldId::TangentialP1 => &self.tangential_p1,
            FieldId::TangentialP2 => &self.tangential_p2,
            FieldId::ImageHeight => &self.image_height,
            FieldId::ImageWidth => &self.image_width,
            FieldId::NumPatterns => &self.num_patterns,
            FieldId::WorldUnits => &self.world_units,
            FieldId::EstimateSkew => &self.estimate_skew,
            FieldId::NumRadialCoefficients => &self.num_radial_coefficients,
            FieldId::EstimateTangential => &self.estimate_tangential,
            FieldId::MeanReprojectionError => &self.mean_reprojection_error,
        };
        Some(text.as_str())
    }

    /// Replace the text of one field.
    ///
    /// Setting a radial slot past the end grows the list with empty slots,
    /// which then have to be filled before `collect` succeeds. Growing past
    /// [`MAX_RADIAL_SLOTS`] is refused and the edit is ignored.
    pub fn set(&mut self, field: FieldId, text: impl Into<String>) {
        if let FieldId::Radial(i) = field {
            if i >= MAX_RADIAL_SLOTS && i >= self.radial.len() {
                tracing::warn!(slot = i, "Ignoring radial coefficient slot out of range");
                return;
            }
        }
        let text = text.into();
        let slot = match field {
            FieldId::FocalLengthX => &mut self.focal_length_x,
            FieldId::FocalLengthY => &mut self.focal_length_y,
            FieldId::Skew => &mut self.skew,
            FieldId::PrincipalPointX => &mut self.principal_point_x,
            FieldId::PrincipalPointY => &mut self.principal_point_y,
            FieldId::Radial(i) => {
                if self.radial.len() <= i {
                    self.radial.resize(i + 1, String::new());
                }
                &mut self.radial[i]
            }
            FieldId::TangentialP1 => &mut self.tangential_p1,
            FieldId::TangentialP2 => &mut self.tangential_p2,
            FieldId::ImageHeight => &mut self.image_height,
            FieldId::ImageWidth => &mut self.image_width,
            FieldId::NumPatterns => &mut self.num_patterns,
            FieldId::WorldUnits => &mut self.world_units,
            FieldId::EstimateSkew => &mut self.estimate_skew,
            FieldId::NumRadialCoefficients => &mut self.num_radial_coefficients,
            FieldId::EstimateTangential => &mut self.estimate_tangential,
            FieldId::MeanReprojectionError => &mut self.mean_reprojection_error,
        };
        *slot = text;
    }

    /// Every field with its current text, in form order.
    pub fn entries(&self) -> Vec<(FieldId, &str)> {
        FieldId::all(self.radial.len())
            .into_iter()
            .filter_map(|id| self.get(id).map(|text| (id, text)))
            .collect()
    }

    /// Parse every field into a [`CalibrationRecord`].
    ///
    /// # Errors
    /// [`CalibError::Parse`] naming the first field, in form order, that is
    /// empty, non-numeric or non-finite.
    pub fn collect(&self) -> Result<CalibrationRecord> {
        let intrinsics = CameraIntrinsics {
            focal_length: [
                parse_real(FieldId::FocalLengthX, &self.focal_length_x)?,
                parse_real(FieldId::FocalLengthY, &self.focal_length_y)?,
            ],
            skew: parse_real(FieldId::Skew, &self.skew)?,
            principal_point: [
                parse_real(FieldId::PrincipalPointX, &self.principal_point_x)?,
                parse_real(FieldId::PrincipalPointY, &self.principal_point_y)?,
            ],
        };

        let radial_distortion = self
            .radial
            .iter()
            .enumerate()
            .map(|(i, text)| parse_real(FieldId::Radial(i), text))
            .collect::<Result<Vec<_>>>()?;

        let tangential_distortion = [
            parse_real(FieldId::TangentialP1, &self.tangential_p1)?,
            parse_real(FieldId::TangentialP2, &self.tangential_p2)?,
        ];

        let image_size = ImageSize {
            height: parse_count(FieldId::ImageHeight, &self.image_height)?,
            width: parse_count(FieldId::ImageWidth, &self.image_width)?,
        };

        let settings = CalibrationSettings {
            num_patterns: parse_count(FieldId::NumPatterns, &self.num_patterns)?,
            world_units: self.world_units.clone(),
            estimate_skew: parse_flag(FieldId::EstimateSkew, &self.estimate_skew)?,
            num_radial_coefficients: parse_count(
                FieldId::NumRadialCoefficients,
                &self.num_radial_coefficients,
            )?,
            estimate_tangential_distortion: parse_flag(
                FieldId::EstimateTangential,
                &self.estimate_tangential,
            )?,
        };

        let mean_reprojection_error =
            parse_real(FieldId::MeanReprojectionError, &self.mean_reprojection_error)?;

        tracing::debug!(
            radial_coefficients = radial_distortion.len(),
            "Collected calibration record from form"
        );

        Ok(CalibrationRecord {
            intrinsics,
            radial_distortion,
            tangential_distortion,
            image_size,
            settings,
            mean_reprojection_error,
        })
    }
}

fn non_empty(field: FieldId, text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CalibError::parse(field.to_string(), text, "empty value"));
    }
    Ok(trimmed)
}

fn parse_real(field: FieldId, text: &str) -> Result<f64> {
    let value: f64 = non_empty(field, text)?
        .parse()
        .map_err(|e: std::num::ParseFloatError| {
            CalibError::parse(field.to_string(), text, e.to_string())
        })?;
    if !value.is_finite() {
        return Err(CalibError::parse(field.to_string(), text, "not a finite number"));
    }
    Ok(value)
}

fn parse_count(field: FieldId, text: &str) -> Result<u32> {
    non_empty(field, text)?
        .parse()
        .map_err(|e: std::num::ParseIntError| {
            CalibError::parse(field.to_string(), text, e.to_string())
        })
}

fn parse_flag(field: FieldId, text: &str) -> Result<i64> {
    non_empty(field, text)?
        .parse()
        .map_err(|e: std::num::ParseIntError| {
            CalibError::parse(field.to_string(), text, e.to_string())
        })
}
