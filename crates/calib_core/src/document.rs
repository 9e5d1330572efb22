//! Calibration JSON document.
//!
//! The persisted format is a fixed, nested object:
//!
//! ```json
//! {
//!     "CameraIntrinsics": {"FocalLength": [fx, fy], "Skew": s, "PrincipalPoint": [cx, cy]},
//!     "RadialDistortion": [k1, k2],
//!     "TangentialDistortion": [p1, p2],
//!     "ImageSize": [height, width],
//!     "CalibrationSettings": {
//!         "NumPatterns": n, "WorldUnits": "millimeters",
//!         "EstimateSkew": 0, "NumRadialDistortionCoefficients": 2,
//!         "EstimateTangentialDistortion": 0
//!     },
//!     "AccuracyOfEstimation": {"MeanReprojectionError": e}
//! }
//! ```
//!
//! Writing goes through `serde` structs whose field order is the key order
//! above. Reading walks a [`serde_json::Value`] by exact key path so that a
//! missing key ([`CalibError::Schema`]) can be told apart from a malformed
//! one ([`CalibError::Type`]).

use crate::error::{CalibError, Result};
use crate::record::{CalibrationRecord, CalibrationSettings, CameraIntrinsics, ImageSize};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

/// Indentation used when none is configured.
pub const DEFAULT_INDENT: usize = 4;

/// Path reported for errors concerning the whole document.
const ROOT: &str = "$";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DocumentOut<'a> {
    camera_intrinsics: IntrinsicsOut,
    radial_distortion: &'a [f64],
    tangential_distortion: [f64; 2],
    image_size: [u32; 2],
    calibration_settings: SettingsOut<'a>,
    accuracy_of_estimation: AccuracyOut,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct IntrinsicsOut {
    focal_length: [f64; 2],
    skew: f64,
    principal_point: [f64; 2],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SettingsOut<'a> {
    num_patterns: u32,
    world_units: &'a str,
    estimate_skew: i64,
    #[serde(rename = "NumRadialDistortionCoefficients")]
    num_radial_coefficients: u32,
    estimate_tangential_distortion: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AccuracyOut {
    mean_reprojection_error: f64,
}

impl<'a> DocumentOut<'a> {
    fn from_record(record: &'a CalibrationRecord) -> Self {
        let settings = &record.settings;
        Self {
            camera_intrinsics: IntrinsicsOut {
                focal_length: record.intrinsics.focal_length,
                skew: record.intrinsics.skew,
                principal_point: record.intrinsics.principal_point,
            },
            radial_distortion: &record.radial_distortion,
            tangential_distortion: record.tangential_distortion,
            image_size: [record.image_size.height, record.image_size.width],
            calibration_settings: SettingsOut {
                num_patterns: settings.num_patterns,
                world_units: &settings.world_units,
                estimate_skew: settings.estimate_skew,
                num_radial_coefficients: settings.num_radial_coefficients,
                estimate_tangential_distortion: settings.estimate_tangential_distortion,
            },
            accuracy_of_estimation: AccuracyOut {
                mean_reprojection_error: record.mean_reprojection_error,
            },
        }
    }
}

/// Serialise a record with the default 4-space indentation.
///
/// # Examples
/// ```
/// use calib_core::{default_record, document};
///
/// let text = document::serialize(&default_record()).unwrap();
/// assert!(text.starts_with("{\n    \"CameraIntrinsics\": {"));
/// ```
pub fn serialize(record: &CalibrationRecord) -> Result<String> {
    serialize_with_indent(record, DEFAULT_INDENT)
}

/// Serialise a record using `indent` spaces per nesting level.
///
/// # Errors
/// [`CalibError::Type`] if a real is not finite; JSON has no spelling for it.
pub fn serialize_with_indent(record: &CalibrationRecord, indent: usize) -> Result<String> {
    ensure_finite(record)?;

    let indent = " ".repeat(indent);
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(
        &mut buf,
        PrettyFormatter::with_indent(indent.as_bytes()),
    );
    DocumentOut::from_record(record)
        .serialize(&mut ser)
        .map_err(|e| CalibError::type_mismatch(ROOT, format!("serialisable record ({})", e)))?;

    String::from_utf8(buf)
        .map_err(|e| CalibError::type_mismatch(ROOT, format!("UTF-8 output ({})", e)))
}

fn ensure_finite(record: &CalibrationRecord) -> Result<()> {
    let intr = &record.intrinsics;
    let scalars = [
        ("CameraIntrinsics.FocalLength[0]", intr.focal_length[0]),
        ("CameraIntrinsics.FocalLength[1]", intr.focal_length[1]),
        ("CameraIntrinsics.Skew", intr.skew),
        ("CameraIntrinsics.PrincipalPoint[0]", intr.principal_point[0]),
        ("CameraIntrinsics.PrincipalPoint[1]", intr.principal_point[1]),
        ("TangentialDistortion[0]", record.tangential_distortion[0]),
        ("TangentialDistortion[1]", record.tangential_distortion[1]),
        (
            "AccuracyOfEstimation.MeanReprojectionError",
            record.mean_reprojection_error,
        ),
    ];
    if let Some((path, _)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
        return Err(CalibError::type_mismatch(*path, "finite number"));
    }
    if let Some(i) = record.radial_distortion.iter().position(|v| !v.is_finite()) {
        return Err(CalibError::type_mismatch(
            format!("RadialDistortion[{}]", i),
            "finite number",
        ));
    }
    Ok(())
}

/// Parse JSON text and extract a record from it.
///
/// Text that is not JSON at all is reported as [`CalibError::Type`] at `$`.
pub fn from_json_str(text: &str) -> Result<CalibrationRecord> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| CalibError::type_mismatch(ROOT, format!("JSON document ({})", e)))?;
    deserialize(&value)
}

/// Extract a record from a parsed calibration document.
///
/// Unknown extra keys are ignored.
///
/// # Errors
/// - [`CalibError::Schema`] naming the first missing key path
/// - [`CalibError::Type`] naming the first malformed value
pub fn deserialize(document: &Value) -> Result<CalibrationRecord> {
    let root = object(document, ROOT)?;

    let (intr_value, intr_path) = field(root, "", "CameraIntrinsics")?;
    let intr = object(intr_value, &intr_path)?;
    let intrinsics = CameraIntrinsics {
        focal_length: real_pair(field(intr, &intr_path, "FocalLength")?)?,
        skew: real(field(intr, &intr_path, "Skew")?)?,
        principal_point: real_pair(field(intr, &intr_path, "PrincipalPoint")?)?,
    };

    let radial_distortion = reals(field(root, "", "RadialDistortion")?)?;
    let tangential_distortion = real_pair(field(root, "", "TangentialDistortion")?)?;
    let [height, width] = count_pair(field(root, "", "ImageSize")?)?;

    let (settings_value, settings_path) = field(root, "", "CalibrationSettings")?;
    let cs = object(settings_value, &settings_path)?;
    let settings = CalibrationSettings {
        num_patterns: count(field(cs, &settings_path, "NumPatterns")?)?,
        world_units: text(field(cs, &settings_path, "WorldUnits")?)?,
        estimate_skew: flag(field(cs, &settings_path, "EstimateSkew")?)?,
        num_radial_coefficients: count(field(
            cs,
            &settings_path,
            "NumRadialDistortionCoefficients",
        )?)?,
        estimate_tangential_distortion: flag(field(
            cs,
            &settings_path,
            "EstimateTangentialDistortion",
        )?)?,
    };

    let (accuracy_value, accuracy_path) = field(root, "", "AccuracyOfEstimation")?;
    let ae = object(accuracy_value, &accuracy_path)?;
    let mean_reprojection_error = real(field(ae, &accuracy_path, "MeanReprojectionError")?)?;

    Ok(CalibrationRecord {
        intrinsics,
        radial_distortion,
        tangential_distortion,
        image_size: ImageSize { height, width },
        settings,
        mean_reprojection_error,
    })
}

// *************** Key-path extraction ***************

type Located<'a> = (&'a Value, String);

fn field<'a>(obj: &'a Map<String, Value>, parent: &str, key: &str) -> Result<Located<'a>> {
    let path = if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    };
    match obj.get(key) {
        Some(value) => Ok((value, path)),
        None => Err(CalibError::schema(path)),
    }
}

fn object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| CalibError::type_mismatch(path, "object"))
}

fn real_at(value: &Value, path: &str) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| CalibError::type_mismatch(path, "number"))
}

fn real((value, path): Located<'_>) -> Result<f64> {
    real_at(value, &path)
}

fn array<'a>(value: &'a Value, path: &str, expected: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| CalibError::type_mismatch(path, expected))
}

fn reals((value, path): Located<'_>) -> Result<Vec<f64>> {
    array(value, &path, "array of numbers")?
        .iter()
        .enumerate()
        .map(|(i, v)| real_at(v, &format!("{}[{}]", path, i)))
        .collect()
}

fn real_pair((value, path): Located<'_>) -> Result<[f64; 2]> {
    const EXPECTED: &str = "array of 2 numbers";
    match array(value, &path, EXPECTED)?.as_slice() {
        [a, b] => Ok([
            real_at(a, &format!("{}[0]", path))?,
            real_at(b, &format!("{}[1]", path))?,
        ]),
        _ => Err(CalibError::type_mismatch(path, EXPECTED)),
    }
}

fn count_at(value: &Value, path: &str) -> Result<u32> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| CalibError::type_mismatch(path, "non-negative 32-bit integer"))
}

fn count((value, path): Located<'_>) -> Result<u32> {
    count_at(value, &path)
}

fn count_pair((value, path): Located<'_>) -> Result<[u32; 2]> {
    const EXPECTED: &str = "array of 2 integers";
    match array(value, &path, EXPECTED)?.as_slice() {
        [a, b] => Ok([
            count_at(a, &format!("{}[0]", path))?,
            count_at(b, &format!("{}[1]", path))?,
        ]),
        _ => Err(CalibError::type_mismatch(path, EXPECTED)),
    }
}

fn flag((value, path): Located<'_>) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| CalibError::type_mismatch(path, "integer"))
}

fn text((value, path): Located<'_>) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| CalibError::type_mismatch(path, "string"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::default_record;
    use serde_json::json;

    fn default_document() -> Value {
        json!({
            "CameraIntrinsics": {
                "FocalLength": [1413.3, 1418.8],
                "Skew": 0.0,
                "PrincipalPoint": [950.0639, 543.3796]
            },
            "RadialDistortion": [-0.0091, 0.0666],
            "TangentialDistortion": [0.0, 0.0],
            "ImageSize": [1080, 1920],
            "CalibrationSettings": {
                "NumPatterns": 33,
                "WorldUnits": "millimeters",
                "EstimateSkew": 0,
                "NumRadialDistortionCoefficients": 2,
                "EstimateTangentialDistortion": 0
            },
            "AccuracyOfEstimation": {"MeanReprojectionError": 0.645}
        })
    }

    fn remove(doc: &mut Value, path: &[&str]) {
        let (last, parents) = path.split_last().unwrap();
        let mut cursor = doc;
        for key in parents {
            cursor = cursor.get_mut(*key).unwrap();
        }
        cursor.as_object_mut().unwrap().remove(*last);
    }

    #[test]
    fn test_serialize_exact_text() {
        let expected = r#"{
    "CameraIntrinsics": {
        "FocalLength": [
            1413.3,
            1418.8
        ],
        "Skew": 0.0,
        "PrincipalPoint": [
            950.0639,
            543.3796
        ]
    },
    "RadialDistortion": [
        -0.0091,
        0.0666
    ],
    "TangentialDistortion": [
        0.0,
        0.0
    ],
    "ImageSize": [
        1080,
        1920
    ],
    "CalibrationSettings": {
        "NumPatterns": 33,
        "WorldUnits": "millimeters",
        "EstimateSkew": 0,
        "NumRadialDistortionCoefficients": 2,
        "EstimateTangentialDistortion": 0
    },
    "AccuracyOfEstimation": {
        "MeanReprojectionError": 0.645
    }
}"#;
        assert_eq!(serialize(&default_record()).unwrap(), expected);
    }

    #[test]
    fn test_serialize_custom_indent() {
        let text = serialize_with_indent(&default_record(), 2).unwrap();
        assert!(text.starts_with("{\n  \"CameraIntrinsics\": {\n    \"FocalLength\""));
    }

    #[test]
    fn test_serialize_rejects_non_finite() {
        let mut record = default_record();
        record.radial_distortion[1] = f64::NAN;
        match serialize(&record) {
            Err(CalibError::Type { path, .. }) => assert_eq!(path, "RadialDistortion[1]"),
            other => panic!("Expected type error, got {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_default_document() {
        assert_eq!(deserialize(&default_document()).unwrap(), default_record());
    }

    #[test]
    fn test_deserialize_integer_reals() {
        let mut doc = default_document();
        doc["CameraIntrinsics"]["Skew"] = json!(0);
        doc["TangentialDistortion"] = json!([0, 0]);
        assert_eq!(deserialize(&doc).unwrap(), default_record());
    }

    #[test]
    fn test_deserialize_ignores_unknown_keys() {
        let mut doc = default_document();
        doc["Comment"] = json!("bench camera");
        assert!(deserialize(&doc).is_ok());
    }

    #[test]
    fn test_missing_top_level_keys() {
        for key in [
            "CameraIntrinsics",
            "RadialDistortion",
            "TangentialDistortion",
            "ImageSize",
            "CalibrationSettings",
            "AccuracyOfEstimation",
        ] {
            let mut doc = default_document();
            remove(&mut doc, &[key]);
            match deserialize(&doc) {
                Err(CalibError::Schema { path }) => assert_eq!(path, key),
                other => panic!("Expected schema error for {}, got {:?}", key, other),
            }
        }
    }

    #[test]
    fn test_missing_nested_key() {
        let mut doc = default_document();
        remove(&mut doc, &["CalibrationSettings", "WorldUnits"]);
        match deserialize(&doc) {
            Err(CalibError::Schema { path }) => {
                assert_eq!(path, "CalibrationSettings.WorldUnits")
            }
            other => panic!("Expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_focal_length_wrong_length() {
        let mut doc = default_document();
        doc["CameraIntrinsics"]["FocalLength"] = json!([1413.3]);
        match deserialize(&doc) {
            Err(CalibError::Type { path, expected }) => {
                assert_eq!(path, "CameraIntrinsics.FocalLength");
                assert_eq!(expected, "array of 2 numbers");
            }
            other => panic!("Expected type error, got {:?}", other),
        }
    }

    #[test]
    fn test_image_size_float_rejected() {
        let mut doc = default_document();
        doc["ImageSize"] = json!([1080.0, 1920]);
        match deserialize(&doc) {
            Err(CalibError::Type { path, .. }) => assert_eq!(path, "ImageSize[0]"),
            other => panic!("Expected type error, got {:?}", other),
        }
    }

    #[test]
    fn test_world_units_must_be_string() {
        let mut doc = default_document();
        doc["CalibrationSettings"]["WorldUnits"] = json!(5);
        assert!(matches!(deserialize(&doc), Err(CalibError::Type { .. })));
    }

    #[test]
    fn test_non_object_root_and_section() {
        assert!(matches!(
            deserialize(&json!([1, 2, 3])),
            Err(CalibError::Type { path, .. }) if path == "$"
        ));

        let mut doc = default_document();
        doc["AccuracyOfEstimation"] = json!(0.645);
        assert!(matches!(
            deserialize(&doc),
            Err(CalibError::Type { path, .. }) if path == "AccuracyOfEstimation"
        ));
    }

    #[test]
    fn test_from_json_str_invalid_text() {
        match from_json_str("{ not json") {
            Err(CalibError::Type { path, expected }) => {
                assert_eq!(path, "$");
                assert!(expected.starts_with("JSON document"));
            }
            other => panic!("Expected type error, got {:?}", other),
        }
    }

    #[test]
    fn test_text_round_trip() {
        let mut record = default_record();
        record.radial_distortion.push(1.0e-7);
        record.settings.num_radial_coefficients = 3;
        let text = serialize(&record).unwrap();
        assert_eq!(from_json_str(&text).unwrap(), record);
    }
}
