//! Request boundary.
//!
//! Raw request fields arrive as loosely typed JSON values (numbers may be
//! strings, booleans may be the string `"true"`). [`ConvertRequest::validate`]
//! turns them into [`ConversionOptions`] before any I/O happens.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use sf_common::ConversionOptions;

use crate::error::{ConvertError, Result};
use crate::pipeline::{ConversionOutcome, Converter};

pub const FILE_PATH_REQUIRED: &str = "filePath is required";
pub const MASTERY_SCORE_REQUIRED: &str = "masteryScore is required";

/// Archive name used when the source path has no file stem.
const FALLBACK_FILE_NAME: &str = "package.zip";

/// Raw, unvalidated conversion request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    #[serde(default)]
    pub file_path: Option<Value>,
    #[serde(default)]
    pub margin_x: Option<Value>,
    #[serde(default)]
    pub margin_y: Option<Value>,
    #[serde(default)]
    pub mastery_score: Option<Value>,
    #[serde(default)]
    pub max_width: Option<Value>,
    #[serde(default)]
    pub restrict_width_and_center: Option<Value>,
    #[serde(default)]
    pub show_rights: Option<Value>,
}

/// A finished conversion ready to hand back to the caller.
#[derive(Debug, Clone)]
pub struct ConvertResponse {
    /// Suggested download name: the source file stem plus `.zip`.
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub outcome: ConversionOutcome,
}

impl ConvertRequest {
    /// Parse a JSON request body.
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| ConvertError::Validation(format!("invalid request body: {e}")))
    }

    /// Apply query-string parameters. Only `restrictWidthAndCenter` is read
    /// from the query; it overrides the body value.
    pub fn with_query(mut self, query: &str) -> Self {
        for pair in query.split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if key == "restrictWidthAndCenter" {
                self.restrict_width_and_center = Some(Value::String(value.to_string()));
            }
        }
        self
    }

    /// Validate fields and build the conversion options.
    ///
    /// Pure: touches neither the filesystem nor the converter.
    pub fn validate(&self) -> Result<(PathBuf, ConversionOptions)> {
        let file_path = match &self.file_path {
            Some(Value::String(path)) if !path.trim().is_empty() => PathBuf::from(path.trim()),
            _ => return Err(ConvertError::Validation(FILE_PATH_REQUIRED.to_string())),
        };

        let mastery_score = match self.mastery_score.as_ref().filter(|v| !v.is_null()) {
            Some(value) => parse_score(value)?,
            None => return Err(ConvertError::Validation(MASTERY_SCORE_REQUIRED.to_string())),
        };

        let restrict_width_and_center = parse_flag(self.restrict_width_and_center.as_ref());
        let max_width = parse_dimension("maxWidth", self.max_width.as_ref())?;
        if restrict_width_and_center && max_width.is_none() {
            return Err(ConvertError::Validation(
                "maxWidth is required when restrictWidthAndCenter is set".to_string(),
            ));
        }

        let options = ConversionOptions {
            margin_x: parse_dimension("marginX", self.margin_x.as_ref())?.unwrap_or(0),
            margin_y: parse_dimension("marginY", self.margin_y.as_ref())?.unwrap_or(0),
            mastery_score,
            max_width: max_width.unwrap_or(0),
            restrict_width_and_center,
            show_rights: parse_flag(self.show_rights.as_ref()),
        };
        Ok((file_path, options))
    }
}

fn parse_score(value: &Value) -> Result<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match score {
        Some(score) if score.is_finite() && (0.0..=100.0).contains(&score) => Ok(score),
        _ => Err(ConvertError::Validation(
            "masteryScore must be a number between 0 and 100".to_string(),
        )),
    }
}

/// Non-negative integer pixel value; absent or null is `None`.
fn parse_dimension(name: &str, value: Option<&Value>) -> Result<Option<u32>> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        Some(_) => None,
    };
    parsed.map(Some).ok_or_else(|| {
        ConvertError::Validation(format!("{name} must be a non-negative integer"))
    })
}

/// `true` or the string `"true"`; anything else is false.
fn parse_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

/// Download name for a converted `path`: its stem plus `.zip`.
pub fn suggested_file_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| format!("{}.zip", stem.to_string_lossy()))
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

/// Validate, read the source file and convert it.
pub fn process(converter: &Converter, request: &ConvertRequest) -> Result<ConvertResponse> {
    let (path, options) = request.validate()?;
    debug!(path = %path.display(), "reading package");
    let buffer = fs::read(&path)?;
    let converted = converter.convert_detailed(&buffer, &options)?;
    Ok(ConvertResponse {
        file_name: suggested_file_name(&path),
        bytes: converted.bytes,
        outcome: converted.outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> ConvertRequest {
        serde_json::from_value(value).unwrap()
    }

    fn validation_message(req: &ConvertRequest) -> String {
        match req.validate().unwrap_err() {
            ConvertError::Validation(msg) => msg,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_file_path_required() {
        let req = request(json!({ "masteryScore": 80 }));
        assert_eq!(validation_message(&req), FILE_PATH_REQUIRED);

        let req = request(json!({ "filePath": 42, "masteryScore": 80 }));
        assert_eq!(validation_message(&req), FILE_PATH_REQUIRED);

        let req = request(json!({ "filePath": "   ", "masteryScore": 80 }));
        assert_eq!(validation_message(&req), FILE_PATH_REQUIRED);
    }

    #[test]
    fn test_file_path_is_trimmed() {
        let req = request(json!({ "filePath": " /data/course.h5p\n", "masteryScore": 80 }));
        let (path, _) = req.validate().unwrap();
        assert_eq!(path, PathBuf::from("/data/course.h5p"));
    }

    #[test]
    fn test_mastery_score_required() {
        let req = request(json!({ "filePath": "/tmp/course.h5p" }));
        assert_eq!(validation_message(&req), MASTERY_SCORE_REQUIRED);

        let req = request(json!({ "filePath": "/tmp/course.h5p", "masteryScore": null }));
        assert_eq!(validation_message(&req), MASTERY_SCORE_REQUIRED);
    }

    #[test]
    fn test_mastery_score_range() {
        for bad in [json!(-1), json!(101), json!("abc"), json!(true)] {
            let req = request(json!({ "filePath": "a.h5p", "masteryScore": bad }));
            assert!(validation_message(&req).contains("between 0 and 100"));
        }
    }

    #[test]
    fn test_string_fields_are_coerced() {
        let req = request(json!({
            "filePath": "/data/Course One.h5p",
            "masteryScore": "75.5",
            "marginX": "10",
            "marginY": 20,
            "maxWidth": "800",
            "restrictWidthAndCenter": "true",
            "showRights": "false"
        }));
        let (path, options) = req.validate().unwrap();
        assert_eq!(path, PathBuf::from("/data/Course One.h5p"));
        assert_eq!(options.mastery_score, 75.5);
        assert_eq!(options.margin_x, 10);
        assert_eq!(options.margin_y, 20);
        assert_eq!(options.effective_max_width(), Some(800));
        assert!(!options.show_rights);
    }

    #[test]
    fn test_defaults_when_absent() {
        let req = request(json!({ "filePath": "a.h5p", "masteryScore": 0 }));
        let (_, options) = req.validate().unwrap();
        assert_eq!(options, ConversionOptions::new(0.0));
    }

    #[test]
    fn test_negative_margin_rejected() {
        let req = request(json!({ "filePath": "a.h5p", "masteryScore": 50, "marginX": -5 }));
        assert!(validation_message(&req).contains("marginX"));
    }

    #[test]
    fn test_restrict_requires_max_width() {
        let req = request(json!({
            "filePath": "a.h5p",
            "masteryScore": 50,
            "restrictWidthAndCenter": true
        }));
        assert!(validation_message(&req).contains("maxWidth"));
    }

    #[test]
    fn test_query_overrides_restrict_flag() {
        let req = request(json!({ "filePath": "a.h5p", "masteryScore": 50, "maxWidth": 640 }))
            .with_query("foo=bar&restrictWidthAndCenter=true");
        let (_, options) = req.validate().unwrap();
        assert_eq!(options.effective_max_width(), Some(640));

        let req = request(json!({
            "filePath": "a.h5p",
            "masteryScore": 50,
            "maxWidth": 640,
            "restrictWidthAndCenter": "true"
        }))
        .with_query("restrictWidthAndCenter=false");
        let (_, options) = req.validate().unwrap();
        assert_eq!(options.effective_max_width(), None);
    }

    #[test]
    fn test_invalid_body() {
        assert!(matches!(
            ConvertRequest::from_json("{not json").unwrap_err(),
            ConvertError::Validation(_)
        ));
    }

    #[test]
    fn test_suggested_file_name() {
        assert_eq!(suggested_file_name(Path::new("/data/Course One.h5p")), "Course One.zip");
        assert_eq!(suggested_file_name(Path::new("quiz")), "quiz.zip");
        assert_eq!(suggested_file_name(Path::new("/")), FALLBACK_FILE_NAME);
    }
}
