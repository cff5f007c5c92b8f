//! Card payload parsing.
//!
//! The dispatcher only checks that a payload is well-formed JSON. What the
//! document means is up to the receiving agent, so no schema is applied.

use crate::error::{CardError, Result};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A parsed card payload.
pub type Payload = Value;

/// The raw payload text is not valid JSON.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid JSON payload: {message}")]
pub struct ValidationError {
    /// The parser's description of the failure, including line and column.
    pub message: String,
}

/// Parse raw payload text.
///
/// Returns the document exactly as parsed. Any JSON value is accepted,
/// including non-object documents.
pub fn validate(raw_payload: &str) -> std::result::Result<Payload, ValidationError> {
    serde_json::from_str(raw_payload).map_err(|e| ValidationError {
        message: e.to_string(),
    })
}

/// Where the raw payload text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    /// Payload given directly on the command line.
    Inline(String),
    /// Payload read from a file.
    File(PathBuf),
    /// Payload read from standard input.
    Stdin,
}

impl PayloadSource {
    /// Build a source from a `--payload-file` argument, where `-` means stdin.
    pub fn from_file_arg(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            PayloadSource::Stdin
        } else {
            PayloadSource::File(path.to_path_buf())
        }
    }
}

/// Read raw payload text without validating it.
///
/// I/O failures here are user errors, not validation errors: the card never
/// reached the dispatcher.
pub fn read_payload(source: &PayloadSource) -> Result<String> {
    match source {
        PayloadSource::Inline(raw) => Ok(raw.clone()),
        PayloadSource::File(path) => std::fs::read_to_string(path).map_err(|e| {
            CardError::UserError(format!(
                "failed to read payload file '{}': {}",
                path.display(),
                e
            ))
        }),
        PayloadSource::Stdin => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .map_err(|e| CardError::UserError(format!("failed to read payload from stdin: {}", e)))?;
            Ok(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_validate_object() {
        let payload = validate(r#"{"msg": "hi"}"#).unwrap();
        assert_eq!(payload, json!({"msg": "hi"}));
    }

    #[test]
    fn test_validate_keeps_nested_structure() {
        let payload = validate(r#"{"a": {"b": [1, 2, null]}, "c": true}"#).unwrap();
        assert_eq!(payload["a"]["b"][1], 2);
        assert_eq!(payload["c"], true);
    }

    #[test]
    fn test_validate_accepts_non_object_documents() {
        assert_eq!(validate("[1, 2]").unwrap(), json!([1, 2]));
        assert_eq!(validate("\"text\"").unwrap(), json!("text"));
        assert_eq!(validate("42").unwrap(), json!(42));
    }

    #[test]
    fn test_validate_rejects_malformed_json() {
        let err = validate("{not valid json").unwrap_err();
        assert!(err.to_string().starts_with("invalid JSON payload:"));
        assert!(err.message.contains("line 1"));
    }

    #[test]
    fn test_validate_rejects_empty_input() {
        assert!(validate("").is_err());
        assert!(validate("   \n").is_err());
    }

    #[test]
    fn test_validate_rejects_trailing_garbage() {
        assert!(validate(r#"{"a": 1} extra"#).is_err());
    }

    #[test]
    fn test_read_inline_payload() {
        let raw = read_payload(&PayloadSource::Inline("{}".to_string())).unwrap();
        assert_eq!(raw, "{}");
    }

    #[test]
    fn test_read_file_payload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("card.json");
        std::fs::write(&path, r#"{"from": "file"}"#).unwrap();

        let raw = read_payload(&PayloadSource::File(path)).unwrap();
        assert_eq!(validate(&raw).unwrap()["from"], "file");
    }

    #[test]
    fn test_read_missing_file_is_user_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");

        let err = read_payload(&PayloadSource::File(path)).unwrap_err();
        assert!(matches!(err, CardError::UserError(_)));
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_dash_means_stdin() {
        assert_eq!(
            PayloadSource::from_file_arg(Path::new("-")),
            PayloadSource::Stdin
        );
        assert_eq!(
            PayloadSource::from_file_arg(Path::new("card.json")),
            PayloadSource::File(PathBuf::from("card.json"))
        );
    }
}
