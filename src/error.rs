//! Structured error types for the report engine.
//!
//! Only configuration-level failures surface here. Data anomalies inside a
//! single node (an undecodable image, a malformed checkbox payload) are logged
//! and skipped so the rest of the report still renders.

use thiserror::Error;

/// The unified error type returned by all public API functions.
#[derive(Debug, Error)]
pub enum ReportError {
    /// JSON input failed to parse as a valid report document.
    #[error("Failed to parse report document: {source}{}", format_hint(.hint))]
    Parse {
        source: serde_json::Error,
        hint: String,
    },
    /// No text style is defined on a node or any of its ancestors.
    #[error("Cannot find a text style for node {node} or any of its parents")]
    MissingTextStyle { node: String },
    /// A raster image payload could not be loaded.
    #[error("Image error: {0}")]
    Image(String),
    /// A vector picture payload could not be parsed.
    #[error("Picture error: {0}")]
    Picture(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the report schema. Check item kinds and field names.".to_string()
            }
            serde_json::error::Category::Eof => "Unexpected end of input, is the JSON truncated?".to_string(),
            serde_json::error::Category::Io => String::new(),
        };
        ReportError::Parse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_carries_hint() {
        let err: ReportError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to parse report document"));
        assert!(msg.contains("Hint: Check for trailing commas"));
    }

    #[test]
    fn test_io_error_converts() {
        let err: ReportError = std::io::Error::new(std::io::ErrorKind::NotFound, "report.json").into();
        assert!(matches!(err, ReportError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: report.json");
    }

    #[test]
    fn test_missing_text_style_message() {
        let err = ReportError::MissingTextStyle {
            node: "#3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot find a text style for node #3 or any of its parents"
        );
    }
}
