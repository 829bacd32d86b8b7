//! Host-facing error types.

use serde::Deserialize;
use std::fmt;

/// A structured compile failure, parsed from the engine's error payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CompileFailure {
    pub status: i32,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
    pub message: String,
    #[serde(default)]
    pub formatted: String,
    /// The raw JSON payload as reported by the engine
    #[serde(skip)]
    pub json: String,
}

impl CompileFailure {
    /// Parse the engine's error JSON. A payload that fails to parse is
    /// preserved verbatim as the message rather than dropped.
    pub(crate) fn from_json(json: &str) -> Self {
        match serde_json::from_str::<CompileFailure>(json) {
            Ok(mut failure) => {
                failure.json = json.to_string();
                failure
            }
            Err(_) => CompileFailure {
                status: 1,
                file: String::new(),
                line: 0,
                column: 0,
                message: json.to_string(),
                formatted: String::new(),
                json: json.to_string(),
            },
        }
    }
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(
                f,
                "{}:{}:{}: {}",
                self.file, self.line, self.column, self.message
            )
        }
    }
}

/// Errors surfaced by the render entry points.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The options record is unusable; reported before the engine runs
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The engine reported a compile failure
    #[error("{0}")]
    Compile(CompileFailure),
}

/// Errors surfaced by the import delivery entry point.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The token's compilation has already been retired, or the token was
    /// forged
    #[error("delivery token does not match any live compilation")]
    StaleKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_engine_payload() {
        let json = r#"{"status":1,"file":"a.scss","line":2,"column":5,"message":"boom","formatted":"Error: boom"}"#;
        let failure = CompileFailure::from_json(json);
        assert_eq!(failure.status, 1);
        assert_eq!(failure.file, "a.scss");
        assert_eq!(failure.line, 2);
        assert_eq!(failure.message, "boom");
        assert_eq!(failure.json, json);
        assert_eq!(failure.to_string(), "a.scss:2:5: boom");
    }

    #[test]
    fn test_unparseable_payload_kept_verbatim() {
        let failure = CompileFailure::from_json("not json at all");
        assert_eq!(failure.status, 1);
        assert_eq!(failure.message, "not json at all");
    }
}
