//! Compile error type and its wire representation.

use serde_json::json;

/// A compilation failure with source position information.
///
/// The `status` field is the numeric code reported across the C surface:
/// zero means success, so a constructed error always carries a non-zero
/// value.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{file}:{line}:{column}: {message}")]
pub struct CompileError {
    /// Human-readable description of what went wrong
    pub message: String,
    /// 1-based line of the offending source position
    pub line: u32,
    /// 1-based column of the offending source position
    pub column: u32,
    /// Name of the file (or `stdin` for string input) the position refers to
    pub file: String,
    /// Non-zero status code
    pub status: i32,
}

impl CompileError {
    /// Create a compile error at the given position.
    pub fn new(message: impl Into<String>, line: u32, column: u32, file: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            file: file.into(),
            status: 1,
        }
    }

    /// Render the error as the JSON payload exposed on the C surface.
    pub fn to_json(&self) -> String {
        json!({
            "status": self.status,
            "file": self.file,
            "line": self.line,
            "column": self.column,
            "message": self.message,
            "formatted": format!("Error: {}\n        on line {} of {}", self.message, self.line, self.file),
        })
        .to_string()
    }
}

/// Compilation result alias.
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_json_payload() {
        let err = CompileError::new("invalid property name", 3, 7, "a.scss");
        let payload: serde_json::Value = serde_json::from_str(&err.to_json()).unwrap();

        assert_eq!(payload["status"], 1);
        assert_eq!(payload["line"], 3);
        assert_eq!(payload["column"], 7);
        assert_eq!(payload["file"], "a.scss");
        assert_eq!(payload["message"], "invalid property name");
    }

    #[test]
    fn test_error_display() {
        let err = CompileError::new("unexpected token", 1, 2, "stdin");
        assert_eq!(err.to_string(), "stdin:1:2: unexpected token");
    }
}
