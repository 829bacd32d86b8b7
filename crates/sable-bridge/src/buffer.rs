//! Transfer buffers for values crossing the engine boundary.

use serde_json::Value;
use std::ffi::CString;
use std::os::raw::c_char;

/// An exclusively owned, NUL-terminated byte buffer.
///
/// Makes ownership across the C boundary explicit: a buffer is either
/// released here (on drop) or handed to the engine exactly once via
/// [`TransferBuffer::into_raw`]. There is no third state, so every exit
/// path, including error paths, releases exactly one allocation per
/// buffer.
#[derive(Debug)]
pub struct TransferBuffer(CString);

impl TransferBuffer {
    /// Build a buffer from an untyped host value.
    ///
    /// Absent and non-string values yield a valid zero-length buffer,
    /// never a shared or null pointer, so downstream code can pass or
    /// release the result without a null check.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => Self::from_str_lossy(s),
            _ => TransferBuffer(CString::default()),
        }
    }

    /// Build a buffer from an optional string with the same empty-value
    /// policy as [`TransferBuffer::from_value`].
    pub fn from_opt(value: Option<&str>) -> Self {
        match value {
            Some(s) => Self::from_str_lossy(s),
            None => TransferBuffer(CString::default()),
        }
    }

    /// Copy a string's UTF-8 bytes into a new owned buffer, dropping
    /// interior NULs.
    pub fn from_str_lossy(s: &str) -> Self {
        let c = CString::new(s).unwrap_or_else(|_| {
            let cleaned: String = s.chars().filter(|c| *c != '\0').collect();
            CString::new(cleaned).unwrap_or_default()
        });
        TransferBuffer(c)
    }

    pub fn is_empty(&self) -> bool {
        self.0.as_bytes().is_empty()
    }

    /// Transfer ownership to the engine. Exactly one release is then the
    /// engine's responsibility; this buffer must not be touched again.
    pub fn into_raw(self) -> *mut c_char {
        self.0.into_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_value_yields_owned_empty_buffer() {
        let buffer = TransferBuffer::from_value(None);
        assert!(buffer.is_empty());
        let raw = buffer.into_raw();
        assert!(!raw.is_null());
        // round-trip: the buffer is independently owned and safe to release
        let reclaimed = unsafe { CString::from_raw(raw) };
        assert_eq!(reclaimed.as_bytes(), b"");
    }

    #[test]
    fn test_non_string_value_yields_empty_buffer() {
        assert!(TransferBuffer::from_value(Some(&json!(42))).is_empty());
        assert!(TransferBuffer::from_value(Some(&json!(null))).is_empty());
        assert!(TransferBuffer::from_value(Some(&json!(["a"]))).is_empty());
    }

    #[test]
    fn test_string_value_is_copied() {
        let value = json!("body{color:red}");
        let buffer = TransferBuffer::from_value(Some(&value));
        let raw = buffer.into_raw();
        let reclaimed = unsafe { CString::from_raw(raw) };
        assert_eq!(reclaimed.as_bytes(), b"body{color:red}");
        // the source value is untouched
        assert_eq!(value, json!("body{color:red}"));
    }

    #[test]
    fn test_interior_nul_dropped() {
        let buffer = TransferBuffer::from_str_lossy("a\0b");
        let reclaimed = unsafe { CString::from_raw(buffer.into_raw()) };
        assert_eq!(reclaimed.as_bytes(), b"ab");
    }
}
