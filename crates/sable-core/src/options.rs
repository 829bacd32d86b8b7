//! Engine configuration.

use std::path::PathBuf;

/// Output formatting style.
///
/// The discriminant values are part of the C surface and are marshaled as
/// plain integers by embedders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum OutputStyle {
    /// Nested blocks indented to reflect their source nesting
    #[default]
    Nested = 0,
    /// One declaration per line, uniform indentation
    Expanded = 1,
    /// One rule per line
    Compact = 2,
    /// Minimal whitespace
    Compressed = 3,
}

impl OutputStyle {
    /// Decode a style from its wire integer. Unknown values fall back to
    /// `Nested`, matching the engine's tolerance for junk option input.
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => OutputStyle::Expanded,
            2 => OutputStyle::Compact,
            3 => OutputStyle::Compressed,
            _ => OutputStyle::Nested,
        }
    }
}

/// Compilation options.
///
/// The engine performs no validation: callers are responsible for
/// providing semantically valid values.
#[derive(Debug, Clone)]
pub struct Options {
    /// Path of the entry file; empty for string input
    pub input_path: String,
    /// Path the output is destined for (used in source map `file`)
    pub output_path: String,
    /// Prefix prepended to relative `url(...)` values
    pub asset_path: String,
    /// Output formatting style
    pub style: OutputStyle,
    /// Treat the input as indented syntax and translate it before lexing
    pub indented_syntax: bool,
    /// Emit a `/* line N, file */` comment before every rule
    pub source_comments: bool,
    /// Suppress the trailing `sourceMappingURL` comment
    pub omit_source_map_url: bool,
    /// Inline the source map into the css as a base64 data URI
    pub source_map_embed: bool,
    /// Include the full text of every source in the map
    pub source_map_contents: bool,
    /// Emit a source map destined for this file
    pub source_map_file: Option<String>,
    /// Directories searched when resolving imports from disk
    pub include_paths: Vec<PathBuf>,
    /// Maximum number of decimal places kept on numeric values
    pub precision: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            input_path: String::new(),
            output_path: String::new(),
            asset_path: String::new(),
            style: OutputStyle::Nested,
            indented_syntax: false,
            source_comments: false,
            omit_source_map_url: false,
            source_map_embed: false,
            source_map_contents: false,
            source_map_file: None,
            include_paths: Vec::new(),
            precision: 5,
        }
    }
}

impl Options {
    /// Whether this compilation produces a source map at all.
    pub(crate) fn wants_source_map(&self) -> bool {
        self.source_map_file.is_some() || self.source_map_embed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_round_trip() {
        for style in [
            OutputStyle::Nested,
            OutputStyle::Expanded,
            OutputStyle::Compact,
            OutputStyle::Compressed,
        ] {
            assert_eq!(OutputStyle::from_i32(style as i32), style);
        }
    }

    #[test]
    fn test_unknown_style_falls_back_to_nested() {
        assert_eq!(OutputStyle::from_i32(99), OutputStyle::Nested);
        assert_eq!(OutputStyle::from_i32(-1), OutputStyle::Nested);
    }

    #[test]
    fn test_default_precision() {
        assert_eq!(Options::default().precision, 5);
    }
}
