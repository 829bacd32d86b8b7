//! Import target classification and filesystem resolution.
//!
//! Handles the two classes of `@import` targets:
//! - plain-css imports (`.css` files, urls) which pass through to the
//!   output untouched
//! - sable imports, resolved either through a registered importer hook or
//!   from disk with partial-file conventions

use std::path::{Path, PathBuf};

/// One resolution produced by an importer hook.
///
/// `contents` present means a virtual file: the text is compiled under the
/// name given by `path` (or the requested specifier when `path` is empty)
/// and the filesystem is never consulted. `contents` absent means `path`
/// (or the requested specifier) is resolved from disk. `error` present
/// fails the compilation at the importing location.
#[derive(Debug, Clone, Default)]
pub struct ImportEntry {
    pub path: Option<String>,
    pub contents: Option<String>,
    pub source_map: Option<String>,
    pub error: Option<String>,
}

impl ImportEntry {
    /// An entry that redirects resolution to another path on disk.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// An entry carrying literal contents for a virtual file.
    pub fn literal(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            contents: Some(contents.into()),
            ..Default::default()
        }
    }

    /// An entry reporting a resolution failure.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Hook consulted for every non-css import before disk resolution.
///
/// Arguments are the requested specifier and the path of the importing
/// file. `None` defers to the engine's own disk resolution; an empty list
/// expands the import to nothing.
pub type ImporterHook<'h> = dyn FnMut(&str, &str) -> Option<Vec<ImportEntry>> + 'h;

/// Whether an import target is plain css and passes through untouched.
pub fn is_css_import(specifier: &str, raw: &str) -> bool {
    specifier.ends_with(".css")
        || specifier.starts_with("http://")
        || specifier.starts_with("https://")
        || specifier.starts_with("//")
        || raw.starts_with("url(")
}

/// Resolve an import specifier on disk.
///
/// The specifier is tried relative to the importing file's directory and
/// then each include path, in order. Within each base directory the
/// candidates are the specifier with an `.scss` extension, its `_`-prefixed
/// partial form, and the literal name.
pub fn resolve_on_disk(
    specifier: &str,
    parent: &str,
    include_paths: &[PathBuf],
) -> Option<PathBuf> {
    let mut bases: Vec<PathBuf> = Vec::with_capacity(include_paths.len() + 1);
    bases.push(
        Path::new(parent)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    );
    bases.extend(include_paths.iter().cloned());

    let candidates = candidates(specifier);
    for base in &bases {
        for candidate in &candidates {
            let path = base.join(candidate);
            if path.is_file() {
                return Some(path);
            }
        }
    }
    None
}

fn candidates(specifier: &str) -> Vec<String> {
    if specifier.ends_with(".scss") {
        vec![specifier.to_string(), partialize(specifier)]
    } else {
        let with_ext = format!("{specifier}.scss");
        vec![
            with_ext.clone(),
            partialize(&with_ext),
            specifier.to_string(),
        ]
    }
}

/// Prefix the file component of a specifier with `_`.
fn partialize(specifier: &str) -> String {
    match specifier.rfind('/') {
        Some(idx) => format!("{}/_{}", &specifier[..idx], &specifier[idx + 1..]),
        None => format!("_{specifier}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_css_import_classification() {
        assert!(is_css_import("a.css", "\"a.css\""));
        assert!(is_css_import("http://x/y", "\"http://x/y\""));
        assert!(is_css_import("//cdn/y", "\"//cdn/y\""));
        assert!(is_css_import("a", "url(a)"));
        assert!(!is_css_import("a", "\"a\""));
        assert!(!is_css_import("partials/base", "\"partials/base\""));
    }

    #[test]
    fn test_partialize_keeps_directory() {
        assert_eq!(partialize("a.scss"), "_a.scss");
        assert_eq!(partialize("dir/a.scss"), "dir/_a.scss");
    }

    #[test]
    fn test_disk_resolution_prefers_extension_then_partial() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("_a.scss"), "x { y: 1 }").unwrap();
        let found = resolve_on_disk("a", "entry.scss", &[dir.path().to_path_buf()]).unwrap();
        assert!(found.ends_with("_a.scss"));

        fs::write(dir.path().join("a.scss"), "x { y: 2 }").unwrap();
        let found = resolve_on_disk("a", "entry.scss", &[dir.path().to_path_buf()]).unwrap();
        assert!(found.ends_with("a.scss"));
        assert!(!found.ends_with("_a.scss"));
    }

    #[test]
    fn test_disk_resolution_relative_to_parent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.scss"), "x { y: 1 }").unwrap();
        let parent = dir.path().join("entry.scss");
        let found = resolve_on_disk("b", parent.to_str().unwrap(), &[]).unwrap();
        assert!(found.ends_with("b.scss"));
    }

    #[test]
    fn test_disk_resolution_missing() {
        assert!(resolve_on_disk("nope", "entry.scss", &[]).is_none());
    }
}
