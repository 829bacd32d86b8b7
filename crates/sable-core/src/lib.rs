//! Sable stylesheet compiler core.
//!
//! This crate provides the compiler engine:
//! - logos-based lexer and recursive-descent parser
//! - `@import` expansion with an overridable importer hook
//! - nested-rule flattening and four output styles
//! - source map generation
//!
//! Embedders normally do not use this crate directly; the C-compatible
//! surface lives in `sable-ffi` and the host-side binding in
//! `sable-bridge`.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod import;
pub mod lexer;
pub mod options;
pub mod parser;

mod emit;
mod expand;
mod indented;
mod srcmap;

pub use error::{CompileError, CompileResult};
pub use import::{ImportEntry, ImporterHook};
pub use options::{Options, OutputStyle};

use emit::Emitter;
use expand::Expander;
use parser::Parser;

/// The result of a successful compilation.
#[derive(Debug, Clone)]
pub struct Output {
    /// Compiled css text
    pub css: String,
    /// Every file pulled in through `@import`, in resolution order
    pub included_files: Vec<String>,
    /// Source map JSON, when one was requested
    pub source_map: Option<String>,
}

/// A configured compiler engine.
///
/// Borrows its options and (optionally) an importer hook for the duration
/// of one or more compilations.
pub struct Engine<'a, 'h> {
    options: &'a Options,
    importer: Option<&'a mut ImporterHook<'h>>,
}

impl<'a, 'h> Engine<'a, 'h> {
    pub fn new(options: &'a Options) -> Self {
        Self {
            options,
            importer: None,
        }
    }

    pub fn with_importer(options: &'a Options, importer: &'a mut ImporterHook<'h>) -> Self {
        Self {
            options,
            importer: Some(importer),
        }
    }

    /// Compile a source string.
    ///
    /// The entry is named by `input_path` when set, `stdin` otherwise.
    pub fn compile_data(&mut self, source: &str) -> CompileResult<Output> {
        let name = if self.options.input_path.is_empty() {
            "stdin".to_string()
        } else {
            self.options.input_path.clone()
        };
        self.compile_source(source, &name)
    }

    /// Compile the file named by `path`.
    pub fn compile_file(&mut self, path: &str) -> CompileResult<Output> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CompileError::new(
                format!("File to read not found or unreadable: {path} ({e})"),
                1,
                1,
                path,
            )
        })?;
        self.compile_source(&text, path)
    }

    fn compile_source(&mut self, source: &str, name: &str) -> CompileResult<Output> {
        let translated;
        let source = if self.options.indented_syntax {
            translated = indented::to_braced(source);
            &translated
        } else {
            source
        };

        let sheet = Parser::new(source, name).parse()?;

        let mut expander = Expander::new(self.options, self.importer.as_deref_mut());
        expander.begin(name, source);
        let items = expander.expand(sheet, name)?;
        let included_files = std::mem::take(&mut expander.included);
        let sources = std::mem::take(&mut expander.sources);

        let mut css = Emitter::new(self.options).emit(&items);
        let source_map = if self.options.wants_source_map() {
            let map = srcmap::build_map(self.options, &sources);
            srcmap::annotate(&mut css, self.options, &map);
            Some(map)
        } else {
            None
        };

        Ok(Output {
            css,
            included_files,
            source_map,
        })
    }
}
