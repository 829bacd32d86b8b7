//! Expands `@import` statements into a flat stylesheet.
//!
//! Every non-css import is resolved through the importer hook when one is
//! registered, falling back to disk resolution, and the imported file's
//! items are spliced in place of the statement. Css imports pass through
//! unchanged.

use rustc_hash::FxHashSet;
use std::fs;
use tracing::debug;

use crate::error::{CompileError, CompileResult};
use crate::import::{is_css_import, resolve_on_disk, ImportEntry, ImporterHook};
use crate::options::Options;
use crate::parser::{ImportStatement, ImportTarget, Item, Parser, Stylesheet};

pub(crate) struct Expander<'a, 'h> {
    options: &'a Options,
    importer: Option<&'a mut ImporterHook<'h>>,
    /// Every file pulled in during expansion, in resolution order
    pub(crate) included: Vec<String>,
    /// Names already recorded in `included`
    seen: FxHashSet<String>,
    /// Active import chain, for cycle detection
    stack: Vec<String>,
    /// (name, contents) of every source seen, entry first
    pub(crate) sources: Vec<(String, String)>,
}

impl<'a, 'h> Expander<'a, 'h> {
    pub(crate) fn new(options: &'a Options, importer: Option<&'a mut ImporterHook<'h>>) -> Self {
        Self {
            options,
            importer,
            included: Vec::new(),
            seen: FxHashSet::default(),
            stack: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// Record the entry file before expansion starts, so it participates
    /// in cycle detection and in the source map without being listed as an
    /// included file.
    pub(crate) fn begin(&mut self, entry_name: &str, entry_text: &str) {
        self.stack.push(entry_name.to_string());
        self.seen.insert(entry_name.to_string());
        self.sources
            .push((entry_name.to_string(), entry_text.to_string()));
    }

    pub(crate) fn expand(&mut self, sheet: Stylesheet, file: &str) -> CompileResult<Vec<Item>> {
        let mut out = Vec::new();
        for item in sheet.items {
            match item {
                Item::Import(imp) => self.expand_import(imp, file, &mut out)?,
                Item::AtRule(mut at) => {
                    if let Some(body) = at.body.take() {
                        let body = self.expand(Stylesheet { items: body }, file)?;
                        at.body = Some(body);
                    }
                    out.push(Item::AtRule(at));
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }

    fn expand_import(
        &mut self,
        imp: ImportStatement,
        file: &str,
        out: &mut Vec<Item>,
    ) -> CompileResult<()> {
        for target in &imp.targets {
            if is_css_import(&target.specifier, &target.raw) {
                out.push(Item::Import(ImportStatement {
                    targets: vec![target.clone()],
                    line: imp.line,
                    column: imp.column,
                }));
                continue;
            }

            debug!(specifier = %target.specifier, parent = %file, "resolving import");

            let reply = match self.importer.as_deref_mut() {
                Some(hook) => hook(&target.specifier, file),
                None => None,
            };
            match reply {
                Some(entries) => {
                    for entry in entries {
                        self.apply_entry(entry, target, &imp, file, out)?;
                    }
                }
                None => self.import_from_disk(&target.specifier, &imp, file, out)?,
            }
        }
        Ok(())
    }

    fn apply_entry(
        &mut self,
        entry: ImportEntry,
        target: &ImportTarget,
        imp: &ImportStatement,
        file: &str,
        out: &mut Vec<Item>,
    ) -> CompileResult<()> {
        if let Some(message) = entry.error {
            return Err(self.import_error(message, imp, file));
        }
        let named = entry.path.filter(|p| !p.is_empty());
        match entry.contents {
            Some(text) => {
                let name = named.unwrap_or_else(|| target.specifier.clone());
                self.import_source(text, name, imp, file, out)
            }
            None => {
                let specifier = named.unwrap_or_else(|| target.specifier.clone());
                self.import_from_disk(&specifier, imp, file, out)
            }
        }
    }

    fn import_from_disk(
        &mut self,
        specifier: &str,
        imp: &ImportStatement,
        file: &str,
        out: &mut Vec<Item>,
    ) -> CompileResult<()> {
        let Some(path) = resolve_on_disk(specifier, file, &self.options.include_paths) else {
            return Err(self.import_error(
                format!("File to import not found or unreadable: {specifier}"),
                imp,
                file,
            ));
        };
        debug!(path = %path.display(), "import resolved on disk");
        let text = fs::read_to_string(&path).map_err(|e| {
            self.import_error(
                format!("File to import not found or unreadable: {specifier} ({e})"),
                imp,
                file,
            )
        })?;
        let name = path.to_string_lossy().into_owned();
        self.import_source(text, name, imp, file, out)
    }

    fn import_source(
        &mut self,
        text: String,
        name: String,
        imp: &ImportStatement,
        file: &str,
        out: &mut Vec<Item>,
    ) -> CompileResult<()> {
        if self.stack.iter().any(|active| *active == name) {
            return Err(self.import_error(
                format!("circular import of \"{name}\""),
                imp,
                file,
            ));
        }
        if self.seen.insert(name.clone()) {
            self.included.push(name.clone());
            self.sources.push((name.clone(), text.clone()));
        }

        let sheet = Parser::new(&text, &name).parse()?;
        self.stack.push(name.clone());
        let items = self.expand(sheet, &name);
        self.stack.pop();
        out.extend(items?);
        Ok(())
    }

    fn import_error(
        &self,
        message: impl Into<String>,
        imp: &ImportStatement,
        file: &str,
    ) -> CompileError {
        CompileError::new(message, imp.line, imp.column, file)
    }
}
