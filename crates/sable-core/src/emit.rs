//! Css emitter.
//!
//! Flattens nested rules into full selectors and renders the expanded
//! item list in one of the four output styles. Numeric precision and
//! asset-path rewriting are applied to declaration values here.

use crate::lexer::{self, Token};
use crate::options::{Options, OutputStyle};
use crate::parser::{AtRule, BodyItem, Comment, ImportStatement, Item, Rule};

pub(crate) struct Emitter<'a> {
    options: &'a Options,
    out: String,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(options: &'a Options) -> Self {
        Self {
            options,
            out: String::new(),
        }
    }

    pub(crate) fn emit(mut self, items: &[Item]) -> String {
        self.emit_items(items, 0);
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out
    }

    fn compressed(&self) -> bool {
        self.options.style == OutputStyle::Compressed
    }

    fn push_indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
    }

    /// Blank line between sibling blocks in the whitespace-bearing styles.
    fn separate(&mut self) {
        if !self.out.is_empty() && !self.compressed() {
            self.out.push('\n');
        }
    }

    fn emit_items(&mut self, items: &[Item], depth: usize) {
        for item in items {
            match item {
                Item::Comment(comment) => self.emit_comment(comment, depth),
                Item::Import(imp) => self.emit_import(imp, depth),
                Item::AtRule(at) => self.emit_at_rule(at, depth),
                Item::Rule(rule) => self.emit_rule(rule, &[], depth),
            }
        }
    }

    fn emit_comment(&mut self, comment: &Comment, depth: usize) {
        if self.compressed() {
            // only loud comments survive compression
            if comment.text.starts_with("/*!") {
                self.out.push_str(&comment.text);
            }
            return;
        }
        self.separate();
        self.push_indent(depth);
        self.out.push_str(&comment.text);
        self.out.push('\n');
    }

    fn emit_import(&mut self, imp: &ImportStatement, depth: usize) {
        let raw = match imp.targets.first() {
            Some(target) => &target.raw,
            None => return,
        };
        if self.compressed() {
            self.out.push_str("@import ");
            self.out.push_str(raw);
            self.out.push(';');
            return;
        }
        self.separate();
        self.push_indent(depth);
        self.out.push_str("@import ");
        self.out.push_str(raw);
        self.out.push_str(";\n");
    }

    fn emit_at_rule(&mut self, at: &AtRule, depth: usize) {
        let head = if at.prelude.is_empty() {
            at.name.clone()
        } else {
            format!("{} {}", at.name, at.prelude)
        };
        match &at.body {
            None => {
                if self.compressed() {
                    self.out.push_str(&head);
                    self.out.push(';');
                } else {
                    self.separate();
                    self.push_indent(depth);
                    self.out.push_str(&head);
                    self.out.push_str(";\n");
                }
            }
            Some(body) => {
                if self.compressed() {
                    self.out.push_str(&head);
                    self.out.push('{');
                    self.emit_items(body, depth + 1);
                    self.out.push('}');
                } else {
                    self.separate();
                    self.push_indent(depth);
                    self.out.push_str(&head);
                    self.out.push_str(" {\n");
                    self.emit_items(body, depth + 1);
                    self.push_indent(depth);
                    self.out.push_str("}\n");
                }
            }
        }
    }

    fn emit_rule(&mut self, rule: &Rule, parents: &[String], depth: usize) {
        let selectors = combine_selectors(parents, &rule.selector);

        let mut lines: Vec<&BodyItem> = Vec::new();
        let mut nested: Vec<&Rule> = Vec::new();
        for item in &rule.body {
            match item {
                BodyItem::Rule(inner) => nested.push(inner),
                other => lines.push(other),
            }
        }

        if !lines.is_empty() {
            self.write_block(&selectors, &lines, rule, depth);
        }

        let child_depth = if self.options.style == OutputStyle::Nested && !lines.is_empty() {
            depth + 1
        } else {
            depth
        };
        for inner in nested {
            self.emit_rule(inner, &selectors, child_depth);
        }
    }

    fn write_block(&mut self, selectors: &[String], lines: &[&BodyItem], rule: &Rule, depth: usize) {
        if self.options.source_comments && !self.compressed() {
            self.separate();
            self.push_indent(depth);
            self.out
                .push_str(&format!("/* line {}, {} */\n", rule.line, rule.file));
            self.write_block_body(selectors, lines, depth, false);
        } else {
            self.write_block_body(selectors, lines, depth, true);
        }
    }

    fn write_block_body(
        &mut self,
        selectors: &[String],
        lines: &[&BodyItem],
        depth: usize,
        separate: bool,
    ) {
        match self.options.style {
            OutputStyle::Compressed => {
                self.out.push_str(&selectors.join(","));
                self.out.push('{');
                let mut first = true;
                for item in lines {
                    if let BodyItem::Declaration(decl) = item {
                        if !first {
                            self.out.push(';');
                        }
                        first = false;
                        self.out.push_str(&decl.property);
                        self.out.push(':');
                        self.out.push_str(&self.format_value(&decl.value));
                    }
                }
                self.out.push('}');
            }
            OutputStyle::Compact => {
                if separate {
                    self.separate();
                }
                self.push_indent(depth);
                self.out.push_str(&selectors.join(", "));
                self.out.push_str(" {");
                for item in lines {
                    if let BodyItem::Declaration(decl) = item {
                        self.out.push_str(&format!(
                            " {}: {};",
                            decl.property,
                            self.format_value(&decl.value)
                        ));
                    }
                }
                self.out.push_str(" }\n");
            }
            OutputStyle::Nested | OutputStyle::Expanded => {
                if separate {
                    self.separate();
                }
                self.push_indent(depth);
                self.out.push_str(&selectors.join(", "));
                self.out.push_str(" {\n");
                for item in lines {
                    match item {
                        BodyItem::Declaration(decl) => {
                            self.push_indent(depth + 1);
                            self.out.push_str(&format!(
                                "{}: {};\n",
                                decl.property,
                                self.format_value(&decl.value)
                            ));
                        }
                        BodyItem::Comment(comment) => {
                            self.push_indent(depth + 1);
                            self.out.push_str(&comment.text);
                            self.out.push('\n');
                        }
                        BodyItem::Rule(_) => {}
                    }
                }
                self.push_indent(depth);
                self.out.push_str("}\n");
            }
        }
    }

    /// Re-tokenize a declaration value to apply numeric precision and
    /// asset-path rewriting without disturbing anything else.
    fn format_value(&self, value: &str) -> String {
        let tokens = lexer::tokenize(value);
        let mut out = String::new();
        let mut prev_end: Option<usize> = None;
        for tok in tokens {
            if let Some(end) = prev_end {
                if tok.start > end && !out.is_empty() {
                    out.push(' ');
                }
            }
            let raw = &value[tok.start..tok.end];
            match tok.kind {
                Token::Number => out.push_str(&self.format_number(raw)),
                Token::Url => out.push_str(&self.rewrite_url(raw)),
                _ => out.push_str(raw),
            }
            prev_end = Some(tok.end);
        }
        out
    }

    fn format_number(&self, raw: &str) -> String {
        let unit_start = raw
            .find(|c: char| c.is_ascii_alphabetic() || c == '%')
            .unwrap_or(raw.len());
        let (num, unit) = raw.split_at(unit_start);
        if !num.contains('.') {
            return raw.to_string();
        }
        match num.parse::<f64>() {
            Ok(v) => {
                let rounded = format!("{:.*}", self.options.precision as usize, v);
                let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
                format!("{trimmed}{unit}")
            }
            Err(_) => raw.to_string(),
        }
    }

    fn rewrite_url(&self, raw: &str) -> String {
        if self.options.asset_path.is_empty() {
            return raw.to_string();
        }
        let inner = raw[4..raw.len() - 1].trim();
        let quote = inner.chars().next().filter(|c| *c == '"' || *c == '\'');
        let bare = inner.trim_matches(|c| c == '"' || c == '\'');
        let absolute = bare.starts_with('/')
            || bare.starts_with("http://")
            || bare.starts_with("https://")
            || bare.starts_with("data:");
        if absolute || bare.is_empty() {
            return raw.to_string();
        }
        let prefix = self.options.asset_path.trim_end_matches('/');
        match quote {
            Some(q) => format!("url({q}{prefix}/{bare}{q})"),
            None => format!("url({prefix}/{bare})"),
        }
    }
}

/// Flatten a nested selector against its parent selectors. `&` refers to
/// the parent; otherwise the descendant combinator applies.
fn combine_selectors(parents: &[String], selector: &str) -> Vec<String> {
    let children: Vec<&str> = selector.split(',').map(str::trim).collect();
    if parents.is_empty() {
        return children.into_iter().map(str::to_string).collect();
    }
    let mut combined = Vec::with_capacity(parents.len() * children.len());
    for parent in parents {
        for child in &children {
            if child.contains('&') {
                combined.push(child.replace('&', parent));
            } else {
                combined.push(format!("{parent} {child}"));
            }
        }
    }
    combined
}
