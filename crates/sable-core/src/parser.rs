//! Recursive-descent parser over the token stream.
//!
//! Selector, property, and value text is reassembled from raw token
//! slices, inserting a single space wherever the source had whitespace
//! between tokens. Position information is derived lazily from byte
//! offsets when a node or an error needs it.

use crate::error::{CompileError, CompileResult};
use crate::lexer::{self, SpannedToken, Token};

/// A parsed stylesheet.
#[derive(Debug, Clone)]
pub struct Stylesheet {
    pub items: Vec<Item>,
}

/// A top-level (or at-rule-nested) stylesheet item.
#[derive(Debug, Clone)]
pub enum Item {
    Import(ImportStatement),
    Rule(Rule),
    AtRule(AtRule),
    Comment(Comment),
}

/// An `@import` statement with one or more targets.
#[derive(Debug, Clone)]
pub struct ImportStatement {
    pub targets: Vec<ImportTarget>,
    pub line: u32,
    pub column: u32,
}

/// One target of an `@import` statement.
#[derive(Debug, Clone)]
pub struct ImportTarget {
    /// The unquoted import specifier
    pub specifier: String,
    /// The original source text of the target, kept for css passthrough
    pub raw: String,
}

/// A rule set: selector plus declaration block.
#[derive(Debug, Clone)]
pub struct Rule {
    pub selector: String,
    pub body: Vec<BodyItem>,
    pub line: u32,
    /// File the rule was parsed from, for source comments
    pub file: String,
}

/// An item inside a declaration block.
#[derive(Debug, Clone)]
pub enum BodyItem {
    Declaration(Declaration),
    Rule(Rule),
    Comment(Comment),
}

/// A single `property: value` declaration.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub line: u32,
}

/// An at-rule other than `@import`, either statement form (`@charset ...;`)
/// or block form (`@media ... { ... }`).
#[derive(Debug, Clone)]
pub struct AtRule {
    pub name: String,
    pub prelude: String,
    pub body: Option<Vec<Item>>,
    pub line: u32,
}

/// A preserved block comment.
#[derive(Debug, Clone)]
pub struct Comment {
    pub text: String,
    pub line: u32,
}

pub struct Parser<'src> {
    source: &'src str,
    file: String,
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, file: impl Into<String>) -> Self {
        Self {
            source,
            file: file.into(),
            tokens: lexer::tokenize(source),
            pos: 0,
        }
    }

    pub fn parse(mut self) -> CompileResult<Stylesheet> {
        let items = self.parse_items(true)?;
        Ok(Stylesheet { items })
    }

    fn peek(&self) -> Option<SpannedToken> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<SpannedToken> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn slice(&self, tok: SpannedToken) -> &'src str {
        &self.source[tok.start..tok.end]
    }

    fn offset(&self) -> usize {
        self.peek().map(|t| t.start).unwrap_or(self.source.len())
    }

    fn line_of(&self, offset: usize) -> u32 {
        lexer::line_col(self.source, offset).0
    }

    fn error_at(&self, message: impl Into<String>, offset: usize) -> CompileError {
        let (line, column) = lexer::line_col(self.source, offset);
        CompileError::new(message, line, column, &self.file)
    }

    fn error_here(&self, message: impl Into<String>) -> CompileError {
        self.error_at(message, self.offset())
    }

    fn parse_items(&mut self, top: bool) -> CompileResult<Vec<Item>> {
        let mut items = Vec::new();
        while let Some(tok) = self.peek() {
            match tok.kind {
                Token::RBrace if !top => break,
                Token::RBrace => return Err(self.error_here("unmatched \"}\"")),
                Token::Semicolon => {
                    self.bump();
                }
                Token::Comment => {
                    self.bump();
                    items.push(Item::Comment(Comment {
                        text: self.slice(tok).to_string(),
                        line: self.line_of(tok.start),
                    }));
                }
                Token::AtKeyword => {
                    if self.slice(tok) == "@import" {
                        items.push(Item::Import(self.parse_import()?));
                    } else {
                        items.push(Item::AtRule(self.parse_at_rule()?));
                    }
                }
                _ => items.push(Item::Rule(self.parse_rule()?)),
            }
        }
        Ok(items)
    }

    fn parse_import(&mut self) -> CompileResult<ImportStatement> {
        let Some(at) = self.bump() else {
            return Err(self.error_here("expected \"@import\""));
        };
        let (line, column) = lexer::line_col(self.source, at.start);
        let mut targets = Vec::new();
        loop {
            let Some(tok) = self.bump() else {
                return Err(self.error_here("expected an import target after \"@import\""));
            };
            let raw = self.slice(tok).to_string();
            let specifier = match tok.kind {
                Token::DoubleQuoted | Token::SingleQuoted => raw[1..raw.len() - 1].to_string(),
                Token::Url => raw[4..raw.len() - 1]
                    .trim()
                    .trim_matches(|c| c == '"' || c == '\'')
                    .to_string(),
                Token::Word | Token::Number => raw.clone(),
                _ => {
                    return Err(
                        self.error_at("expected a string or url() after \"@import\"", tok.start)
                    )
                }
            };
            targets.push(ImportTarget { specifier, raw });
            match self.peek().map(|t| t.kind) {
                Some(Token::Comma) => {
                    self.bump();
                }
                Some(Token::Semicolon) => {
                    self.bump();
                    break;
                }
                None => break,
                _ => return Err(self.error_here("expected \";\" after @import statement")),
            }
        }
        Ok(ImportStatement {
            targets,
            line,
            column,
        })
    }

    fn parse_at_rule(&mut self) -> CompileResult<AtRule> {
        let Some(at) = self.bump() else {
            return Err(self.error_here("expected an at-rule"));
        };
        let line = self.line_of(at.start);
        let name = self.slice(at).to_string();
        let (prelude, stop) = self.collect_text(&[Token::LBrace, Token::Semicolon]);
        match stop {
            Some(Token::LBrace) => {
                self.bump();
                let body = self.parse_items(false)?;
                self.expect_rbrace()?;
                Ok(AtRule {
                    name,
                    prelude,
                    body: Some(body),
                    line,
                })
            }
            Some(Token::Semicolon) => {
                self.bump();
                Ok(AtRule {
                    name,
                    prelude,
                    body: None,
                    line,
                })
            }
            _ => Ok(AtRule {
                name,
                prelude,
                body: None,
                line,
            }),
        }
    }

    fn parse_rule(&mut self) -> CompileResult<Rule> {
        let start = self.offset();
        let line = self.line_of(start);
        let (selector, stop) = self.collect_text(&[Token::LBrace, Token::Semicolon, Token::RBrace]);
        if stop != Some(Token::LBrace) {
            return Err(self.error_here(format!("expected \"{{\" after \"{selector}\"")));
        }
        self.bump();
        let body = self.parse_body()?;
        Ok(Rule {
            selector,
            body,
            line,
            file: self.file.clone(),
        })
    }

    fn parse_body(&mut self) -> CompileResult<Vec<BodyItem>> {
        let mut body = Vec::new();
        loop {
            let Some(tok) = self.peek() else {
                return Err(self.error_here("expected \"}\", was end of file"));
            };
            match tok.kind {
                Token::RBrace => {
                    self.bump();
                    return Ok(body);
                }
                Token::Semicolon => {
                    self.bump();
                }
                Token::Comment => {
                    self.bump();
                    body.push(BodyItem::Comment(Comment {
                        text: self.slice(tok).to_string(),
                        line: self.line_of(tok.start),
                    }));
                }
                Token::AtKeyword => {
                    return Err(self.error_at(
                        "at-rules are not allowed inside declaration blocks",
                        tok.start,
                    ))
                }
                _ => {
                    if self.block_ahead() {
                        body.push(BodyItem::Rule(self.parse_rule()?));
                    } else {
                        body.push(BodyItem::Declaration(self.parse_declaration()?));
                    }
                }
            }
        }
    }

    /// Look ahead to decide whether the upcoming run of tokens opens a
    /// nested rule (`{` seen first) or is a declaration (`;` or `}` seen
    /// first). Needed because pseudo-class selectors contain colons.
    fn block_ahead(&self) -> bool {
        for tok in &self.tokens[self.pos..] {
            match tok.kind {
                Token::LBrace => return true,
                Token::Semicolon | Token::RBrace => return false,
                _ => {}
            }
        }
        false
    }

    fn parse_declaration(&mut self) -> CompileResult<Declaration> {
        let start = self.offset();
        let line = self.line_of(start);
        let (property, stop) =
            self.collect_text(&[Token::Colon, Token::Semicolon, Token::LBrace, Token::RBrace]);
        if stop != Some(Token::Colon) {
            return Err(self.error_here(format!("expected \":\" after \"{property}\"")));
        }
        self.bump();
        let (value, _) = self.collect_text(&[Token::Semicolon, Token::RBrace]);
        if value.is_empty() {
            return Err(self.error_here(format!("expected a value for \"{property}\"")));
        }
        Ok(Declaration {
            property,
            value,
            line,
        })
    }

    fn expect_rbrace(&mut self) -> CompileResult<()> {
        match self.peek() {
            Some(tok) if tok.kind == Token::RBrace => {
                self.bump();
                Ok(())
            }
            _ => Err(self.error_here("expected \"}\"")),
        }
    }

    /// Collect raw token text until one of `stops` (not consumed) or end of
    /// input, joining tokens with a single space wherever the source had
    /// whitespace between them.
    fn collect_text(&mut self, stops: &[Token]) -> (String, Option<Token>) {
        let mut text = String::new();
        let mut prev_end: Option<usize> = None;
        while let Some(tok) = self.peek() {
            if stops.contains(&tok.kind) {
                return (text, Some(tok.kind));
            }
            self.bump();
            if let Some(end) = prev_end {
                if tok.start > end && !text.is_empty() {
                    text.push(' ');
                }
            }
            text.push_str(self.slice(tok));
            prev_end = Some(tok.end);
        }
        (text, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> CompileResult<Stylesheet> {
        Parser::new(source, "test.scss").parse()
    }

    #[test]
    fn test_simple_rule() {
        let sheet = parse("a { b: 1; }").unwrap();
        assert_eq!(sheet.items.len(), 1);
        let Item::Rule(rule) = &sheet.items[0] else {
            panic!("expected a rule");
        };
        assert_eq!(rule.selector, "a");
        let BodyItem::Declaration(decl) = &rule.body[0] else {
            panic!("expected a declaration");
        };
        assert_eq!(decl.property, "b");
        assert_eq!(decl.value, "1");
    }

    #[test]
    fn test_selector_spacing_preserved() {
        let sheet = parse("a   b > c { d: e; }").unwrap();
        let Item::Rule(rule) = &sheet.items[0] else {
            panic!("expected a rule");
        };
        assert_eq!(rule.selector, "a b > c");
    }

    #[test]
    fn test_pseudo_class_selector() {
        let sheet = parse("a:hover { color: red }").unwrap();
        let Item::Rule(rule) = &sheet.items[0] else {
            panic!("expected a rule");
        };
        assert_eq!(rule.selector, "a:hover");
    }

    #[test]
    fn test_nested_rule() {
        let sheet = parse("a { b: 1; c { d: 2 } }").unwrap();
        let Item::Rule(rule) = &sheet.items[0] else {
            panic!("expected a rule");
        };
        assert_eq!(rule.body.len(), 2);
        let BodyItem::Rule(nested) = &rule.body[1] else {
            panic!("expected a nested rule");
        };
        assert_eq!(nested.selector, "c");
    }

    #[test]
    fn test_import_targets() {
        let sheet = parse("@import \"a\", 'b';").unwrap();
        let Item::Import(imp) = &sheet.items[0] else {
            panic!("expected an import");
        };
        let specs: Vec<_> = imp.targets.iter().map(|t| t.specifier.as_str()).collect();
        assert_eq!(specs, vec!["a", "b"]);
    }

    #[test]
    fn test_import_url_target() {
        let sheet = parse("@import url(http://example.com/a.css);").unwrap();
        let Item::Import(imp) = &sheet.items[0] else {
            panic!("expected an import");
        };
        assert_eq!(imp.targets[0].specifier, "http://example.com/a.css");
        assert_eq!(imp.targets[0].raw, "url(http://example.com/a.css)");
    }

    #[test]
    fn test_media_at_rule() {
        let sheet = parse("@media screen and (min-width: 100px) { a { b: c } }").unwrap();
        let Item::AtRule(at) = &sheet.items[0] else {
            panic!("expected an at-rule");
        };
        assert_eq!(at.name, "@media");
        assert_eq!(at.prelude, "screen and (min-width: 100px)");
        assert_eq!(at.body.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_charset_statement_at_rule() {
        let sheet = parse("@charset \"UTF-8\";").unwrap();
        let Item::AtRule(at) = &sheet.items[0] else {
            panic!("expected an at-rule");
        };
        assert_eq!(at.name, "@charset");
        assert!(at.body.is_none());
    }

    #[test]
    fn test_unclosed_block_is_an_error() {
        let err = parse("a{").unwrap_err();
        assert!(!err.message.is_empty());
        assert_eq!(err.line, 1);
        assert_eq!(err.file, "test.scss");
    }

    #[test]
    fn test_missing_value_is_an_error() {
        let err = parse("a { b: }").unwrap_err();
        assert!(err.message.contains('b'));
    }

    #[test]
    fn test_unmatched_close_brace() {
        assert!(parse("}").is_err());
    }

    #[test]
    fn test_comment_preserved() {
        let sheet = parse("/* keep me */ a { b: 1 }").unwrap();
        let Item::Comment(comment) = &sheet.items[0] else {
            panic!("expected a comment");
        };
        assert_eq!(comment.text, "/* keep me */");
    }
}
