//! Tokenizer for the stylesheet syntax.
//!
//! Built on the logos library. Whitespace and line comments are skipped
//! during lexing; the parser re-derives inter-token spacing from the byte
//! spans when it reassembles selector and value text, so nothing about
//! layout needs to survive in the tokens themselves.

use logos::Logos;

/// Logos-based token enum for lexing.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    // Whitespace and line comments (skip)
    #[regex(r"[ \t\r\n]+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)]
    Whitespace,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    // Block comments are preserved as tokens so the emitter can keep them
    #[regex(r"/\*", lex_block_comment)]
    Comment,

    #[regex(r#""([^"\\]|\\.)*""#)]
    DoubleQuoted,

    #[regex(r"'([^'\\]|\\.)*'")]
    SingleQuoted,

    #[regex(r"@[a-zA-Z-][a-zA-Z0-9-]*")]
    AtKeyword,

    // A whole url(...) term lexes as one token so embedded colons and
    // quotes cannot split a value
    #[regex(r"url\([^)\n]*\)", priority = 6)]
    Url,

    #[regex(r"-?([0-9]+\.[0-9]+|[0-9]+|\.[0-9]+)(%|[a-zA-Z]+)?", priority = 5)]
    Number,

    // Any run of characters that cannot start one of the tokens above
    #[regex(r#"[^{};,:\s"'@/]+"#)]
    Word,

    // Fallback for stray punctuation ('/', lone '@', unterminated quotes)
    #[regex(r".", priority = 0)]
    Delim,
}

/// Consume a block comment through its terminating `*/`. An unterminated
/// comment runs to end of input.
fn lex_block_comment(lex: &mut logos::Lexer<'_, Token>) -> bool {
    let remainder = lex.remainder();
    match remainder.find("*/") {
        Some(end) => lex.bump(end + 2),
        None => lex.bump(remainder.len()),
    }
    true
}

/// A token together with its byte span in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpannedToken {
    pub kind: Token,
    pub start: usize,
    pub end: usize,
}

/// Tokenize a source string.
///
/// Lex errors cannot occur: every character is covered by the fallback
/// pattern, and malformed input is reported by the parser with a position
/// instead.
pub fn tokenize(source: &str) -> Vec<SpannedToken> {
    Token::lexer(source)
        .spanned()
        .filter_map(|(result, span)| {
            result.ok().map(|kind| SpannedToken {
                kind,
                start: span.start,
                end: span.end,
            })
        })
        .collect()
}

/// Map a byte offset to a 1-based (line, column) pair.
pub fn line_col(source: &str, offset: usize) -> (u32, u32) {
    let offset = offset.min(source.len());
    let mut line = 1u32;
    let mut line_start = 0usize;
    for (i, b) in source.as_bytes()[..offset].iter().enumerate() {
        if *b == b'\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    (line, (offset - line_start) as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_rule() {
        assert_eq!(
            kinds("a{b:1}"),
            vec![
                Token::Word,
                Token::LBrace,
                Token::Word,
                Token::Colon,
                Token::Number,
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn test_import_statement() {
        assert_eq!(
            kinds("@import \"a\", 'b';"),
            vec![
                Token::AtKeyword,
                Token::DoubleQuoted,
                Token::Comma,
                Token::SingleQuoted,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_url_is_one_token() {
        assert_eq!(
            kinds("background: url(http://example.com/x.png);"),
            vec![
                Token::Word,
                Token::Colon,
                Token::Url,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_block_comment_token() {
        let toks = tokenize("/* hi */ a");
        assert_eq!(toks[0].kind, Token::Comment);
        assert_eq!(&"/* hi */ a"[toks[0].start..toks[0].end], "/* hi */");
        assert_eq!(toks[1].kind, Token::Word);
    }

    #[test]
    fn test_unterminated_comment_runs_to_eof() {
        let toks = tokenize("/* never closed");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, Token::Comment);
    }

    #[test]
    fn test_line_comment_skipped() {
        assert_eq!(kinds("// nothing\na"), vec![Token::Word]);
    }

    #[test]
    fn test_slash_in_value_is_delim() {
        assert_eq!(
            kinds("font: 12px/1.5"),
            vec![
                Token::Word,
                Token::Colon,
                Token::Number,
                Token::Delim,
                Token::Number,
            ]
        );
    }

    #[test]
    fn test_line_col() {
        let src = "ab\ncd\nef";
        assert_eq!(line_col(src, 0), (1, 1));
        assert_eq!(line_col(src, 1), (1, 2));
        assert_eq!(line_col(src, 3), (2, 1));
        assert_eq!(line_col(src, 7), (3, 2));
    }
}
