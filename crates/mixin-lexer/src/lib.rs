//! Logos-based tokenizer for Objective-C headers.
//!
//! Only the surface needed to find interfaces, protocols, categories and
//! their member declarations is distinguished. Everything else still lexes
//! (as `Punct` or `Unknown`) so the parser can skip it.

use logos::Logos;
use std::ops::Range;

/// Kind of a lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Whitespace,
    LineComment,
    BlockComment,
    /// A whole preprocessor line, continuations included
    Directive,
    /// `@interface`, `@end`, `@property`, ...
    AtKeyword,
    Ident,
    Number,
    String,
    /// `@"..."` literal
    ObjcString,
    Char,
    Ellipsis,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Lt,
    Gt,
    Comma,
    Semicolon,
    Colon,
    Star,
    Plus,
    Minus,
    Caret,
    Eq,
    Dot,
    Amp,
    At,
    Punct,
    Unknown,
}

impl TokenKind {
    /// Whitespace and comments
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }
}

/// A token with its kind, source text and byte span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Range<usize>,
}

impl Token<'_> {
    /// True for an identifier spelled exactly `word`
    pub fn is_ident(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }

    /// True for an `@keyword` spelled exactly `word` (including the `@`)
    pub fn is_at_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::AtKeyword && self.text == word
    }
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
    keep_trivia: bool,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, keep_trivia: bool) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            keep_trivia,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let logos_token = self.inner.next()?;
            let kind = match logos_token {
                Ok(t) => t.into(),
                Err(()) => TokenKind::Unknown,
            };

            if kind.is_trivia() && !self.keep_trivia {
                continue;
            }

            return Some(Token {
                kind,
                text: self.inner.slice(),
                span: self.inner.span(),
            });
        }
    }
}

/// Lex a string, dropping whitespace and comments
pub fn lex_str(input: &str) -> Lexer<'_> {
    Lexer::new(input, false)
}

/// Lex a string, keeping whitespace and comments
pub fn lex_with_trivia(input: &str) -> Lexer<'_> {
    Lexer::new(input, true)
}

/// Byte offset to line/column lookup
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(input: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, ch) in input.char_indices() {
            if ch == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// 1-based line and column of a byte offset
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum LogosToken {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    #[regex(r"#([^\\\n]|\\[^\n]|\\\r?\n)*")]
    Directive,

    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*")]
    AtKeyword,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"[0-9][0-9A-Za-z_]*")]
    Number,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,

    #[regex(r#"@"([^"\\\n]|\\.)*""#)]
    ObjcString,

    #[regex(r"'([^'\\\n]|\\.)*'")]
    Char,

    #[token("...")]
    Ellipsis,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("^")]
    Caret,

    #[token("=")]
    Eq,

    #[token(".")]
    Dot,

    #[token("&")]
    Amp,

    #[token("@")]
    At,

    #[regex(r"[!%|~?/\\$`]")]
    Punct,
}

impl From<LogosToken> for TokenKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Whitespace => TokenKind::Whitespace,
            LogosToken::LineComment => TokenKind::LineComment,
            LogosToken::BlockComment => TokenKind::BlockComment,
            LogosToken::Directive => TokenKind::Directive,
            LogosToken::AtKeyword => TokenKind::AtKeyword,
            LogosToken::Ident => TokenKind::Ident,
            LogosToken::Number => TokenKind::Number,
            LogosToken::String => TokenKind::String,
            LogosToken::ObjcString => TokenKind::ObjcString,
            LogosToken::Char => TokenKind::Char,
            LogosToken::Ellipsis => TokenKind::Ellipsis,
            LogosToken::LParen => TokenKind::LParen,
            LogosToken::RParen => TokenKind::RParen,
            LogosToken::LBrace => TokenKind::LBrace,
            LogosToken::RBrace => TokenKind::RBrace,
            LogosToken::LBracket => TokenKind::LBracket,
            LogosToken::RBracket => TokenKind::RBracket,
            LogosToken::Lt => TokenKind::Lt,
            LogosToken::Gt => TokenKind::Gt,
            LogosToken::Comma => TokenKind::Comma,
            LogosToken::Semicolon => TokenKind::Semicolon,
            LogosToken::Colon => TokenKind::Colon,
            LogosToken::Star => TokenKind::Star,
            LogosToken::Plus => TokenKind::Plus,
            LogosToken::Minus => TokenKind::Minus,
            LogosToken::Caret => TokenKind::Caret,
            LogosToken::Eq => TokenKind::Eq,
            LogosToken::Dot => TokenKind::Dot,
            LogosToken::Amp => TokenKind::Amp,
            LogosToken::At => TokenKind::At,
            LogosToken::Punct => TokenKind::Punct,
        }
    }
}
