//! Token types.

use std::fmt;

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Unterminated string or comment; the text holds the message.
    Error,
    Eof,
    Ident,
    /// `@name`
    AtKeyword,
    String,
    /// `#name`
    Hash,
    /// `::name`
    Attachment,
    /// `.name`
    Class,
    /// `name/`
    Instance,
    Number,
    Percentage,
    Dimension,
    Uri,
    UnicodeRange,
    /// `name(`
    Function,
    /// One of `= != > >= < <= =~`.
    Comp,
    Whitespace,
    Comment,
    Bom,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Semicolon,
    Comma,
    Plus,
    Minus,
    Multiply,
    Divide,
    /// Any other single character.
    Char,
}

impl TokenKind {
    /// Tokens the parser never sees.
    pub fn is_skipped(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment | Self::Bom)
    }
}

/// A single lexed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token.
    pub text: String,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
        }
    }

    /// Whether this is an identifier with exactly the given text.
    pub fn is_ident(&self, text: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == text
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("EOF"),
            TokenKind::Error => write!(f, "error: {}", self.text),
            _ => write!(f, "{:?} '{}'", self.kind, self.text),
        }
    }
}
