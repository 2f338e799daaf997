//! Tokenizer and the one-token-lookahead stream the parser consumes.

mod scanner;
mod token;

use std::sync::Arc;

pub use scanner::Scanner;
pub use token::{Token, TokenKind};

use tracing::debug;

use crate::logging::targets;
use crate::parser::{ErrorKind, ParseError};
use crate::style::Position;

/// Token stream with a single token of pushback.
///
/// Whitespace, comments and the byte-order mark are skipped. Scanner error
/// tokens surface as [`ParseError`]s of kind [`ErrorKind::Lexer`].
#[derive(Debug, Clone)]
pub struct Lexer {
    scanner: Scanner,
    filename: Option<Arc<str>>,
    last: Option<Token>,
    pending: Option<Token>,
}

impl Lexer {
    /// Create a lexer over `input`, reporting errors against `filename`.
    pub fn new(input: &str, filename: Option<Arc<str>>) -> Self {
        Self {
            scanner: Scanner::new(input),
            filename,
            last: None,
            pending: None,
        }
    }

    /// Return the next significant token.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        if let Some(tok) = self.pending.take() {
            self.last = Some(tok.clone());
            return Ok(tok);
        }
        loop {
            let tok = self.scanner.next_token();
            if tok.kind.is_skipped() {
                continue;
            }
            if tok.kind == TokenKind::Error {
                debug!(target: targets::LEXER, line = tok.line, column = tok.column, "{}", tok.text);
                return Err(ParseError::new(ErrorKind::Lexer, tok.text.clone(), &self.position(&tok)));
            }
            self.last = Some(tok.clone());
            return Ok(tok);
        }
    }

    /// Push the last token back so the next call returns it again.
    ///
    /// # Panics
    ///
    /// Panics when called twice without an intervening
    /// [`next_token`](Self::next_token), or before any token was read.
    pub fn backup(&mut self) {
        assert!(self.pending.is_none(), "internal parser bug: double backup");
        match self.last.take() {
            Some(tok) => self.pending = Some(tok),
            None => panic!("internal parser bug: backup before first token"),
        }
    }

    /// Return the next token without consuming it.
    pub fn peek(&mut self) -> Result<Token, ParseError> {
        let tok = self.next_token()?;
        self.backup();
        Ok(tok)
    }

    /// Source position of `tok` in this lexer's file.
    pub fn position(&self, tok: &Token) -> Position {
        Position {
            filename: self.filename.clone(),
            line: tok.line,
            column: tok.column,
            ..Position::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_whitespace_and_comments() {
        let mut lexer = Lexer::new("\u{FEFF}a /* x */ // y\n b", None);
        assert_eq!(lexer.next_token().unwrap().text, "a");
        assert_eq!(lexer.next_token().unwrap().text, "b");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn backup_and_peek() {
        let mut lexer = Lexer::new("a b", None);
        assert_eq!(lexer.peek().unwrap().text, "a");
        assert_eq!(lexer.next_token().unwrap().text, "a");
        lexer.backup();
        assert_eq!(lexer.next_token().unwrap().text, "a");
        assert_eq!(lexer.next_token().unwrap().text, "b");
    }

    #[test]
    #[should_panic(expected = "double backup")]
    fn double_backup_panics() {
        let mut lexer = Lexer::new("a b", None);
        lexer.next_token().unwrap();
        lexer.backup();
        lexer.backup();
    }

    #[test]
    fn scanner_error_becomes_parse_error() {
        let mut lexer = Lexer::new("a \"b", Some(Arc::from("x.mss")));
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lexer);
        assert_eq!(err.to_string(), "unclosed quotation mark in x.mss line: 1 col: 3");
    }
}
