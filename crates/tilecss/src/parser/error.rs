//! Parse errors and warnings.

use std::fmt;
use std::sync::Arc;

use crate::style::Position;

/// Which stage of compilation raised a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unterminated string or comment.
    Lexer,
    /// Unexpected token or invalid construct.
    Syntax,
    /// Missing variable, type mismatch or unsupported operation.
    Evaluation,
}

/// Fatal error with location information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The stage that failed.
    pub kind: ErrorKind,
    /// File being parsed, if known.
    pub filename: Option<Arc<str>>,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
    /// The error message describing what went wrong.
    pub message: String,
}

impl ParseError {
    /// Create a new error at the given position.
    pub fn new(kind: ErrorKind, message: impl Into<String>, position: &Position) -> Self {
        Self {
            kind,
            filename: position.filename.clone(),
            line: position.line,
            column: position.column,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_located(f, &self.message, self.filename.as_deref(), self.line, self.column)
    }
}

impl std::error::Error for ParseError {}

/// Non-fatal diagnostic collected during evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// File the offending declaration came from.
    pub filename: Option<Arc<str>>,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
    /// Description of the problem.
    pub message: String,
}

impl Warning {
    pub(crate) fn new(message: impl Into<String>, position: &Position) -> Self {
        Self {
            filename: position.filename.clone(),
            line: position.line,
            column: position.column,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_located(f, &self.message, self.filename.as_deref(), self.line, self.column)
    }
}

fn write_located(
    f: &mut fmt::Formatter<'_>,
    message: &str,
    filename: Option<&str>,
    line: u32,
    column: u32,
) -> fmt::Result {
    write!(
        f,
        "{} in {} line: {} col: {}",
        message,
        filename.unwrap_or("?"),
        line,
        column
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let pos = Position {
            filename: Some(Arc::from("style.mss")),
            line: 3,
            column: 14,
            ..Position::default()
        };
        let err = ParseError::new(ErrorKind::Syntax, "unexpected token", &pos);
        assert_eq!(err.to_string(), "unexpected token in style.mss line: 3 col: 14");

        let warning = Warning::new("invalid property foo 1", &Position::default());
        assert_eq!(warning.to_string(), "invalid property foo 1 in ? line: 0 col: 0");
    }
}
