//! Source positions.

use std::fmt;
use std::sync::Arc;

/// Where a token or declaration appeared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Name of the parsed file, if any.
    pub filename: Option<Arc<str>>,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
    /// Number of the parse call that produced this position (1 for the first file).
    pub file_num: usize,
    /// Declaration index, increasing across all parsed files.
    pub index: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.filename.as_deref().unwrap_or("?"),
            self.line,
            self.column
        )
    }
}
