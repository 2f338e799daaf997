//! Color parsing errors.

/// Errors produced when parsing a color literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    /// The input was empty.
    #[error("empty color")]
    Empty,

    /// A `#` literal that is not three or six hex digits.
    #[error("invalid hex color '{0}'")]
    InvalidHex(String),

    /// A name that is not a CSS color.
    #[error("unknown color '{0}'")]
    UnknownName(String),
}
