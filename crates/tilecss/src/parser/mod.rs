//! Stylesheet parsing and evaluation.
//!
//! [`Decoder`] turns source text into a block tree of selectors and
//! declarations, then evaluates every declaration once all sources are
//! parsed.

mod decoder;
mod error;
mod variables;

pub use decoder::Decoder;
pub use error::{ErrorKind, ParseError, Warning};
