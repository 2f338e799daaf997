//! Compiler for cascading map stylesheets (MSS).
//!
//! This crate turns CartoCSS-like stylesheets into flat, resolved rule lists
//! that a renderer can apply feature by feature:
//!
//! - **Lexer**: tokens with line and column positions
//! - **Parser**: nested rule blocks, selectors, variables and the `Map {}` block
//! - **Expressions**: arithmetic, color functions, lists and stops
//! - **Cascade**: per-layer rules with inherited and combined properties,
//!   ordered by specificity
//!
//! # Example
//!
//! ```
//! use tilecss::prelude::*;
//!
//! let mut decoder = Decoder::new();
//! decoder.parse_str(
//!     "@base: 2;
//!      Map { background-color: white; }
//!      #roads { line-width: @base; line-color: #333; }
//!      #roads[highway='motorway'] { line-width: @base * 2; }",
//! )?;
//! decoder.evaluate()?;
//!
//! let stylesheet = decoder.stylesheet();
//! assert_eq!(stylesheet.layer_names(), ["roads"]);
//! assert!(stylesheet.map_properties().get_color("background-color").is_some());
//!
//! let rules = stylesheet.layer_rules("roads", &[]);
//! assert_eq!(rules.len(), 2);
//! assert_eq!(rules[0].properties.get_float("line-width"), Some(4.0));
//! assert!(rules[0].properties.get_color("line-color").is_some());
//! assert_eq!(rules[1].properties.get_float("line-width"), Some(2.0));
//! # Ok::<(), tilecss::Error>(())
//! ```

pub mod config;
pub mod expr;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod rules;
pub mod selector;
pub mod style;

mod error;

pub use config::DecoderConfig;
pub use error::{Error, Result};
pub use parser::{Decoder, ErrorKind, ParseError, Warning};
pub use rules::{rules_zoom, Rule};
pub use style::{Properties, PropertyKey, Stylesheet};
pub use tilecss_color::Color;

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::config::DecoderConfig;
    pub use crate::expr::{Field, Stop, Value};
    pub use crate::parser::{Decoder, ErrorKind, ParseError, Warning};
    pub use crate::rules::{rules_zoom, Rule};
    pub use crate::selector::{CompOp, Filter, FilterValue, Selector, ZoomRange};
    pub use crate::style::{Position, Prefix, Properties, PropertyKey, Specificity, Stylesheet};
    pub use crate::{Error, Result};
    pub use tilecss_color::Color;
}
