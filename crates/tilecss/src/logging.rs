//! Tracing targets used by the compiler.
//!
//! The compiler logs through the `tracing` facade and never installs a
//! subscriber itself. Install one in the application to see output:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("tilecss::cascade=trace")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by stage.
pub mod targets {
    /// Tokenizer.
    pub const LEXER: &str = "tilecss::lexer";
    /// Recursive-descent parser.
    pub const PARSER: &str = "tilecss::parser";
    /// Variable resolution and expression evaluation.
    pub const EVAL: &str = "tilecss::eval";
    /// Rule cascade resolution.
    pub const CASCADE: &str = "tilecss::cascade";
    /// Configuration loading.
    pub const CONFIG: &str = "tilecss::config";
}
