//! Decoder configuration.
//!
//! Configuration can be built in code or read from the `[decoder]` table of a
//! TOML document, so it can live in a larger project file:
//!
//! ```
//! use tilecss::DecoderConfig;
//!
//! let config = DecoderConfig::from_toml_str(
//!     r#"
//!     [decoder]
//!     deferred_eval = true
//!     "#,
//! )
//! .unwrap();
//! assert!(config.deferred_eval);
//! assert!(config.validate_properties);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::logging::targets;

/// Options for [`Decoder`](crate::parser::Decoder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Resolve every variable reference to the variable's final assignment
    /// instead of the assignment preceding the reference.
    pub deferred_eval: bool,
    /// Check evaluated properties against the known property table and
    /// collect warnings.
    pub validate_properties: bool,
    /// Filename reported for input parsed with `parse_str`.
    pub default_filename: Option<String>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            deferred_eval: false,
            validate_properties: true,
            default_filename: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Document {
    #[serde(default)]
    decoder: DecoderConfig,
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deferred_eval(mut self, deferred: bool) -> Self {
        self.deferred_eval = deferred;
        self
    }

    pub fn validate_properties(mut self, validate: bool) -> Self {
        self.validate_properties = validate;
        self
    }

    pub fn default_filename(mut self, name: impl Into<String>) -> Self {
        self.default_filename = Some(name.into());
        self
    }

    /// Read the `[decoder]` table of a TOML document. A missing table gives
    /// the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let document: Document = toml::from_str(content)?;
        Ok(document.decoder)
    }

    /// Read the `[decoder]` table of a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Self::from_toml_str(&content)?;
        debug!(target: targets::CONFIG, path = %path.display(), ?config, "loaded decoder config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = DecoderConfig::default();
        assert!(!config.deferred_eval);
        assert!(config.validate_properties);
        assert_eq!(config.default_filename, None);
        assert_eq!(DecoderConfig::from_toml_str("").unwrap(), config);
    }

    #[test]
    fn builder() {
        let config = DecoderConfig::new()
            .deferred_eval(true)
            .validate_properties(false)
            .default_filename("style.mss");
        assert!(config.deferred_eval);
        assert!(!config.validate_properties);
        assert_eq!(config.default_filename.as_deref(), Some("style.mss"));
    }

    #[test]
    fn partial_table_keeps_defaults() {
        let config = DecoderConfig::from_toml_str(
            r#"
            [project]
            name = "osm"

            [decoder]
            validate_properties = false
            "#,
        )
        .unwrap();
        assert!(!config.deferred_eval);
        assert!(!config.validate_properties);
    }

    #[test]
    fn malformed_document() {
        let err = DecoderConfig::from_toml_str("[decoder]\ndeferred_eval = 3").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[decoder]\ndeferred_eval = true\ndefault_filename = \"a.mss\"").unwrap();
        let config = DecoderConfig::from_file(file.path()).unwrap();
        assert!(config.deferred_eval);
        assert_eq!(config.default_filename.as_deref(), Some("a.mss"));

        let missing = DecoderConfig::from_file("/nonexistent/tilecss.toml").unwrap_err();
        assert!(matches!(missing, Error::Io { .. }));
    }
}
