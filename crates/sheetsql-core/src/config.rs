//! Session configuration
//!
//! Settings can be written as TOML:
//!
//! ```toml
//! read_only = false
//! extended_metadata = true
//!
//! [cursor]
//! scroll = "scrollable"
//!
//! [formulas]
//! mode = "recalculate"
//! ```
//!
//! or passed as driver-style string properties (`readonly=false`).

use serde::{Deserialize, Serialize};

use crate::error::{Result, SqlError};

/// How a result set may be positioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollMode {
    /// Only forward moves are allowed
    #[default]
    ForwardOnly,
    /// Any row may be visited in any order
    Scrollable,
}

/// How formula cells are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaMode {
    /// Use the stored result, evaluating only when none was stored
    #[default]
    Cached,
    /// Always evaluate, falling back to the stored result on failure
    Recalculate,
}

/// Top-level session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Reject every mutation when set
    pub read_only: bool,
    /// Report column types from the row under the cursor
    pub extended_metadata: bool,
    /// Cursor settings
    pub cursor: CursorSettings,
    /// Formula settings
    pub formulas: FormulaSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_only: true,
            extended_metadata: false,
            cursor: CursorSettings::default(),
            formulas: FormulaSettings::default(),
        }
    }
}

/// Cursor configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorSettings {
    /// Scroll mode used by `Session::query`
    pub scroll: ScrollMode,
}

/// Formula configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaSettings {
    /// Resolution strategy for formula cells
    pub mode: FormulaMode,
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(SqlError::InvalidConfig(format!(
            "{} expects a boolean, got '{}'",
            key, other
        ))),
    }
}

impl SessionConfig {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| SqlError::InvalidConfig(e.to_string()))
    }

    /// Build settings from driver-style key/value properties
    ///
    /// Keys are case-insensitive; unknown keys are ignored.
    pub fn from_properties<I, K, V>(properties: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = SessionConfig::default();
        for (key, value) in properties {
            let key = key.as_ref().trim().to_ascii_lowercase();
            let value = value.as_ref();
            match key.as_str() {
                "readonly" | "read_only" => config.read_only = parse_bool(&key, value)?,
                "extended_metadata" | "extendedmetadata" => {
                    config.extended_metadata = parse_bool(&key, value)?
                }
                "scroll" => {
                    config.cursor.scroll = match value.trim().to_ascii_lowercase().as_str() {
                        "forward_only" | "forwardonly" => ScrollMode::ForwardOnly,
                        "scrollable" | "scroll_insensitive" => ScrollMode::Scrollable,
                        other => {
                            return Err(SqlError::InvalidConfig(format!(
                                "unknown scroll mode '{}'",
                                other
                            )))
                        }
                    }
                }
                "formulas" => {
                    config.formulas.mode = match value.trim().to_ascii_lowercase().as_str() {
                        "cached" => FormulaMode::Cached,
                        "recalculate" => FormulaMode::Recalculate,
                        other => {
                            return Err(SqlError::InvalidConfig(format!(
                                "unknown formula mode '{}'",
                                other
                            )))
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(config)
    }

    /// Builder-style mutable session
    pub fn mutable(mut self) -> Self {
        self.read_only = false;
        self
    }

    /// Builder-style row-sensitive metadata
    pub fn with_extended_metadata(mut self, enabled: bool) -> Self {
        self.extended_metadata = enabled;
        self
    }

    /// Builder-style default scroll mode
    pub fn with_scroll(mut self, scroll: ScrollMode) -> Self {
        self.cursor.scroll = scroll;
        self
    }

    /// Builder-style formula mode
    pub fn with_formula_mode(mut self, mode: FormulaMode) -> Self {
        self.formulas.mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert!(config.read_only);
        assert!(!config.extended_metadata);
        assert_eq!(config.cursor.scroll, ScrollMode::ForwardOnly);
        assert_eq!(config.formulas.mode, FormulaMode::Cached);
    }

    #[test]
    fn test_load_config_from_toml() {
        let toml = r#"
read_only = false
extended_metadata = true

[cursor]
scroll = "scrollable"

[formulas]
mode = "recalculate"
"#;
        let config = SessionConfig::from_toml_str(toml).unwrap();
        assert!(!config.read_only);
        assert!(config.extended_metadata);
        assert_eq!(config.cursor.scroll, ScrollMode::Scrollable);
        assert_eq!(config.formulas.mode, FormulaMode::Recalculate);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SessionConfig::from_toml_str("extended_metadata = true").unwrap();
        assert!(config.read_only);
        assert!(config.extended_metadata);
    }

    #[test]
    fn test_invalid_toml() {
        let result = SessionConfig::from_toml_str("[cursor]\nscroll = \"sideways\"");
        assert!(matches!(result, Err(SqlError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_properties() {
        let config =
            SessionConfig::from_properties([("ReadOnly", "false"), ("SCROLL", "scrollable")])
                .unwrap();
        assert!(!config.read_only);
        assert_eq!(config.cursor.scroll, ScrollMode::Scrollable);

        let err = SessionConfig::from_properties([("readonly", "maybe")]);
        assert!(matches!(err, Err(SqlError::InvalidConfig(_))));
    }
}
