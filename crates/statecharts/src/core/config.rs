//! Configuration file loading
//!
//! A YAML document with two optional sections:
//!
//! ```yaml
//! styles:
//!   node: { fontsize: 12, shape: box }
//!   start_node: { color: green }
//! labels:
//!   callback_separator: ", "
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{DiagramError, Result};
use super::style::{LabelConfig, StyleConfig, StyleOverrides, StyleResolver};

/// User settings for one invocation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Per-category style overrides
    pub styles: StyleOverrides,
    pub labels: LabelConfig,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DiagramError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let settings = Self::parse(&contents).map_err(|e| DiagramError::BadConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(
            path = %path.display(),
            style_categories = settings.styles.len(),
            "Loaded configuration"
        );
        Ok(settings)
    }

    /// Parse settings from YAML text
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        Self::parse(contents).map_err(|e| DiagramError::BadConfig {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }

    fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        // A document holding only comments parses as null
        let settings: Option<Settings> = serde_yaml::from_str(contents)?;
        Ok(settings.unwrap_or_default())
    }

    /// Effective style for these settings
    pub fn resolved_style(&self) -> StyleConfig {
        StyleResolver::new().resolve(&self.styles)
    }
}
