//! Loading engine configuration from files.

use std::path::Path;

use serde::{Deserialize, Serialize};
use vitrine_bridge::EngineConfig;

use crate::error::{ConfigError, Result};
use crate::labels::LabelTables;

/// Engine settings plus optional label overrides, as one document.
///
/// ```yaml
/// engine:
///   search_debounce_ms: 150
/// labels:
///   quality:
///     "2": "Near Mint"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineConfig,
    /// Overlaid onto the built-in tables by [`Settings::labels`].
    #[serde(rename = "labels")]
    pub label_overrides: LabelTables,
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Yaml {
            what: "settings",
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| ConfigError::Json {
            what: "settings",
            source,
        })
    }

    /// Parses by extension: `.json` as JSON, anything else as YAML.
    pub fn from_source(path: &Path, content: &str) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(content),
            _ => Self::from_yaml(content),
        }
    }

    /// Built-in label tables with the overrides applied.
    pub fn labels(&self) -> LabelTables {
        LabelTables::builtin()
            .clone()
            .merge(self.label_overrides.clone())
    }
}
