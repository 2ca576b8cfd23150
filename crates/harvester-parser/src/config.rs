//! Configuration for the Parser

use harvester_domain::EngineKind;
use serde::{Deserialize, Serialize};

/// Configuration for [`SchemaInterpreter`](crate::SchemaInterpreter)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Engine used when a call names none; `None` infers from the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_engine: Option<EngineKind>,

    /// Maximum scope elements (and fields per element) resolved at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Synthetic record key used when handing a step value to the filter pipeline
    #[serde(default = "default_filter_field")]
    pub filter_field: String,
}

fn default_max_concurrency() -> usize {
    16
}

fn default_filter_field() -> String {
    "$filtered$".to_string()
}

impl ParserConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".to_string());
        }
        if self.filter_field.is_empty() {
            return Err("filter_field must not be empty".to_string());
        }
        Ok(())
    }

    /// Sequential preset: one scope element and one field at a time
    pub fn sequential() -> Self {
        Self {
            max_concurrency: 1,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            default_engine: None,
            max_concurrency: default_max_concurrency(),
            filter_field: default_filter_field(),
        }
    }
}
