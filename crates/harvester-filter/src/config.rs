//! Configuration for the filter registry

use serde::{Deserialize, Serialize};

/// Configuration for [`FilterRegistry`](crate::FilterRegistry)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Fail on unknown filter ids instead of skipping them
    #[serde(default)]
    pub strict: bool,
}

impl FilterConfig {
    /// Strict preset: unknown filter ids are errors
    pub fn strict() -> Self {
        Self { strict: true }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_lenient() {
        assert!(!FilterConfig::default().strict);
        assert!(FilterConfig::strict().strict);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = FilterConfig::strict();
        let parsed = FilterConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        assert_eq!(FilterConfig::from_toml("").unwrap(), FilterConfig::default());
    }
}
