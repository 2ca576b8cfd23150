//! Engine module - the document formats the interpreter understands

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Document format tag
///
/// - Structured: objects and arrays addressed by property paths
/// - Markup: serialized HTML addressed by CSS selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineKind {
    /// Object/array documents
    #[serde(rename = "json")]
    Structured,

    /// HTML text documents
    #[serde(rename = "html")]
    Markup,
}

impl EngineKind {
    /// Get the wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Structured => "json",
            EngineKind::Markup => "html",
        }
    }

    /// Parse a wire tag
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" | "structured" => Some(EngineKind::Structured),
            "html" | "markup" => Some(EngineKind::Markup),
            _ => None,
        }
    }

    /// Infer the format from a document's runtime shape
    pub fn infer(document: &Value) -> Self {
        if document.is_string() {
            EngineKind::Markup
        } else {
            EngineKind::Structured
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
