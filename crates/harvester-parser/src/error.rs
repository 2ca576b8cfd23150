//! Error types for the Parser

use harvester_domain::{EngineError, FilterError};
use thiserror::Error;

/// Errors that can occur while interpreting a schema
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParserError {
    /// No usable schema was supplied
    #[error("EMPTY_SCHEMA: no schema supplied")]
    EmptySchema,

    /// The schema (or a nested schema) lacks `_scope`
    #[error("EMPTY_SCHEMA_SCOPE: schema has no `_scope`")]
    EmptySchemaScope,

    /// Schema JSON does not match the wire shape
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Atomic step resolution failed
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Filter pipeline failed
    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl From<serde_json::Error> for ParserError {
    fn from(e: serde_json::Error) -> Self {
        ParserError::InvalidSchema(e.to_string())
    }
}
