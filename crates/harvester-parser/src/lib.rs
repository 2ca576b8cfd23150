//! Harvester Parser
//!
//! Declarative schema interpreter for structured and markup documents.
//!
//! # Overview
//!
//! A schema describes a repeating scope inside a document and the fields to
//! extract from every element of that scope. Each field is a chain of
//! selector steps; every step is resolved by a document engine, optionally
//! run through the filter pipeline, and folded into the field's value with
//! the merge rules from `harvester-domain`. Nested schemas run against each
//! scope element with the parent's leaf record bound to `$parent`.
//!
//! # Architecture
//!
//! ```text
//! Document → EngineSelector → DocumentEngine ─┐
//!                                             ├→ fold steps → records
//! Schema ───────────→ SchemaInterpreter → FilterPipeline ─┘
//! ```
//!
//! # Example Usage
//!
//! ```
//! use harvester_parser::{ExecOptions, SchemaInterpreter};
//! use harvester_domain::Schema;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let parser = SchemaInterpreter::default_config();
//! parser.start().await?;
//!
//! let schema = Schema::from_value(json!({
//!     "_scope": [{ "selector": "items" }],
//!     "name": [{ "selector": "name" }],
//!     "price": [{ "selector": "price", "filters": [{ "id": "filter.toNumber" }] }]
//! }))?;
//!
//! let document = json!({ "items": [{ "name": "tea", "price": "3" }] });
//! let records = parser.exec(&document, ExecOptions::new(schema)).await?;
//! assert_eq!(records, json!([{ "name": "tea", "price": 3 }]));
//!
//! parser.stop().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod interpreter;
pub mod selector;

pub use config::ParserConfig;
pub use error::ParserError;
pub use interpreter::{ExecOptions, SchemaInterpreter};
pub use selector::{EngineChoice, EngineSelector};
