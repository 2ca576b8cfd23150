//! Harvester Domain Layer
//!
//! Value model, schema model and collaborator contracts for the harvester
//! extraction interpreter. Nothing here touches a concrete document format.
//!
//! ## Key Concepts
//!
//! - **Schema**: a tree naming a repeating scope and the fields to pull from each element
//! - **SelectorStep**: one atomic instruction, a reference path or a document locator
//! - **Merge algebra**: the type-directed combination of chained step values
//! - **DocumentEngine**: resolves one step against one document format
//! - **FilterPipeline**: post-processes step values through named filters

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod error;
pub mod merge;
pub mod schema;
pub mod traits;
pub mod value;

// Re-exports for convenience
pub use engine::EngineKind;
pub use error::{EngineError, FilterError};
pub use merge::merge;
pub use schema::{reserved, FilterSpec, Schema, SchemaField, SelectorStep};
pub use traits::{DocumentEngine, FilterOptions, FilterPipeline};
