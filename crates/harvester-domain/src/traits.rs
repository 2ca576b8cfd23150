//! Trait definitions for the interpreter's collaborators
//!
//! These traits are the boundary between the schema interpreter and the
//! format-specific code it drives. Implementations live in other crates
//! (`harvester-engines`, `harvester-filter`).

use crate::error::{EngineError, FilterError};
use crate::schema::{FilterSpec, SelectorStep};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// Resolves single selector steps against one document format
///
/// Engines are shared across concurrent calls and must not keep per-call
/// state. `start` and `stop` are idempotent.
#[async_trait]
pub trait DocumentEngine: Send + Sync {
    /// Engine name used in logs and errors
    fn name(&self) -> &str;

    /// Prepare the engine for use
    async fn start(&self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Release anything acquired in `start`
    async fn stop(&self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Resolve exactly one step against `document`
    ///
    /// A falsy document, or one of the wrong runtime type, resolves to `""`.
    async fn exec(
        &self,
        document: &Value,
        step: &SelectorStep,
        reference: &Value,
    ) -> Result<Value, EngineError>;

    /// Return `document` with everything matched by `selectors` removed
    async fn clean(&self, document: Value, selectors: &[String]) -> Result<Value, EngineError>;
}

/// Options for one filter pipeline call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    /// Filters to apply, keyed by record field
    pub schema: BTreeMap<String, Vec<FilterSpec>>,

    /// Reference context of the calling step
    pub reference: Value,
}

impl FilterOptions {
    /// Options applying `filters` to a single field
    pub fn for_field(field: impl Into<String>, filters: Vec<FilterSpec>, reference: Value) -> Self {
        let mut schema = BTreeMap::new();
        schema.insert(field.into(), filters);
        Self { schema, reference }
    }
}

/// Post-processes record fields through named filters
#[async_trait]
pub trait FilterPipeline: Send + Sync {
    /// Prepare the pipeline for use
    async fn start(&self) -> Result<(), FilterError> {
        Ok(())
    }

    /// Release anything acquired in `start`
    async fn stop(&self) -> Result<(), FilterError> {
        Ok(())
    }

    /// Apply the filters in `opts` to every record
    async fn exec(
        &self,
        records: Vec<Value>,
        opts: &FilterOptions,
    ) -> Result<Vec<Value>, FilterError>;
}
