//! Structured engine - objects and arrays addressed by property paths

use crate::common::{empty, preflight, Lifecycle, Preflight};
use async_trait::async_trait;
use harvester_domain::reserved::PROP_LENGTH;
use harvester_domain::value::{is_truthy, lookup};
use harvester_domain::{DocumentEngine, EngineError, SelectorStep};
use serde_json::Value;
use tracing::{debug, info};

const NAME: &str = "structured";

/// Engine for object/array documents
///
/// Selectors are property paths (`child.name`, `childs[0].name`). The
/// `$length` property counts array items or string characters.
///
/// # Examples
///
/// ```
/// use harvester_domain::{reserved, DocumentEngine, SelectorStep};
/// use harvester_engines::StructuredEngine;
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let engine = StructuredEngine::new();
/// let doc = json!({ "childs": [1, 2, 3] });
/// let step = SelectorStep::selector("childs").with_prop(reserved::PROP_LENGTH);
///
/// assert_eq!(engine.exec(&doc, &step, &json!({})).await.unwrap(), json!(3));
/// # }
/// ```
#[derive(Debug, Default)]
pub struct StructuredEngine {
    lifecycle: Lifecycle,
}

impl StructuredEngine {
    /// Create a new structured engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `start` has been called without a matching `stop`
    pub fn is_started(&self) -> bool {
        self.lifecycle.is_started()
    }

    fn accepts(document: &Value) -> bool {
        is_truthy(document) && (document.is_object() || document.is_array())
    }
}

/// Item count of a selected value: array items or string characters
fn length_of(selected: Option<&Value>) -> usize {
    match selected {
        Some(Value::Array(items)) => items.len(),
        Some(Value::String(s)) => s.chars().count(),
        _ => 0,
    }
}

#[async_trait]
impl DocumentEngine for StructuredEngine {
    fn name(&self) -> &str {
        NAME
    }

    async fn start(&self) -> Result<(), EngineError> {
        if self.lifecycle.start() {
            info!("Structured engine started");
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), EngineError> {
        if self.lifecycle.stop() {
            info!("Structured engine stopped");
        }
        Ok(())
    }

    async fn exec(
        &self,
        document: &Value,
        step: &SelectorStep,
        reference: &Value,
    ) -> Result<Value, EngineError> {
        if !Self::accepts(document) {
            return Ok(empty());
        }

        let selector = match preflight(NAME, document, step, reference)? {
            Preflight::Resolved(value) => return Ok(value),
            Preflight::Select(selector) => selector,
        };

        let selected = lookup(document, selector);
        if step.prop.as_deref() == Some(PROP_LENGTH) {
            return Ok(Value::from(length_of(selected)));
        }

        if selected.is_none() {
            debug!("Path '{}' not found", selector);
        }
        Ok(selected.cloned().unwrap_or(Value::Null))
    }

    async fn clean(&self, document: Value, selectors: &[String]) -> Result<Value, EngineError> {
        if selectors.is_empty() {
            return Ok(document);
        }

        match document {
            Value::Object(mut map) => {
                for key in selectors {
                    map.remove(key);
                }
                Ok(Value::Object(map))
            }
            Value::Array(items) => Ok(Value::Array(
                items
                    .into_iter()
                    .filter(|item| match item {
                        Value::String(s) => !selectors.contains(s),
                        _ => true,
                    })
                    .collect(),
            )),
            other => Ok(other),
        }
    }
}
