//! Core SchemaInterpreter implementation

use crate::config::ParserConfig;
use crate::error::ParserError;
use crate::selector::{EngineChoice, EngineSelector};
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use futures::FutureExt;
use harvester_domain::reserved::PARENT_REF;
use harvester_domain::value::is_truthy;
use harvester_domain::{
    merge, DocumentEngine, EngineKind, FilterOptions, FilterPipeline, Schema, SelectorStep,
};
use harvester_engines::{MarkupEngine, StructuredEngine};
use harvester_filter::FilterRegistry;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Options for one `exec` call
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Schema to resolve
    pub schema: Option<Schema>,

    /// Caller-supplied reference context; anything but an object counts as empty
    pub reference: Value,

    /// Engine override
    pub engine: Option<EngineChoice>,
}

#[derive(Deserialize)]
struct WireOptions {
    #[serde(default)]
    schema: Option<Schema>,
    #[serde(rename = "ref", default)]
    reference: Option<Value>,
    #[serde(default)]
    engine: Option<EngineKind>,
}

impl ExecOptions {
    /// Options resolving `schema` with an empty reference context
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: Some(schema),
            ..Self::default()
        }
    }

    /// Parse options from their wire shape: `{ schema, ref, engine }`
    pub fn from_value(value: Value) -> Result<Self, ParserError> {
        let wire: WireOptions = serde_json::from_value(value)?;
        Ok(Self {
            schema: wire.schema,
            reference: wire.reference.unwrap_or(Value::Null),
            engine: wire.engine.map(EngineChoice::Kind),
        })
    }

    /// Set the reference context
    pub fn with_reference(mut self, reference: Value) -> Self {
        self.reference = reference;
        self
    }

    /// Force an engine
    pub fn with_engine(mut self, engine: impl Into<EngineChoice>) -> Self {
        self.engine = Some(engine.into());
        self
    }
}

/// Resolves schemas against documents
///
/// One call walks the schema tree: the scope chain is resolved into the
/// repeating elements, every element gets its leaf fields folded from their
/// step chains, then its nested schemas are resolved against the same
/// element with `$parent` bound to the leaf record.
///
/// The interpreter holds no per-call state and can serve concurrent calls.
pub struct SchemaInterpreter {
    selector: EngineSelector,
    filter: Arc<dyn FilterPipeline>,
    config: ParserConfig,
    started: AtomicBool,
}

impl SchemaInterpreter {
    /// Create a new SchemaInterpreter from its collaborators
    pub fn new(
        structured: Arc<dyn DocumentEngine>,
        markup: Arc<dyn DocumentEngine>,
        filter: Arc<dyn FilterPipeline>,
        config: ParserConfig,
    ) -> Self {
        let selector = EngineSelector::new(structured, markup).with_default(config.default_engine);
        Self {
            selector,
            filter,
            config,
            started: AtomicBool::new(false),
        }
    }

    /// Create an interpreter with the built-in engines and filters
    pub fn with_config(config: ParserConfig) -> Result<Self, ParserError> {
        config.validate().map_err(ParserError::Config)?;
        Ok(Self::new(
            Arc::new(StructuredEngine::new()),
            Arc::new(MarkupEngine::new()),
            Arc::new(FilterRegistry::with_builtins()),
            config,
        ))
    }

    /// Create an interpreter with the built-in engines and filters and default configuration
    pub fn default_config() -> Self {
        Self::new(
            Arc::new(StructuredEngine::new()),
            Arc::new(MarkupEngine::new()),
            Arc::new(FilterRegistry::with_builtins()),
            ParserConfig::default(),
        )
    }

    /// The active configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The engine selector
    pub fn selector(&self) -> &EngineSelector {
        &self.selector
    }

    /// Whether `start` has been called without a matching `stop`
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Start the filter pipeline and both engines
    pub async fn start(&self) -> Result<(), ParserError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let [structured, markup] = self.selector.engines();
        futures::try_join!(
            async { self.filter.start().await.map_err(ParserError::from) },
            async { structured.start().await.map_err(ParserError::from) },
            async { markup.start().await.map_err(ParserError::from) },
        )?;

        info!("Parser started");
        Ok(())
    }

    /// Stop the filter pipeline and both engines
    pub async fn stop(&self) -> Result<(), ParserError> {
        if !self.started.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let [structured, markup] = self.selector.engines();
        futures::try_join!(
            async { self.filter.stop().await.map_err(ParserError::from) },
            async { structured.stop().await.map_err(ParserError::from) },
            async { markup.stop().await.map_err(ParserError::from) },
        )?;

        info!("Parser stopped");
        Ok(())
    }

    /// Resolve `opts.schema` against `document`
    ///
    /// Returns `""` for a falsy document, an array with one record per truthy
    /// scope element, or a single record when the schema sets `_merge`.
    pub async fn exec(&self, document: &Value, opts: ExecOptions) -> Result<Value, ParserError> {
        if !is_truthy(document) {
            return Ok(Value::String(String::new()));
        }

        let engine = self.selector.select(document, opts.engine.as_ref());
        let schema = opts.schema.ok_or(ParserError::EmptySchema)?;
        let reference = match opts.reference {
            Value::Object(map) => Value::Object(map),
            _ => Value::Object(Map::new()),
        };

        self.exec_schema(&engine, document, &schema, &reference).await
    }

    /// Remove everything matched by `selectors` from `document`
    ///
    /// Structured documents lose the named keys, markup documents the
    /// matching elements. An empty selector list returns the document as is.
    pub async fn clean(&self, document: Value, selectors: &[String]) -> Result<Value, ParserError> {
        let engine = self.selector.select(&document, None);
        Ok(engine.clean(document, selectors).await?)
    }

    fn exec_schema<'a>(
        &'a self,
        engine: &'a Arc<dyn DocumentEngine>,
        document: &'a Value,
        schema: &'a Schema,
        reference: &'a Value,
    ) -> BoxFuture<'a, Result<Value, ParserError>> {
        async move {
            if !is_truthy(document) {
                return Ok(Value::String(String::new()));
            }
            if schema.is_empty() {
                return Err(ParserError::EmptySchema);
            }
            let scope = match schema.scope.as_deref() {
                Some(scope) if !scope.is_empty() => scope,
                _ => return Err(ParserError::EmptySchemaScope),
            };

            let resolved = self
                .fold_steps(engine.as_ref(), document, scope, reference)
                .await?;
            let elements = match resolved {
                Value::Array(items) => items,
                other => {
                    debug!("Scope resolved to a non-array, wrapping it");
                    vec![other]
                }
            };
            let elements: Vec<Value> = elements.into_iter().filter(is_truthy).collect();

            let pending: Vec<_> = elements
                .iter()
                .map(|element| self.resolve_element(engine, element, schema, reference))
                .collect();
            let records: Vec<Map<String, Value>> = stream::iter(pending)
                .buffered(self.concurrency())
                .try_collect()
                .await?;

            if schema.merge {
                debug!("Merging {} scope records", records.len());
                let merged = records.into_iter().fold(Map::new(), |mut acc, record| {
                    acc.extend(record);
                    acc
                });
                return Ok(Value::Object(merged));
            }

            Ok(Value::Array(records.into_iter().map(Value::Object).collect()))
        }
        .boxed()
    }

    /// Resolve every field of one scope element into a record
    async fn resolve_element(
        &self,
        engine: &Arc<dyn DocumentEngine>,
        element: &Value,
        schema: &Schema,
        reference: &Value,
    ) -> Result<Map<String, Value>, ParserError> {
        let pending: Vec<_> = schema
            .leaf_fields()
            .map(|(name, steps)| async move {
                let value = self.fold_steps(engine.as_ref(), element, steps, reference).await?;
                Ok::<_, ParserError>((name.to_string(), value))
            })
            .collect();
        let leaves: Vec<(String, Value)> = stream::iter(pending)
            .buffered(self.concurrency())
            .try_collect()
            .await?;
        let mut record: Map<String, Value> = leaves.into_iter().collect();

        if schema.child_fields().next().is_none() {
            return Ok(record);
        }

        let mut child_reference = reference.as_object().cloned().unwrap_or_default();
        child_reference.insert(PARENT_REF.to_string(), Value::Object(record.clone()));
        let child_reference = Value::Object(child_reference);

        let child_reference = &child_reference;
        let pending: Vec<_> = schema
            .child_fields()
            .map(|(name, child)| async move {
                let value = self.exec_schema(engine, element, child, child_reference).await?;
                Ok::<_, ParserError>((name.to_string(), value))
            })
            .collect();
        let children: Vec<(String, Value)> = stream::iter(pending)
            .buffered(self.concurrency())
            .try_collect()
            .await?;

        record.extend(children);
        Ok(record)
    }

    /// Left-fold a step chain into one value
    ///
    /// Every step runs, filters included, even after an earlier step has
    /// produced a truthy value; `or` steps only decide whether their value
    /// replaces a falsy accumulator.
    async fn fold_steps(
        &self,
        engine: &dyn DocumentEngine,
        document: &Value,
        steps: &[SelectorStep],
        reference: &Value,
    ) -> Result<Value, ParserError> {
        let mut acc = Value::Null;

        for step in steps {
            let mut value = engine.exec(document, step, reference).await?;

            if !step.filters.is_empty() {
                debug!("Applying {} filters", step.filters.len());
                value = self.apply_filters(value, step, reference).await?;
            }

            acc = if step.or {
                debug!("Folding step with OR");
                if is_truthy(&acc) {
                    acc
                } else {
                    value
                }
            } else {
                debug!("Folding step with AND");
                merge(acc, value)
            };
        }

        Ok(acc)
    }

    /// Run one raw step value through the filter pipeline
    async fn apply_filters(
        &self,
        value: Value,
        step: &SelectorStep,
        reference: &Value,
    ) -> Result<Value, ParserError> {
        let field = self.config.filter_field.as_str();
        let opts = FilterOptions::for_field(field, step.filters.clone(), reference.clone());

        let mut record = Map::new();
        record.insert(field.to_string(), value);

        let filtered = self.filter.exec(vec![Value::Object(record)], &opts).await?;
        Ok(filtered
            .into_iter()
            .next()
            .and_then(|mut record| record.as_object_mut().and_then(|map| map.remove(field)))
            .unwrap_or(Value::Null))
    }

    fn concurrency(&self) -> usize {
        self.config.max_concurrency.max(1)
    }
}

impl Default for SchemaInterpreter {
    fn default() -> Self {
        Self::default_config()
    }
}
