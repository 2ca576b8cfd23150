//! Filter registry - the built-in `FilterPipeline`

use crate::builtin;
use crate::config::FilterConfig;
use async_trait::async_trait;
use harvester_domain::{FilterError, FilterOptions, FilterPipeline, FilterSpec};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a filter sees besides the value it transforms
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    /// Id the filter was invoked under
    pub id: &'a str,
    /// Options from the filter instruction
    pub opts: Option<&'a Value>,
    /// Reference context of the calling step
    pub reference: &'a Value,
}

/// A registered filter
pub type FilterFn =
    Arc<dyn Fn(Value, &FilterContext<'_>) -> Result<Value, FilterError> + Send + Sync>;

/// Named-filter pipeline
///
/// Every record field named in the call's schema runs through its filters
/// in ascending priority order; equal priorities keep their declared order.
///
/// # Examples
///
/// ```
/// use harvester_domain::{FilterOptions, FilterPipeline, FilterSpec};
/// use harvester_filter::FilterRegistry;
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let registry = FilterRegistry::with_builtins();
/// let opts = FilterOptions::for_field(
///     "price",
///     vec![FilterSpec::new("filter.trim", 1), FilterSpec::new("filter.toNumber", 2)],
///     json!({}),
/// );
///
/// let out = registry.exec(vec![json!({ "price": " 12 " })], &opts).await.unwrap();
/// assert_eq!(out, vec![json!({ "price": 12 })]);
/// # }
/// ```
pub struct FilterRegistry {
    filters: HashMap<String, FilterFn>,
    config: FilterConfig,
    started: AtomicBool,
}

impl FilterRegistry {
    /// Create an empty registry
    pub fn new(config: FilterConfig) -> Self {
        Self {
            filters: HashMap::new(),
            config,
            started: AtomicBool::new(false),
        }
    }

    /// Create a registry holding the built-in filters and default configuration
    pub fn with_builtins() -> Self {
        Self::new(FilterConfig::default()).register_builtins()
    }

    /// Add the built-in filters to this registry
    pub fn register_builtins(mut self) -> Self {
        self.register("filter.toNumber", builtin::to_number_filter);
        self.register("filter.toString", builtin::to_string_filter);
        self.register("filter.toBoolean", builtin::to_boolean_filter);
        self.register("filter.trim", builtin::trim_filter);
        self.register("filter.toLowerCase", builtin::lower_case_filter);
        self.register("filter.toUpperCase", builtin::upper_case_filter);
        self.register("filter.toDate", builtin::to_date_filter);
        self.register("filter.default", builtin::default_filter);
        self.register("filter.replace", builtin::replace_filter);
        self.register("filter.split", builtin::split_filter);
        self.register("filter.join", builtin::join_filter);
        self
    }

    /// Register (or replace) a filter under `id`
    pub fn register<F>(&mut self, id: impl Into<String>, filter: F)
    where
        F: Fn(Value, &FilterContext<'_>) -> Result<Value, FilterError> + Send + Sync + 'static,
    {
        self.filters.insert(id.into(), Arc::new(filter));
    }

    /// Whether a filter is registered under `id`
    pub fn contains(&self, id: &str) -> bool {
        self.filters.contains_key(id)
    }

    /// Registered filter ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.filters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Whether `start` has been called without a matching `stop`
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Run one value through a chain of filter instructions
    pub fn apply(
        &self,
        mut value: Value,
        specs: &[FilterSpec],
        reference: &Value,
    ) -> Result<Value, FilterError> {
        let mut ordered: Vec<&FilterSpec> = specs.iter().collect();
        ordered.sort_by_key(|spec| spec.priority);

        for spec in ordered {
            let Some(filter) = self.filters.get(&spec.id) else {
                if self.config.strict {
                    return Err(FilterError::UnknownFilter(spec.id.clone()));
                }
                warn!("Skipping unknown filter '{}'", spec.id);
                continue;
            };

            let ctx = FilterContext {
                id: &spec.id,
                opts: spec.opts.as_ref(),
                reference,
            };
            value = filter(value, &ctx)?;
        }
        Ok(value)
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.ids())
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl FilterPipeline for FilterRegistry {
    async fn start(&self) -> Result<(), FilterError> {
        if !self.started.swap(true, Ordering::SeqCst) {
            info!("Filter registry started with {} filters", self.filters.len());
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), FilterError> {
        if self.started.swap(false, Ordering::SeqCst) {
            info!("Filter registry stopped");
        }
        Ok(())
    }

    async fn exec(
        &self,
        records: Vec<Value>,
        opts: &FilterOptions,
    ) -> Result<Vec<Value>, FilterError> {
        records
            .into_iter()
            .map(|record| match record {
                Value::Object(mut map) => {
                    for (field, specs) in &opts.schema {
                        let value = map.remove(field).unwrap_or(Value::Null);
                        debug!("Applying {} filters to '{}'", specs.len(), field);
                        map.insert(field.clone(), self.apply(value, specs, &opts.reference)?);
                    }
                    Ok(Value::Object(map))
                }
                other => Ok(other),
            })
            .collect()
    }
}
