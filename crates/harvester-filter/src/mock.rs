//! Mock pipeline for deterministic testing

use async_trait::async_trait;
use harvester_domain::{FilterError, FilterOptions, FilterPipeline};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Pipeline that records every call and returns its input unchanged
///
/// Clones share the same call log, so a test can keep one handle while the
/// interpreter owns another.
///
/// # Examples
///
/// ```
/// use harvester_domain::{FilterOptions, FilterPipeline};
/// use harvester_filter::MockPipeline;
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let pipeline = MockPipeline::new();
/// let out = pipeline.exec(vec![json!({ "a": 1 })], &FilterOptions::default()).await.unwrap();
/// assert_eq!(out, vec![json!({ "a": 1 })]);
/// assert_eq!(pipeline.call_count(), 1);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockPipeline {
    calls: Arc<Mutex<Vec<(Vec<Value>, FilterOptions)>>>,
}

impl MockPipeline {
    /// Create a new mock pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `exec` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Every `exec` call so far, in order
    pub fn calls(&self) -> Vec<(Vec<Value>, FilterOptions)> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Forget recorded calls
    pub fn reset(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[async_trait]
impl FilterPipeline for MockPipeline {
    async fn exec(
        &self,
        records: Vec<Value>,
        opts: &FilterOptions,
    ) -> Result<Vec<Value>, FilterError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((records.clone(), opts.clone()));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvester_domain::FilterSpec;
    use serde_json::json;

    #[tokio::test]
    async fn test_records_calls() {
        let pipeline = MockPipeline::new();
        let handle = pipeline.clone();
        let opts = FilterOptions::for_field("f", vec![FilterSpec::new("x", 1)], json!({ "k": 1 }));

        pipeline.exec(vec![json!({ "f": 1 })], &opts).await.unwrap();
        pipeline.exec(vec![json!({ "f": 2 })], &opts).await.unwrap();

        assert_eq!(handle.call_count(), 2);
        assert_eq!(handle.calls()[1].0, vec![json!({ "f": 2 })]);
        assert_eq!(handle.calls()[0].1, opts);

        handle.reset();
        assert_eq!(pipeline.call_count(), 0);
    }
}
