//! Step handling shared by every engine

use harvester_domain::value::lookup;
use harvester_domain::{EngineError, SelectorStep};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

/// Outcome of the format-independent part of step resolution
pub(crate) enum Preflight<'a> {
    /// The step was answered without touching the document format
    Resolved(Value),
    /// The step needs the engine to evaluate this locator
    Select(&'a str),
}

/// Validate a step and answer `ref` and `$root` steps
pub(crate) fn preflight<'a>(
    engine: &str,
    document: &Value,
    step: &'a SelectorStep,
    reference: &Value,
) -> Result<Preflight<'a>, EngineError> {
    match (step.reference.as_deref(), step.selector.as_deref()) {
        (None, None) => Err(EngineError::NoRefAndSelector {
            engine: engine.to_string(),
        }),
        (Some(_), Some(_)) => Err(EngineError::RefAndSelector {
            engine: engine.to_string(),
        }),
        (Some(path), None) => Ok(Preflight::Resolved(
            lookup(reference, path).cloned().unwrap_or(Value::Null),
        )),
        (None, Some(_)) if step.is_root() => Ok(Preflight::Resolved(document.clone())),
        (None, Some(selector)) => Ok(Preflight::Select(selector)),
    }
}

/// Idempotent started/stopped flag
#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    started: AtomicBool,
}

impl Lifecycle {
    /// Returns true only for the call that actually started
    pub(crate) fn start(&self) -> bool {
        !self.started.swap(true, Ordering::SeqCst)
    }

    /// Returns true only for the call that actually stopped
    pub(crate) fn stop(&self) -> bool {
        self.started.swap(false, Ordering::SeqCst)
    }

    pub(crate) fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

pub(crate) fn empty() -> Value {
    Value::String(String::new())
}
