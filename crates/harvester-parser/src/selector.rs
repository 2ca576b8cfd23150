//! Engine selection

use harvester_domain::{DocumentEngine, EngineKind};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Caller override for which engine handles a call
#[derive(Clone)]
pub enum EngineChoice {
    /// Use the registered engine for this format, whatever the document looks like
    Kind(EngineKind),

    /// Use this engine instance directly
    Engine(Arc<dyn DocumentEngine>),
}

impl From<EngineKind> for EngineChoice {
    fn from(kind: EngineKind) -> Self {
        EngineChoice::Kind(kind)
    }
}

impl From<Arc<dyn DocumentEngine>> for EngineChoice {
    fn from(engine: Arc<dyn DocumentEngine>) -> Self {
        EngineChoice::Engine(engine)
    }
}

impl fmt::Debug for EngineChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineChoice::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            EngineChoice::Engine(engine) => f.debug_tuple("Engine").field(&engine.name()).finish(),
        }
    }
}

/// Picks the engine for a call
///
/// Precedence: an explicit engine instance, then an explicit format tag, then
/// the configured default, then the document's shape (text is markup,
/// anything else is structured). A forced engine is used even when it does
/// not fit the document; it then resolves every step to `""`.
#[derive(Clone)]
pub struct EngineSelector {
    structured: Arc<dyn DocumentEngine>,
    markup: Arc<dyn DocumentEngine>,
    default_kind: Option<EngineKind>,
}

impl EngineSelector {
    /// Create a selector over the two registered engines
    pub fn new(structured: Arc<dyn DocumentEngine>, markup: Arc<dyn DocumentEngine>) -> Self {
        Self {
            structured,
            markup,
            default_kind: None,
        }
    }

    /// Use `kind` whenever a call names no engine
    pub fn with_default(mut self, kind: Option<EngineKind>) -> Self {
        self.default_kind = kind;
        self
    }

    /// The registered engine for a format
    pub fn engine(&self, kind: EngineKind) -> &Arc<dyn DocumentEngine> {
        match kind {
            EngineKind::Structured => &self.structured,
            EngineKind::Markup => &self.markup,
        }
    }

    /// Both registered engines
    pub fn engines(&self) -> [&Arc<dyn DocumentEngine>; 2] {
        [&self.structured, &self.markup]
    }

    /// Choose the engine for `document`
    pub fn select(
        &self,
        document: &Value,
        choice: Option<&EngineChoice>,
    ) -> Arc<dyn DocumentEngine> {
        let kind = match choice {
            Some(EngineChoice::Engine(engine)) => {
                debug!("Using caller-supplied {} engine", engine.name());
                return Arc::clone(engine);
            }
            Some(EngineChoice::Kind(kind)) => *kind,
            None => self
                .default_kind
                .unwrap_or_else(|| EngineKind::infer(document)),
        };

        debug!("Selected {} engine", kind);
        Arc::clone(self.engine(kind))
    }
}

impl fmt::Debug for EngineSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineSelector")
            .field("structured", &self.structured.name())
            .field("markup", &self.markup.name())
            .field("default_kind", &self.default_kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvester_engines::{MarkupEngine, StructuredEngine};
    use serde_json::json;

    fn selector() -> EngineSelector {
        EngineSelector::new(Arc::new(StructuredEngine::new()), Arc::new(MarkupEngine::new()))
    }

    #[test]
    fn test_infers_from_shape() {
        let selector = selector();
        assert_eq!(selector.select(&json!("<p></p>"), None).name(), "markup");
        assert_eq!(selector.select(&json!({ "a": 1 }), None).name(), "structured");
        assert_eq!(selector.select(&json!([1]), None).name(), "structured");
        assert_eq!(selector.select(&Value::Null, None).name(), "structured");
    }

    #[test]
    fn test_kind_override_ignores_shape() {
        let selector = selector();
        let markup = EngineChoice::Kind(EngineKind::Markup);
        assert_eq!(selector.select(&json!({ "a": 1 }), Some(&markup)).name(), "markup");

        let structured = EngineChoice::from(EngineKind::Structured);
        assert_eq!(selector.select(&json!("<p></p>"), Some(&structured)).name(), "structured");
    }

    #[test]
    fn test_instance_override_is_used_directly() {
        let selector = selector();
        let custom: Arc<dyn DocumentEngine> = Arc::new(MarkupEngine::new());
        let choice = EngineChoice::from(Arc::clone(&custom));

        let chosen = selector.select(&json!({ "a": 1 }), Some(&choice));
        assert!(Arc::ptr_eq(&chosen, &custom));
        assert!(!Arc::ptr_eq(&chosen, selector.engine(EngineKind::Markup)));
    }

    #[test]
    fn test_configured_default() {
        let selector = selector().with_default(Some(EngineKind::Markup));
        assert_eq!(selector.select(&json!({ "a": 1 }), None).name(), "markup");

        let structured = EngineChoice::Kind(EngineKind::Structured);
        assert_eq!(selector.select(&json!("<p></p>"), Some(&structured)).name(), "structured");
    }
}
