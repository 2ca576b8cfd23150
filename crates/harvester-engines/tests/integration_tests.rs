//! Integration tests for the document engines behind the `DocumentEngine` seam

use harvester_domain::{reserved, DocumentEngine, EngineError, SelectorStep};
use harvester_engines::{MarkupEngine, StructuredEngine};
use serde_json::{json, Value};
use std::sync::Arc;

/// Helper to create both engines as trait objects
fn engines() -> Vec<Arc<dyn DocumentEngine>> {
    vec![Arc::new(StructuredEngine::new()), Arc::new(MarkupEngine::new())]
}

fn document_for(engine: &dyn DocumentEngine) -> Value {
    match engine.name() {
        "markup" => json!("<ul><li>a</li><li>b</li></ul>"),
        _ => json!({ "li": ["a", "b"] }),
    }
}

#[tokio::test]
async fn test_reference_steps_ignore_the_document() {
    let reference = json!({ "user": { "tags": ["x", "y"] } });

    for engine in engines() {
        let document = document_for(engine.as_ref());
        let value = engine
            .exec(&document, &SelectorStep::reference("user.tags[1]"), &reference)
            .await
            .unwrap();
        assert_eq!(value, json!("y"), "engine {}", engine.name());

        let missing = engine
            .exec(&document, &SelectorStep::reference("user.age"), &reference)
            .await
            .unwrap();
        assert_eq!(missing, Value::Null, "engine {}", engine.name());
    }
}

#[tokio::test]
async fn test_root_and_length_agree_across_engines() {
    for engine in engines() {
        let document = document_for(engine.as_ref());

        let root = engine.exec(&document, &SelectorStep::root(), &json!({})).await.unwrap();
        assert_eq!(root, document);

        let step = SelectorStep::selector("li").with_prop(reserved::PROP_LENGTH);
        let length = engine.exec(&document, &step, &json!({})).await.unwrap();
        assert_eq!(length, json!(2), "engine {}", engine.name());
    }
}

#[tokio::test]
async fn test_step_validation_is_shared() {
    let ambiguous = SelectorStep {
        reference: Some("a".into()),
        selector: Some("b".into()),
        ..SelectorStep::default()
    };

    for engine in engines() {
        let document = document_for(engine.as_ref());
        let result = engine.exec(&document, &ambiguous, &json!({})).await;
        assert_eq!(
            result,
            Err(EngineError::RefAndSelector {
                engine: engine.name().to_string()
            })
        );
    }
}

#[tokio::test]
async fn test_lifecycle_through_trait_objects() {
    for engine in engines() {
        engine.start().await.unwrap();
        engine.start().await.unwrap();
        engine.stop().await.unwrap();
        engine.stop().await.unwrap();
    }
}
