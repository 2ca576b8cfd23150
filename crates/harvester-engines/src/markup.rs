//! Markup engine - HTML text addressed by CSS selectors

use crate::common::{empty, preflight, Lifecycle, Preflight};
use async_trait::async_trait;
use harvester_domain::reserved::{PROP_LENGTH, PROP_TEXT};
use harvester_domain::value::{interpolate, is_truthy};
use harvester_domain::{DocumentEngine, EngineError, SelectorStep};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, info};

const NAME: &str = "markup";

/// Engine for HTML documents
///
/// Without a `prop` a step yields every match as serialized HTML. With a
/// `prop` it reads from the first match only:
///
/// | prop | result |
/// |------|--------|
/// | `$length` | number of matches |
/// | `$text` | text content |
/// | `innerHTML` / `outerHTML` | serialized markup |
/// | `tagName` | upper-case tag name |
/// | anything else | attribute value |
///
/// A missing match or attribute yields `""`. The optional `unselector` is
/// interpolated against the reference context (`${path}`, `<%= path %>`)
/// and its matches are removed before `selector` runs.
#[derive(Debug, Default)]
pub struct MarkupEngine {
    lifecycle: Lifecycle,
}

impl MarkupEngine {
    /// Create a new markup engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `start` has been called without a matching `stop`
    pub fn is_started(&self) -> bool {
        self.lifecycle.is_started()
    }

    /// Evaluate a plain selector step against parsed markup
    ///
    /// `Html` is not `Send`, so all parsing stays inside this synchronous call.
    fn select(
        &self,
        markup: &str,
        selector: &str,
        step: &SelectorStep,
        reference: &Value,
    ) -> Result<Value, EngineError> {
        let mut html = Html::parse_document(markup);

        if let Some(unselector) = step.unselector.as_deref() {
            let unselector = interpolate(unselector, reference);
            if !unselector.trim().is_empty() {
                let removed = remove_matches(&mut html, &unselector)?;
                debug!("Removed {} elements matching '{}'", removed, unselector);
            }
        }

        let selector = parse_selector(selector)?;
        let root = html.root_element();
        let mut matches = root.select(&selector);

        match step.prop.as_deref() {
            None => Ok(Value::Array(
                matches.map(|element| Value::String(element.html())).collect(),
            )),
            Some(PROP_LENGTH) => Ok(Value::from(matches.count())),
            Some(prop) => {
                let Some(first) = matches.next() else {
                    return Ok(empty());
                };
                if prop == PROP_TEXT {
                    return Ok(Value::String(first.text().collect()));
                }
                Ok(Value::String(property(&first, prop).unwrap_or_default()))
            }
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector, EngineError> {
    Selector::parse(selector).map_err(|e| EngineError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Detach every element matching `selector`; returns how many were removed
///
/// Detached nodes stay in the arena, so later lookups must start from
/// `root_element()` rather than `Html::select`.
fn remove_matches(html: &mut Html, selector: &str) -> Result<usize, EngineError> {
    let selector = parse_selector(selector)?;
    let ids: Vec<_> = html
        .root_element()
        .select(&selector)
        .map(|element| element.id())
        .collect();

    for id in &ids {
        if let Some(mut node) = html.tree.get_mut(*id) {
            node.detach();
        }
    }
    Ok(ids.len())
}

fn clean_markup(markup: &str, selectors: &[String]) -> Result<String, EngineError> {
    let mut html = Html::parse_document(markup);
    let removed = remove_matches(&mut html, &selectors.join(","))?;
    debug!("Cleaned {} elements", removed);
    Ok(html.html())
}

fn property(element: &ElementRef<'_>, prop: &str) -> Option<String> {
    match prop {
        "innerHTML" => Some(element.inner_html()),
        "outerHTML" => Some(element.html()),
        "tagName" | "nodeName" => Some(element.value().name().to_uppercase()),
        "textContent" | "innerText" => Some(element.text().collect()),
        attribute => element.value().attr(attribute).map(str::to_string),
    }
}

#[async_trait]
impl DocumentEngine for MarkupEngine {
    fn name(&self) -> &str {
        NAME
    }

    async fn start(&self) -> Result<(), EngineError> {
        if self.lifecycle.start() {
            info!("Markup engine started");
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), EngineError> {
        if self.lifecycle.stop() {
            info!("Markup engine stopped");
        }
        Ok(())
    }

    async fn exec(
        &self,
        document: &Value,
        step: &SelectorStep,
        reference: &Value,
    ) -> Result<Value, EngineError> {
        let markup = match document {
            Value::String(markup) if is_truthy(document) => markup,
            _ => return Ok(empty()),
        };

        match preflight(NAME, document, step, reference)? {
            Preflight::Resolved(value) => Ok(value),
            Preflight::Select(selector) => self.select(markup, selector, step, reference),
        }
    }

    async fn clean(&self, document: Value, selectors: &[String]) -> Result<Value, EngineError> {
        if selectors.is_empty() {
            return Ok(document);
        }
        let markup = match &document {
            Value::String(markup) if !markup.is_empty() => markup,
            _ => return Ok(document),
        };

        clean_markup(markup, selectors).map(Value::String)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvester_domain::reserved::ROOT_SELECTOR;
    use serde_json::json;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head><title>Harvest test page</title></head>
  <body>
    <div class="ads"><a href="https://ads.example.com">Buy now</a></div>
    <ul id="items">
      <li class="item" data-id="1"><a href="https://example.com/1">One</a></li>
      <li class="item" data-id="2"><a href="https://example.com/2">Two</a></li>
      <li class="item" data-id="3"><a href="https://example.com/3">Three</a></li>
    </ul>
  </body>
</html>"#;

    fn page() -> Value {
        json!(PAGE)
    }

    async fn run(step: SelectorStep) -> Value {
        MarkupEngine::new()
            .exec(&page(), &step, &json!({ "skip": "ads" }))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_wrong_document_type_is_empty() {
        let engine = MarkupEngine::new();
        let step = SelectorStep::selector("title");
        for doc in [json!(null), json!(""), json!({ "title": "x" }), json!([1])] {
            assert_eq!(engine.exec(&doc, &step, &json!({})).await.unwrap(), json!(""));
        }
    }

    #[tokio::test]
    async fn test_step_without_ref_or_selector_fails() {
        let result = MarkupEngine::new()
            .exec(&page(), &SelectorStep::default(), &json!({}))
            .await;
        assert!(matches!(result, Err(EngineError::NoRefAndSelector { .. })));
    }

    #[tokio::test]
    async fn test_reference_and_root() {
        assert_eq!(run(SelectorStep::reference("skip")).await, json!("ads"));
        assert_eq!(run(SelectorStep::selector(ROOT_SELECTOR)).await, page());
    }

    #[tokio::test]
    async fn test_raw_matches() {
        let matches = run(SelectorStep::selector("title")).await;
        let matches = matches.as_array().unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].as_str().unwrap().contains("<title>"));

        assert_eq!(run(SelectorStep::selector("li.item")).await.as_array().unwrap().len(), 3);
        assert_eq!(run(SelectorStep::selector("table")).await, json!([]));
    }

    #[tokio::test]
    async fn test_length() {
        assert_eq!(run(SelectorStep::selector("li").with_prop(PROP_LENGTH)).await, json!(3));
        assert_eq!(run(SelectorStep::selector("table").with_prop(PROP_LENGTH)).await, json!(0));
    }

    #[tokio::test]
    async fn test_text_and_properties() {
        assert_eq!(
            run(SelectorStep::selector("title").with_prop(PROP_TEXT)).await,
            json!("Harvest test page")
        );
        assert_eq!(
            run(SelectorStep::selector("li.item a").with_prop(PROP_TEXT)).await,
            json!("One")
        );
        assert_eq!(
            run(SelectorStep::selector("li.item").with_prop("data-id")).await,
            json!("1")
        );
        assert_eq!(
            run(SelectorStep::selector("li.item").with_prop("tagName")).await,
            json!("LI")
        );
        assert_eq!(run(SelectorStep::selector("title").with_prop("href")).await, json!(""));
        assert_eq!(run(SelectorStep::selector("nothing").with_prop(PROP_TEXT)).await, json!(""));
    }

    #[tokio::test]
    async fn test_unselector_removes_before_select() {
        let step = SelectorStep::selector("title")
            .with_unselector("title")
            .with_prop(PROP_TEXT);
        assert_eq!(run(step).await, json!(""));

        let first_link = SelectorStep::selector("a").with_prop("href");
        assert_eq!(run(first_link.clone()).await, json!("https://ads.example.com"));

        let templated = first_link.with_unselector(".${skip}");
        assert_eq!(run(templated).await, json!("https://example.com/1"));
    }

    #[tokio::test]
    async fn test_unselector_removes_nested_matches() {
        let engine = MarkupEngine::new();
        let doc = json!(r#"<div class="ads"><a href="ad">Buy</a></div><a href="real">Real</a>"#);
        let reference = json!({});

        let href = SelectorStep::selector("a").with_prop("href").with_unselector(".ads");
        assert_eq!(engine.exec(&doc, &href, &reference).await.unwrap(), json!("real"));

        let count = SelectorStep::selector("a")
            .with_prop(PROP_LENGTH)
            .with_unselector(".ads");
        assert_eq!(engine.exec(&doc, &count, &reference).await.unwrap(), json!(1));

        let raw = SelectorStep::selector("a").with_unselector(".ads");
        assert_eq!(
            engine.exec(&doc, &raw, &reference).await.unwrap(),
            json!([r#"<a href="real">Real</a>"#])
        );

        let text = SelectorStep::selector("body")
            .with_prop(PROP_TEXT)
            .with_unselector(".ads");
        assert_eq!(engine.exec(&doc, &text, &reference).await.unwrap(), json!("Real"));
    }

    #[tokio::test]
    async fn test_invalid_selector() {
        let result = MarkupEngine::new()
            .exec(&page(), &SelectorStep::selector("li[["), &json!({}))
            .await;
        assert!(matches!(result, Err(EngineError::InvalidSelector { .. })));
    }

    #[tokio::test]
    async fn test_clean() {
        let engine = MarkupEngine::new();

        assert_eq!(engine.clean(page(), &[]).await.unwrap(), page());
        assert_eq!(engine.clean(Value::Null, &["title".into()]).await.unwrap(), Value::Null);
        assert_eq!(engine.clean(json!([1, 2]), &["title".into()]).await.unwrap(), json!([1, 2]));

        let cleaned = engine
            .clean(page(), &["title".into(), ".ads".into()])
            .await
            .unwrap();
        let cleaned = cleaned.as_str().unwrap();
        assert!(!cleaned.contains("title"));
        assert!(!cleaned.contains("Buy now"));
        assert!(cleaned.contains("https://example.com/3"));
    }
}
