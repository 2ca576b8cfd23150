//! Schema module - the declarative description of what to extract
//!
//! A schema names the repeating scope to iterate over (`_scope`), optionally
//! asks for the per-element records to be folded into one (`_merge`), and maps
//! every other key either to a chain of selector steps or to a nested schema.
//!
//! ```
//! use harvester_domain::Schema;
//! use serde_json::json;
//!
//! let schema = Schema::from_value(json!({
//!     "_scope": [{ "selector": "items" }],
//!     "name": [{ "selector": "name" }],
//!     "tags": {
//!         "_scope": [{ "selector": "tags" }],
//!         "label": [{ "selector": "$root" }]
//!     }
//! })).unwrap();
//!
//! assert_eq!(schema.leaf_fields().count(), 1);
//! assert_eq!(schema.child_fields().count(), 1);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Reserved selector and property tokens
pub mod reserved {
    /// Selector that returns the current document unchanged
    pub const ROOT_SELECTOR: &str = "$root";

    /// Property that yields the text content of the first markup match
    pub const PROP_TEXT: &str = "$text";

    /// Property that yields the number of matches or items
    pub const PROP_LENGTH: &str = "$length";

    /// Reference key carrying the enclosing scope element's leaf record
    pub const PARENT_REF: &str = "$parent";
}

/// One post-processing instruction attached to a selector step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Registered filter identifier, e.g. `filter.toNumber`
    pub id: String,

    /// Lower priorities run first
    #[serde(default)]
    pub priority: i32,

    /// Filter-specific options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opts: Option<Value>,
}

impl FilterSpec {
    /// Create a filter instruction without options
    pub fn new(id: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            priority,
            opts: None,
        }
    }

    /// Attach filter options
    pub fn with_opts(mut self, opts: Value) -> Self {
        self.opts = Some(opts);
        self
    }
}

/// One atomic resolution instruction
///
/// Exactly one of `reference` or `selector` must be set; engines reject
/// anything else when the step is evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectorStep {
    /// Path into the caller-supplied reference context
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Format-specific locator, or [`reserved::ROOT_SELECTOR`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    /// Markup locator whose matches are removed before `selector` runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unselector: Option<String>,

    /// Property to read from the match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prop: Option<String>,

    /// Fallback step: only used when the accumulated value is falsy
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub or: bool,

    /// Post-processing applied to this step's raw value
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterSpec>,
}

impl SelectorStep {
    /// Step that reads a document locator
    pub fn selector(selector: impl Into<String>) -> Self {
        Self {
            selector: Some(selector.into()),
            ..Self::default()
        }
    }

    /// Step that reads a reference-context path
    pub fn reference(path: impl Into<String>) -> Self {
        Self {
            reference: Some(path.into()),
            ..Self::default()
        }
    }

    /// Step that returns the current document unchanged
    pub fn root() -> Self {
        Self::selector(reserved::ROOT_SELECTOR)
    }

    /// Read a property of the match
    pub fn with_prop(mut self, prop: impl Into<String>) -> Self {
        self.prop = Some(prop.into());
        self
    }

    /// Remove matches of `unselector` before selecting
    pub fn with_unselector(mut self, unselector: impl Into<String>) -> Self {
        self.unselector = Some(unselector.into());
        self
    }

    /// Mark the step as a fallback
    pub fn or(mut self) -> Self {
        self.or = true;
        self
    }

    /// Append a post-processing filter
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filters.push(filter);
        self
    }

    /// Whether the step selects the whole document
    pub fn is_root(&self) -> bool {
        self.selector.as_deref() == Some(reserved::ROOT_SELECTOR)
    }
}

/// A field of a schema: either a step chain or a nested schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaField {
    /// Ordered chain of selector steps folded into one value
    Steps(Vec<SelectorStep>),

    /// Nested schema resolved against the same scope element
    Nested(Box<Schema>),
}

/// A (possibly nested) extraction schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Steps locating the repeating elements
    #[serde(rename = "_scope", default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Vec<SelectorStep>>,

    /// Fold the per-element records into one shallow-merged record
    #[serde(rename = "_merge", default, skip_serializing_if = "std::ops::Not::not")]
    pub merge: bool,

    /// Output fields keyed by name
    #[serde(flatten)]
    pub fields: BTreeMap<String, SchemaField>,
}

impl Schema {
    /// Create a schema iterating over the given scope
    pub fn new(scope: Vec<SelectorStep>) -> Self {
        Self {
            scope: Some(scope),
            merge: false,
            fields: BTreeMap::new(),
        }
    }

    /// Parse a schema from its JSON wire shape
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Parse a schema from JSON text
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Add a leaf field
    pub fn with_field(mut self, name: impl Into<String>, steps: Vec<SelectorStep>) -> Self {
        self.fields.insert(name.into(), SchemaField::Steps(steps));
        self
    }

    /// Add a nested schema field
    pub fn with_child(mut self, name: impl Into<String>, child: Schema) -> Self {
        self.fields.insert(name.into(), SchemaField::Nested(Box::new(child)));
        self
    }

    /// Request a single merged record instead of an array
    pub fn merged(mut self) -> Self {
        self.merge = true;
        self
    }

    /// True when nothing at all was declared
    pub fn is_empty(&self) -> bool {
        self.scope.is_none() && !self.merge && self.fields.is_empty()
    }

    /// Fields bound to selector-step chains
    pub fn leaf_fields(&self) -> impl Iterator<Item = (&str, &[SelectorStep])> {
        self.fields.iter().filter_map(|(name, field)| match field {
            SchemaField::Steps(steps) => Some((name.as_str(), steps.as_slice())),
            SchemaField::Nested(_) => None,
        })
    }

    /// Fields bound to nested schemas
    pub fn child_fields(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.fields.iter().filter_map(|(name, field)| match field {
            SchemaField::Nested(schema) => Some((name.as_str(), schema.as_ref())),
            SchemaField::Steps(_) => None,
        })
    }
}
