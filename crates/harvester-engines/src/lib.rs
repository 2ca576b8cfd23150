//! Harvester Document Engines
//!
//! Implementations of the `DocumentEngine` trait from `harvester-domain`.
//!
//! # Engines
//!
//! - `StructuredEngine`: objects and arrays, addressed by property paths (`a.b[0].c`)
//! - `MarkupEngine`: HTML text, addressed by CSS selectors
//!
//! Both engines resolve `ref` steps against the reference context and the
//! `$root` selector to the document itself; only plain selectors reach the
//! format-specific code.
//!
//! # Examples
//!
//! ```
//! use harvester_domain::{DocumentEngine, SelectorStep};
//! use harvester_engines::StructuredEngine;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let engine = StructuredEngine::new();
//! let doc = json!({ "user": { "name": "Ada" } });
//! let name = engine
//!     .exec(&doc, &SelectorStep::selector("user.name"), &json!({}))
//!     .await
//!     .unwrap();
//! assert_eq!(name, json!("Ada"));
//! # }
//! ```

#![warn(missing_docs)]

mod common;
pub mod markup;
pub mod structured;

pub use markup::MarkupEngine;
pub use structured::StructuredEngine;
