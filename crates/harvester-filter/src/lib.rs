//! Harvester Filter Pipeline
//!
//! Implementations of the `FilterPipeline` trait from `harvester-domain`.
//!
//! # Pipelines
//!
//! - `FilterRegistry`: named filters applied in priority order, with built-ins
//!   for type coercion and text clean-up
//! - `MockPipeline`: records calls and passes values through, for tests
//!
//! # Built-in filters
//!
//! | id | effect |
//! |----|--------|
//! | `filter.toNumber` | numeric coercion, `null` when not numeric |
//! | `filter.toString` | plain-text rendering |
//! | `filter.toBoolean` | truthiness |
//! | `filter.trim` | trim text (or every text item of an array) |
//! | `filter.toLowerCase` / `filter.toUpperCase` | case folding |
//! | `filter.toDate` | RFC 3339 UTC timestamp, `null` when unparseable |
//! | `filter.default` | `opts.value` or the reference at `opts.ref` for falsy values |
//! | `filter.replace` | literal `opts.pattern` -> `opts.replacement` |
//! | `filter.split` / `filter.join` | on `opts.separator`, default `,` |
//!
//! # Configuration
//!
//! ```toml
//! strict = false  # unknown filter ids are skipped with a warning
//! ```

#![warn(missing_docs)]

mod builtin;
mod config;
mod mock;
mod registry;

pub use config::FilterConfig;
pub use mock::MockPipeline;
pub use registry::{FilterContext, FilterFn, FilterRegistry};
