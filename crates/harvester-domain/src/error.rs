//! Error types shared by engines and filter pipelines

use thiserror::Error;

/// Errors raised while resolving a single selector step
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The step names neither a reference path nor a selector
    #[error("NO_REF_AND_SELECTOR: {engine} engine received a step without `ref` or `selector`")]
    NoRefAndSelector {
        /// Name of the engine that rejected the step
        engine: String,
    },

    /// The step names both a reference path and a selector
    #[error("REF_AND_SELECTOR: {engine} engine received a step with both `ref` and `selector`")]
    RefAndSelector {
        /// Name of the engine that rejected the step
        engine: String,
    },

    /// A markup locator could not be parsed
    #[error("INVALID_SELECTOR: `{selector}`: {reason}")]
    InvalidSelector {
        /// The offending locator
        selector: String,
        /// Parser diagnostic
        reason: String,
    },
}

/// Errors raised by a filter pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// No filter is registered under this id
    #[error("UNKNOWN_FILTER: {0}")]
    UnknownFilter(String),

    /// A filter received options it cannot use
    #[error("Invalid options for {id}: {reason}")]
    InvalidOptions {
        /// Filter id
        id: String,
        /// What was wrong with the options
        reason: String,
    },

    /// Generic pipeline failure
    #[error("Filter pipeline error: {0}")]
    Pipeline(String),
}
