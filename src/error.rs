//! Error types for the pricescout crate.
//!
//! Only two conditions abort a query: an invalid query (checked before any
//! fan-out) and an invalid configuration (checked at construction). Failures
//! local to one source or one record are absorbed as values — per-source
//! [`crate::types::SourceReport`]s and a rejected-record count — and never
//! surface as errors.

/// Fatal errors for an aggregation run.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// The query was rejected before any source was contacted:
    /// empty text, unsupported country, or a zero result limit.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The aggregator configuration is unusable.
    #[error("config error: {0}")]
    Config(String),
}

/// Errors an individual source adapter can produce. The orchestrator
/// converts these into tagged per-source reports; they never abort a query.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// HTTP request to the source failed.
    #[error("network error: {0}")]
    Network(String),

    /// Response received but the expected offer structure was not found.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Convenience type alias for pricescout results.
pub type Result<T> = std::result::Result<T, AggregateError>;
