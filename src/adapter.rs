//! Trait definition for pluggable source adapters.
//!
//! Each storefront (Amazon, Flipkart, eBay, ...) implements
//! [`SourceAdapter`] to provide a uniform interface for fetching raw offer
//! records. The orchestrator depends only on this contract, so test doubles
//! and fixture-backed adapters plug in the same way live scrapers do.

use async_trait::async_trait;

use crate::error::AdapterError;
use crate::types::{Query, RawOffer, Source};

/// A pluggable storefront backend.
///
/// Implementors own everything site-specific:
///
/// - search URL construction with query encoding
/// - the HTTP request with appropriate headers
/// - HTML parsing via CSS selectors
/// - mapping site failures onto [`AdapterError`]
///
/// Contract: implementations must be safe to invoke concurrently, must not
/// share mutable state across invocations, and must never perform retries —
/// a failed fetch simply contributes zero offers to the current query.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Fetch raw offers for a query.
    ///
    /// An empty vector is a legal return (the orchestrator reports it as an
    /// `Empty` source status); errors are isolated per source and never
    /// abort the overall query.
    async fn fetch(&self, query: &Query) -> Result<Vec<RawOffer>, AdapterError>;

    /// Which [`Source`] this adapter represents.
    fn source(&self) -> Source;
}
