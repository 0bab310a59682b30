//! Core types for queries, offers and per-source fetch reports.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A product search request: what to look for and where.
///
/// Immutable once constructed. The same logical query always maps to the
/// same cache key (see [`crate::cache::CacheKey`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Free-text product description, e.g. `"iPhone 16 Pro Max"`.
    pub text: String,
    /// Two-letter country code selecting the source set, e.g. `"IN"`.
    pub country: String,
    /// Maximum number of ranked offers to return.
    pub result_limit: usize,
    /// Serve from bundled HTML captures instead of the live sites.
    /// Makes runs reproducible without network access.
    pub use_local_fixtures: bool,
}

impl Query {
    /// Build a query with the default result limit (10) and live sources.
    pub fn new(text: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            country: country.into(),
            result_limit: 10,
            use_local_fixtures: false,
        }
    }

    /// Query text lowercased with internal whitespace collapsed.
    /// Used for cache keying and relevance matching.
    pub fn normalized_text(&self) -> String {
        self.text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

/// Storefront sites that pricescout can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    /// Amazon — per-country domains (.com, .in, .co.uk, .de, .ca).
    Amazon,
    /// Flipkart — India only.
    Flipkart,
    /// eBay — per-country domains.
    Ebay,
    /// Walmart — US only.
    Walmart,
    /// Snapdeal — India only.
    Snapdeal,
    /// Shopsy — India only.
    Shopsy,
}

impl Source {
    /// Returns the human-readable name of this source.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Amazon => "Amazon",
            Self::Flipkart => "Flipkart",
            Self::Ebay => "eBay",
            Self::Walmart => "Walmart",
            Self::Snapdeal => "Snapdeal",
            Self::Shopsy => "Shopsy",
        }
    }

    /// Default reliability weight in `[0, 1]` used by the ranking scorer.
    /// Can be overridden per country via configuration.
    pub fn trust(&self) -> f64 {
        match self {
            Self::Amazon => 0.95,
            Self::Walmart => 0.95,
            Self::Flipkart => 0.90,
            Self::Ebay => 0.85,
            Self::Snapdeal => 0.80,
            Self::Shopsy => 0.75,
        }
    }

    /// Returns all known source variants.
    pub fn all() -> &'static [Source] {
        &[
            Self::Amazon,
            Self::Flipkart,
            Self::Ebay,
            Self::Walmart,
            Self::Snapdeal,
            Self::Shopsy,
        ]
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A price as extracted from a source page: either already numeric or a
/// display string such as `"₹1,52,900"` that still needs parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    /// Numeric price from an API-style source.
    Amount(f64),
    /// Display text from a scraped page, with symbols and grouping intact.
    Text(String),
}

/// An offer exactly as an adapter extracted it, before validation.
///
/// Owned by the orchestrator call that produced it; consumed by
/// normalization and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOffer {
    /// The source this record came from.
    pub source: Source,
    /// Product name as displayed, untrimmed.
    pub raw_name: String,
    /// Price as extracted — see [`RawPrice`].
    pub raw_price: RawPrice,
    /// Currency code if the source stated one explicitly.
    pub raw_currency: Option<String>,
    /// Link to the listing. May be relative junk; validated later.
    pub link: String,
}

/// A validated, canonical product offer.
///
/// Invariants (enforced by the normalizer, see
/// [`crate::orchestrator::normalize`]):
/// - `price` is finite and non-negative
/// - `currency` is one of the country's accepted currencies
/// - `link` is an absolute http(s) URL
/// - `product_name` is non-empty with collapsed whitespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    /// Cleaned product name.
    pub product_name: String,
    /// Price in `currency` units.
    pub price: f64,
    /// ISO currency code, e.g. `"INR"`.
    pub currency: String,
    /// Absolute link to the listing.
    pub link: String,
    /// The source that produced this offer.
    pub source: Source,
}

/// A deduplicated offer: one representative per cluster of near-identical
/// listings, plus how many distinct sources corroborated it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteredOffer {
    /// The cheapest offer in the cluster (ties broken by source priority).
    pub offer: Offer,
    /// Number of distinct sources that listed this product.
    pub source_count: usize,
}

/// An offer with its ranking scores attached. Produced only by the scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredOffer {
    /// The underlying offer.
    pub offer: Offer,
    /// Query-relevance component in `[0, 1]`.
    pub relevance: f64,
    /// Weighted composite score in `[0, 1]`; the final ranking key.
    pub score: f64,
    /// Distinct sources corroborating this offer, carried through from dedup.
    pub source_count: usize,
}

/// What kind of failure a source produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceErrorKind {
    /// HTTP request failed (connect, TLS, non-2xx status).
    Network,
    /// Response received but could not be parsed into offers.
    Parse,
    /// Per-source timeout or overall deadline exceeded.
    Timeout,
    /// Source responded but extracted zero offers.
    Empty,
    /// The adapter task panicked. Isolated like any other failure.
    Panic,
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Network => "network",
            Self::Parse => "parse",
            Self::Timeout => "timeout",
            Self::Empty => "empty",
            Self::Panic => "panic",
        };
        f.write_str(s)
    }
}

/// Per-source outcome of one fan-out, for observability. The engine does
/// not interpret these beyond computing [`OutcomeStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    /// Which source this report is about.
    pub source: Source,
    /// What happened.
    pub status: SourceStatus,
}

/// Success or tagged failure for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceStatus {
    /// Source returned this many raw offers.
    Fetched(usize),
    /// Source contributed nothing, for this reason.
    Failed(SourceErrorKind),
}

/// Distinguishes the flavors of an empty (but valid) result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeStatus {
    /// At least one offer survived ranking.
    Ranked,
    /// Sources responded, but nothing matched the query well enough.
    NothingMatched,
    /// Every configured source failed; nothing was fetched at all.
    NoSourcesResponded,
}

/// The result of one aggregation run: the ranked offers plus everything the
/// caller needs to tell an empty success apart from a degraded one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Ranked offers, best first. May be empty — see `status`.
    pub offers: Vec<ScoredOffer>,
    /// Why the list looks the way it does.
    pub status: OutcomeStatus,
    /// Per-source fetch reports from the orchestrator. Empty on cache hits.
    pub reports: Vec<SourceReport>,
    /// Raw records dropped by normalization.
    pub rejected: usize,
    /// Whether this outcome was served from the cache.
    pub from_cache: bool,
}
