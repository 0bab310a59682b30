//! # pricescout
//!
//! Embedded price aggregation across retail storefronts.
//!
//! This crate answers "where is this product cheapest right now" by scraping
//! public storefront search pages directly — no API keys, no external
//! services, no user setup required. It compiles into a host binary as a
//! library dependency.
//!
//! ## Design
//!
//! - Scrapes Amazon, Flipkart, eBay, Walmart, Snapdeal and Shopsy using CSS
//!   selectors on HTML responses (Shopsy via its embedded JSON payload)
//! - Queries all of a country's sources concurrently; one slow or broken
//!   site never blocks or fails the query
//! - Normalizes messy listings to canonical offers, merges near-duplicate
//!   listings of the same product, and ranks by relevance, price and
//!   source reliability
//! - In-memory TTL cache keyed by the full query shape
//! - User-Agent rotation and request jitter for reliability
//!
//! ## Security
//!
//! - No API keys or secrets to leak
//! - No network listeners — this is a library, not a server
//! - Query text is logged only at trace level

pub mod adapter;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod sources;
pub mod types;

use std::sync::Arc;

use crate::adapter::SourceAdapter;
use crate::cache::{CacheKey, ResultCache};
pub use crate::config::AggregatorConfig;
pub use crate::error::{AggregateError, Result};
pub use crate::types::{Offer, OutcomeStatus, Query, ScoredOffer, SearchOutcome, Source};

/// The aggregation facade: one instance owns the HTTP client, the result
/// cache and the configuration, and serves any number of concurrent
/// searches.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> pricescout::Result<()> {
/// let aggregator = pricescout::Aggregator::new(pricescout::AggregatorConfig::default())?;
/// let outcome = aggregator
///     .search(&pricescout::Query::new("iPhone 16 Pro Max", "IN"))
///     .await?;
/// for scored in &outcome.offers {
///     println!("{}: {} {}", scored.offer.source, scored.offer.price, scored.offer.product_name);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Aggregator {
    config: AggregatorConfig,
    cache: ResultCache,
    client: reqwest::Client,
    /// Fixed adapter set for tests; bypasses per-country registry building.
    registry_override: Option<Vec<Arc<dyn SourceAdapter>>>,
}

impl Aggregator {
    /// Build an aggregator from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Config`] when the configuration is invalid
    /// or the HTTP client cannot be constructed.
    pub fn new(config: AggregatorConfig) -> Result<Self> {
        config.validate()?;
        let client = http::build_client(&config)
            .map_err(|e| AggregateError::Config(format!("http client: {e}")))?;
        let cache = ResultCache::new(config.cache_capacity, config.cache_ttl);
        Ok(Self {
            config,
            cache,
            client,
            registry_override: None,
        })
    }

    /// Build an aggregator that fans out to exactly the given adapters for
    /// every query, regardless of country. Intended for tests.
    ///
    /// # Errors
    ///
    /// Same validation as [`Aggregator::new`].
    pub fn with_registry(
        config: AggregatorConfig,
        registry: Vec<Arc<dyn SourceAdapter>>,
    ) -> Result<Self> {
        config.validate()?;
        let client = http::build_client(&config)
            .map_err(|e| AggregateError::Config(format!("http client: {e}")))?;
        let cache = ResultCache::new(config.cache_capacity, config.cache_ttl);
        Ok(Self {
            config,
            cache,
            client,
            registry_override: Some(registry),
        })
    }

    /// Run one aggregation: fan out, normalize, dedupe, score, rank, cache.
    ///
    /// Source failures never surface here; they are folded into the
    /// outcome's per-source reports. An empty offer list is a legal `Ok`,
    /// with [`OutcomeStatus`] telling the flavors apart.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::InvalidQuery`] for empty query text, an
    /// unsupported country code or a zero result limit. Nothing else fails.
    pub async fn search(&self, query: &Query) -> Result<SearchOutcome> {
        let country = self.validate_query(query)?;

        let key = CacheKey::new(query);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(query = %query.normalized_text(), "cache hit");
            return Ok(SearchOutcome {
                offers: cached.offers.clone(),
                status: cached.status,
                reports: Vec::new(),
                rejected: 0,
                from_cache: true,
            });
        }

        let registry = match &self.registry_override {
            Some(fixed) => fixed.clone(),
            None if query.use_local_fixtures => sources::fixture_registry(country),
            None => sources::live_registry(
                &self.client,
                &query.country,
                country,
                self.config.user_agent.as_deref(),
            ),
        };

        let outcome =
            orchestrator::aggregate::run(query, &registry, &self.config, country).await;
        self.cache
            .put(key, outcome.offers.clone(), outcome.status)
            .await;
        Ok(outcome)
    }

    /// Drop every cached outcome.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn validate_query<'a>(&'a self, query: &Query) -> Result<&'a config::CountryConfig> {
        if query.text.trim().is_empty() {
            return Err(AggregateError::InvalidQuery(
                "query text must not be empty".into(),
            ));
        }
        if query.result_limit == 0 {
            return Err(AggregateError::InvalidQuery(
                "result_limit must be at least 1".into(),
            ));
        }
        self.config.country(&query.country).ok_or_else(|| {
            AggregateError::InvalidQuery(format!("unsupported country: {}", query.country))
        })
    }
}
