//! TTL cache for ranked result sets.
//!
//! Caches the final deduplicated, scored, sorted offers keyed by the
//! normalized query, country, and result-shape parameters. Uses [`moka`]
//! for async-friendly caching with TTL and bounded capacity. Expired
//! entries are treated as misses on read (lazy eviction).
//!
//! The cache is an explicitly constructed value owned by the
//! [`crate::Aggregator`] — not process-global state — so independent
//! aggregators never share entries. Entries are written whole and never
//! mutated in place; concurrent queries each `put` a fresh entry.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::types::{OutcomeStatus, Query, ScoredOffer};

/// Composite cache key: normalized query text plus every parameter that
/// changes the result shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Lowercased, whitespace-collapsed query text.
    text: String,
    /// Uppercased country code.
    country: String,
    /// Result limit; different limits are different result shapes.
    result_limit: usize,
    /// Fixture-mode results must never be served for live queries.
    fixtures: bool,
}

impl CacheKey {
    /// Build a deterministic cache key from a query.
    ///
    /// Pure function of the query: the same logical query (modulo case and
    /// whitespace) always produces the same key.
    pub fn new(query: &Query) -> Self {
        Self {
            text: query.normalized_text(),
            country: query.country.to_uppercase(),
            result_limit: query.result_limit,
            fixtures: query.use_local_fixtures,
        }
    }
}

/// What the cache stores for one key: the ranked offers and the status they
/// were computed with, so a hit reproduces the original outcome.
#[derive(Debug)]
pub struct CachedOutcome {
    /// Ranked offers, best first.
    pub offers: Vec<ScoredOffer>,
    /// Outcome status at compute time.
    pub status: OutcomeStatus,
}

/// TTL cache for ranked result sets.
#[derive(Clone)]
pub struct ResultCache {
    inner: Cache<CacheKey, Arc<CachedOutcome>>,
}

impl ResultCache {
    /// Create a cache holding at most `capacity` entries, each valid for
    /// `ttl` after insertion.
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Look up a ranked result set. Returns `None` on miss or expiry.
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<CachedOutcome>> {
        self.inner.get(key).await
    }

    /// Store a freshly computed result set under `key`.
    pub async fn put(&self, key: CacheKey, offers: Vec<ScoredOffer>, status: OutcomeStatus) {
        self.inner
            .insert(key, Arc::new(CachedOutcome { offers, status }))
            .await;
    }

    /// Remove all entries unconditionally. Administrative reset; the
    /// aggregation path never calls this.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Query;

    fn key_for(text: &str, country: &str) -> CacheKey {
        CacheKey::new(&Query::new(text, country))
    }

    #[test]
    fn same_logical_query_same_key() {
        assert_eq!(key_for("iPhone 16", "in"), key_for("  iphone   16 ", "IN"));
    }

    #[test]
    fn different_text_different_key() {
        assert_ne!(key_for("iphone", "IN"), key_for("pixel", "IN"));
    }

    #[test]
    fn different_country_different_key() {
        assert_ne!(key_for("iphone", "IN"), key_for("iphone", "US"));
    }

    #[test]
    fn result_limit_is_part_of_the_key() {
        let mut q = Query::new("iphone", "IN");
        let small = CacheKey::new(&q);
        q.result_limit = 25;
        let large = CacheKey::new(&q);
        assert_ne!(small, large);
    }

    #[test]
    fn fixture_mode_is_part_of_the_key() {
        let mut q = Query::new("iphone", "IN");
        let live = CacheKey::new(&q);
        q.use_local_fixtures = true;
        let fixtures = CacheKey::new(&q);
        assert_ne!(live, fixtures);
    }

    #[tokio::test]
    async fn miss_returns_none() {
        let cache = ResultCache::new(10, Duration::from_secs(60));
        assert!(cache.get(&key_for("nothing here", "US")).await.is_none());
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = ResultCache::new(10, Duration::from_secs(60));
        let key = key_for("cached query", "IN");
        cache
            .put(key.clone(), vec![], OutcomeStatus::NothingMatched)
            .await;
        let hit = cache.get(&key).await.expect("should be cached");
        assert_eq!(hit.status, OutcomeStatus::NothingMatched);
        assert!(hit.offers.is_empty());
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache = ResultCache::new(10, Duration::from_millis(50));
        let key = key_for("short lived", "US");
        cache.put(key.clone(), vec![], OutcomeStatus::Ranked).await;
        assert!(cache.get(&key).await.is_some());
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let cache = ResultCache::new(10, Duration::from_secs(60));
        let key = key_for("to clear", "US");
        cache.put(key.clone(), vec![], OutcomeStatus::Ranked).await;
        cache.clear();
        // moka invalidate_all is immediate from the reader's perspective.
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn independent_caches_do_not_share_entries() {
        let a = ResultCache::new(10, Duration::from_secs(60));
        let b = ResultCache::new(10, Duration::from_secs(60));
        let key = key_for("isolated", "US");
        a.put(key.clone(), vec![], OutcomeStatus::Ranked).await;
        assert!(a.get(&key).await.is_some());
        assert!(b.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn overwrite_same_key_updates_value() {
        let cache = ResultCache::new(10, Duration::from_secs(60));
        let key = key_for("overwrite", "US");
        cache
            .put(key.clone(), vec![], OutcomeStatus::NothingMatched)
            .await;
        cache.put(key.clone(), vec![], OutcomeStatus::Ranked).await;
        let hit = cache.get(&key).await.expect("should be cached");
        assert_eq!(hit.status, OutcomeStatus::Ranked);
    }
}
