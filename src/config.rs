//! Aggregator configuration with sensible defaults.
//!
//! [`AggregatorConfig`] is built once at startup, validated, and read-only
//! afterwards. There is no hidden global state: the configuration is owned
//! by the [`crate::Aggregator`] and shared by reference.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::AggregateError;
use crate::types::Source;

/// Per-country source set and currency rules.
#[derive(Debug, Clone)]
pub struct CountryConfig {
    /// Sources to query for this country, in priority order. The order is
    /// also the dedup tie-break when two sources list the same price.
    pub sources: Vec<Source>,
    /// Canonical currency assumed when a source does not state one.
    pub currency: String,
    /// Currencies an offer may carry without being rejected.
    /// Always includes the canonical currency.
    pub accepted_currencies: Vec<String>,
    /// Per-source trust overrides; sources not listed use
    /// [`Source::trust`].
    pub trust_overrides: HashMap<Source, f64>,
}

impl CountryConfig {
    fn new(sources: Vec<Source>, currency: &str) -> Self {
        Self {
            sources,
            currency: currency.to_string(),
            accepted_currencies: vec![currency.to_string()],
            trust_overrides: HashMap::new(),
        }
    }

    /// Trust weight for a source in this country.
    pub fn trust(&self, source: Source) -> f64 {
        self.trust_overrides
            .get(&source)
            .copied()
            .unwrap_or_else(|| source.trust())
    }

    /// Position of a source in the priority order; unlisted sources rank last.
    pub fn source_priority(&self, source: Source) -> usize {
        self.sources
            .iter()
            .position(|s| *s == source)
            .unwrap_or(usize::MAX)
    }

    /// Whether a currency code is acceptable for offers in this country.
    pub fn accepts_currency(&self, code: &str) -> bool {
        self.accepted_currencies.iter().any(|c| c == code)
    }
}

/// Thresholds controlling when two offers are considered the same product.
#[derive(Debug, Clone, Copy)]
pub struct DedupConfig {
    /// Minimum token-set name similarity for a merge, in `(0, 1]`.
    pub name_similarity: f64,
    /// Maximum relative price gap for a merge, e.g. `0.15` for ±15%.
    pub price_tolerance: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            name_similarity: 0.85,
            price_tolerance: 0.15,
        }
    }
}

/// Ranking weights and the relevance cut-off.
///
/// The constants are empirically tuned, not derived — they are configuration
/// precisely so they can be adjusted without touching the scorer.
#[derive(Debug, Clone, Copy)]
pub struct ScoringConfig {
    /// Weight of query relevance in the composite score.
    pub relevance_weight: f64,
    /// Weight of price competitiveness in the composite score.
    pub price_weight: f64,
    /// Weight of source trust in the composite score.
    pub trust_weight: f64,
    /// Offers with relevance below this are excluded entirely.
    pub relevance_floor: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            relevance_weight: 0.75,
            price_weight: 0.20,
            trust_weight: 0.05,
            relevance_floor: 0.20,
        }
    }
}

/// Configuration for the aggregation engine.
///
/// Use [`Default::default()`] for the built-in country table, or construct
/// with field overrides. Must pass [`AggregatorConfig::validate`] before use;
/// [`crate::Aggregator::new`] enforces this.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Country code → source set and currency rules.
    pub countries: HashMap<String, CountryConfig>,
    /// Time box for each individual source fetch.
    pub per_source_timeout: Duration,
    /// Hard wall-clock bound for the whole fan-out. Sources still
    /// outstanding when it fires are abandoned.
    pub overall_deadline: Duration,
    /// How long a ranked result set stays servable from cache.
    pub cache_ttl: Duration,
    /// Maximum number of cached result sets.
    pub cache_capacity: u64,
    /// Random pre-request delay range in milliseconds `(min, max)`.
    /// The hook where a politeness/backoff policy plugs in.
    pub request_delay_ms: (u64, u64),
    /// Custom User-Agent. If `None`, rotates through a built-in list.
    pub user_agent: Option<String>,
    /// Dedup thresholds.
    pub dedup: DedupConfig,
    /// Ranking weights and relevance floor.
    pub scoring: ScoringConfig,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        let mut countries = HashMap::new();
        countries.insert(
            "US".to_string(),
            CountryConfig::new(vec![Source::Amazon, Source::Ebay, Source::Walmart], "USD"),
        );
        countries.insert(
            "IN".to_string(),
            CountryConfig::new(
                vec![
                    Source::Amazon,
                    Source::Flipkart,
                    Source::Ebay,
                    Source::Snapdeal,
                    Source::Shopsy,
                ],
                "INR",
            ),
        );
        countries.insert(
            "UK".to_string(),
            CountryConfig::new(vec![Source::Amazon, Source::Ebay], "GBP"),
        );
        countries.insert(
            "DE".to_string(),
            CountryConfig::new(vec![Source::Amazon, Source::Ebay], "EUR"),
        );
        countries.insert(
            "CA".to_string(),
            CountryConfig::new(vec![Source::Amazon, Source::Ebay], "CAD"),
        );

        Self {
            countries,
            per_source_timeout: Duration::from_secs(8),
            overall_deadline: Duration::from_secs(12),
            cache_ttl: Duration::from_secs(3600),
            cache_capacity: 100,
            request_delay_ms: (0, 250),
            user_agent: None,
            dedup: DedupConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl AggregatorConfig {
    /// Validates this configuration, returning an error if any field is
    /// unusable.
    pub fn validate(&self) -> Result<(), AggregateError> {
        if self.countries.is_empty() {
            return Err(AggregateError::Config("no countries configured".into()));
        }
        for (code, country) in &self.countries {
            if country.sources.is_empty() {
                return Err(AggregateError::Config(format!(
                    "country {code} has no sources"
                )));
            }
            if country.currency.len() != 3 {
                return Err(AggregateError::Config(format!(
                    "country {code} currency must be a 3-letter code"
                )));
            }
            if !country.accepts_currency(&country.currency) {
                return Err(AggregateError::Config(format!(
                    "country {code} does not accept its own canonical currency"
                )));
            }
        }
        if self.per_source_timeout.is_zero() {
            return Err(AggregateError::Config(
                "per_source_timeout must be greater than zero".into(),
            ));
        }
        if self.overall_deadline < self.per_source_timeout {
            return Err(AggregateError::Config(
                "overall_deadline must be at least per_source_timeout".into(),
            ));
        }
        if self.cache_capacity == 0 {
            return Err(AggregateError::Config(
                "cache_capacity must be greater than 0".into(),
            ));
        }
        if self.request_delay_ms.0 > self.request_delay_ms.1 {
            return Err(AggregateError::Config(
                "request_delay_ms min must be <= max".into(),
            ));
        }
        let d = self.dedup;
        if !(d.name_similarity > 0.0 && d.name_similarity <= 1.0) {
            return Err(AggregateError::Config(
                "dedup name_similarity must be in (0, 1]".into(),
            ));
        }
        if !(d.price_tolerance > 0.0 && d.price_tolerance <= 1.0) {
            return Err(AggregateError::Config(
                "dedup price_tolerance must be in (0, 1]".into(),
            ));
        }
        let s = self.scoring;
        let weight_sum = s.relevance_weight + s.price_weight + s.trust_weight;
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(AggregateError::Config(
                "scoring weights must sum to 1.0".into(),
            ));
        }
        if !(0.0..1.0).contains(&s.relevance_floor) {
            return Err(AggregateError::Config(
                "relevance_floor must be in [0, 1)".into(),
            ));
        }
        Ok(())
    }

    /// Configuration for a country, if supported.
    pub fn country(&self, code: &str) -> Option<&CountryConfig> {
        self.countries.get(&code.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AggregatorConfig::default().validate().is_ok());
    }

    #[test]
    fn default_country_table_matches_source_domains() {
        let config = AggregatorConfig::default();
        assert_eq!(config.countries.len(), 5);
        let india = config.country("in").expect("IN supported");
        assert_eq!(india.currency, "INR");
        assert!(india.sources.contains(&Source::Flipkart));
        let us = config.country("US").expect("US supported");
        assert_eq!(us.currency, "USD");
        assert!(!us.sources.contains(&Source::Flipkart));
    }

    #[test]
    fn country_lookup_is_case_insensitive() {
        let config = AggregatorConfig::default();
        assert!(config.country("uk").is_some());
        assert!(config.country("UK").is_some());
        assert!(config.country("XX").is_none());
    }

    #[test]
    fn empty_countries_rejected() {
        let config = AggregatorConfig {
            countries: HashMap::new(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("countries"));
    }

    #[test]
    fn country_without_sources_rejected() {
        let mut config = AggregatorConfig::default();
        config
            .countries
            .insert("FR".into(), CountryConfig::new(vec![], "EUR"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = AggregatorConfig {
            per_source_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn deadline_shorter_than_timeout_rejected() {
        let config = AggregatorConfig {
            per_source_timeout: Duration::from_secs(10),
            overall_deadline: Duration::from_secs(5),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("overall_deadline"));
    }

    #[test]
    fn inverted_delay_range_rejected() {
        let config = AggregatorConfig {
            request_delay_ms: (500, 100),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn weights_must_sum_to_one() {
        let config = AggregatorConfig {
            scoring: ScoringConfig {
                relevance_weight: 0.5,
                price_weight: 0.5,
                trust_weight: 0.5,
                relevance_floor: 0.2,
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn out_of_range_similarity_rejected() {
        let config = AggregatorConfig {
            dedup: DedupConfig {
                name_similarity: 1.5,
                price_tolerance: 0.15,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn relevance_floor_accepts_zero_rejects_one() {
        // A floor of 0.0 disables the cut-off; a floor of 1.0 would reject
        // every offer, so the valid range is [0, 1).
        let mut config = AggregatorConfig::default();
        config.scoring.relevance_floor = 0.0;
        assert!(config.validate().is_ok());
        config.scoring.relevance_floor = 1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("relevance_floor"));
    }

    #[test]
    fn trust_falls_back_to_source_default() {
        let mut country = CountryConfig::new(vec![Source::Amazon, Source::Ebay], "USD");
        assert!((country.trust(Source::Amazon) - 0.95).abs() < f64::EPSILON);
        country.trust_overrides.insert(Source::Amazon, 0.5);
        assert!((country.trust(Source::Amazon) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn source_priority_follows_list_order() {
        let country = CountryConfig::new(vec![Source::Flipkart, Source::Amazon], "INR");
        assert_eq!(country.source_priority(Source::Flipkart), 0);
        assert_eq!(country.source_priority(Source::Amazon), 1);
        assert_eq!(country.source_priority(Source::Walmart), usize::MAX);
    }
}
