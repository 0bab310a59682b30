//! End-to-end query pipeline: fan-out, normalize, dedupe, score, rank.
//!
//! This is the pure composition layer. It owns no I/O of its own and no
//! cache; the facade wires those around it.

use std::sync::Arc;

use crate::adapter::SourceAdapter;
use crate::config::{AggregatorConfig, CountryConfig};
use crate::orchestrator::{dedup, fanout, normalize, scoring};
use crate::types::{OutcomeStatus, Query, SearchOutcome, SourceStatus};

/// Run the full pipeline against the given adapters.
///
/// Always returns an outcome: source failures are absorbed into the per
/// source reports, never surfaced as errors. The offer list is truncated to
/// the query's result limit after ranking.
pub async fn run(
    query: &Query,
    adapters: &[Arc<dyn SourceAdapter>],
    config: &AggregatorConfig,
    country: &CountryConfig,
) -> SearchOutcome {
    let (raws, reports) = fanout::fan_out(
        query,
        adapters,
        config.per_source_timeout,
        config.overall_deadline,
        config.request_delay_ms,
    )
    .await;

    let responded = reports
        .iter()
        .filter(|r| matches!(r.status, SourceStatus::Fetched(_)))
        .count();

    let (offers, rejected) = normalize::normalize_all(raws, country);
    let clustered = dedup::dedupe(offers, &config.dedup, country);
    let mut ranked = scoring::score_and_rank(
        clustered,
        &query.normalized_text(),
        &config.scoring,
        country,
    );
    ranked.truncate(query.result_limit);

    let status = if responded == 0 {
        OutcomeStatus::NoSourcesResponded
    } else if ranked.is_empty() {
        OutcomeStatus::NothingMatched
    } else {
        OutcomeStatus::Ranked
    };

    tracing::info!(
        query = %query.normalized_text(),
        country = %query.country,
        sources_responded = responded,
        sources_total = reports.len(),
        offers = ranked.len(),
        rejected,
        ?status,
        "aggregation complete"
    );

    SearchOutcome {
        offers: ranked,
        status,
        reports,
        rejected,
        from_cache: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;
    use crate::types::{RawOffer, RawPrice, Source};
    use async_trait::async_trait;

    struct FixedAdapter {
        source: Source,
        offers: Vec<RawOffer>,
        fail: bool,
    }

    #[async_trait]
    impl SourceAdapter for FixedAdapter {
        async fn fetch(&self, _query: &Query) -> Result<Vec<RawOffer>, AdapterError> {
            if self.fail {
                return Err(AdapterError::Network("unreachable".into()));
            }
            Ok(self.offers.clone())
        }

        fn source(&self) -> Source {
            self.source
        }
    }

    fn raw(source: Source, name: &str, price: &str) -> RawOffer {
        RawOffer {
            source,
            raw_name: name.into(),
            raw_price: RawPrice::Text(price.into()),
            raw_currency: None,
            link: format!("https://{}.example.com/p", source.name()),
        }
    }

    fn config() -> AggregatorConfig {
        let mut c = AggregatorConfig::default();
        c.request_delay_ms = (0, 0);
        c
    }

    fn adapter(source: Source, offers: Vec<RawOffer>) -> Arc<dyn SourceAdapter> {
        Arc::new(FixedAdapter {
            source,
            offers,
            fail: false,
        })
    }

    fn failing(source: Source) -> Arc<dyn SourceAdapter> {
        Arc::new(FixedAdapter {
            source,
            offers: vec![],
            fail: true,
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pipeline_merges_and_ranks_across_sources() {
        let config = config();
        let country = config.country("IN").expect("IN").clone();
        let query = Query::new("iphone 16 pro max", "IN");
        let adapters = vec![
            adapter(
                Source::Flipkart,
                vec![raw(
                    Source::Flipkart,
                    "iPhone 16 Pro Max (Natural Titanium)",
                    "₹1,52,900",
                )],
            ),
            adapter(
                Source::Amazon,
                vec![raw(
                    Source::Amazon,
                    "Apple iPhone 16 Pro Max Natural Titanium",
                    "₹1,52,990",
                )],
            ),
        ];

        let outcome = run(&query, &adapters, &config, &country).await;
        assert_eq!(outcome.status, OutcomeStatus::Ranked);
        assert_eq!(outcome.offers.len(), 1);
        assert_eq!(outcome.offers[0].source_count, 2);
        assert!((outcome.offers[0].offer.price - 152_900.0).abs() < f64::EPSILON);
        assert!(!outcome.from_cache);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn all_sources_failing_reports_no_sources() {
        let config = config();
        let country = config.country("US").expect("US").clone();
        let query = Query::new("anything", "US");
        let adapters = vec![failing(Source::Amazon), failing(Source::Ebay)];

        let outcome = run(&query, &adapters, &config, &country).await;
        assert_eq!(outcome.status, OutcomeStatus::NoSourcesResponded);
        assert!(outcome.offers.is_empty());
        assert_eq!(outcome.reports.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn irrelevant_results_report_nothing_matched() {
        let config = config();
        let country = config.country("US").expect("US").clone();
        let query = Query::new("iphone 16 pro max", "US");
        let adapters = vec![adapter(
            Source::Amazon,
            vec![raw(Source::Amazon, "Garden Hose 50ft", "$29.99")],
        )];

        let outcome = run(&query, &adapters, &config, &country).await;
        assert_eq!(outcome.status, OutcomeStatus::NothingMatched);
        assert!(outcome.offers.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn result_limit_truncates_after_ranking() {
        let config = config();
        let country = config.country("US").expect("US").clone();
        let mut query = Query::new("usb cable", "US");
        query.result_limit = 2;
        let offers = (0..5)
            .map(|i| {
                raw(
                    Source::Amazon,
                    &format!("USB Cable model {i}00"),
                    &format!("${}9.99", i + 1),
                )
            })
            .collect();
        let adapters = vec![adapter(Source::Amazon, offers)];

        let outcome = run(&query, &adapters, &config, &country).await;
        assert_eq!(outcome.status, OutcomeStatus::Ranked);
        assert_eq!(outcome.offers.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn malformed_records_counted_not_fatal() {
        let config = config();
        let country = config.country("US").expect("US").clone();
        let query = Query::new("usb cable", "US");
        let adapters = vec![adapter(
            Source::Amazon,
            vec![
                raw(Source::Amazon, "USB Cable 2m", "$9.99"),
                raw(Source::Amazon, "USB Cable 3m", "see site for price"),
            ],
        )];

        let outcome = run(&query, &adapters, &config, &country).await;
        assert_eq!(outcome.status, OutcomeStatus::Ranked);
        assert_eq!(outcome.offers.len(), 1);
        assert_eq!(outcome.rejected, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn identical_input_identical_order() {
        let config = config();
        let country = config.country("US").expect("US").clone();
        let query = Query::new("mechanical keyboard", "US");
        let offers = vec![
            raw(Source::Amazon, "Keychron K8 Mechanical Keyboard", "$89.99"),
            raw(Source::Amazon, "Royal Kludge RK84 Mechanical Keyboard", "$79.99"),
            raw(Source::Amazon, "Ducky One 3 Mechanical Keyboard", "$119.00"),
        ];
        let adapters = vec![adapter(Source::Amazon, offers)];

        let first = run(&query, &adapters, &config, &country).await;
        let second = run(&query, &adapters, &config, &country).await;
        let names = |o: &SearchOutcome| -> Vec<String> {
            o.offers
                .iter()
                .map(|s| s.offer.product_name.clone())
                .collect()
        };
        assert_eq!(names(&first), names(&second));
    }
}
