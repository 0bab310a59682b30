//! Concrete storefront adapters and registry construction.
//!
//! Each adapter owns everything site-specific; the registry builders map a
//! country's configured source list onto adapters. Every source in
//! [`Source`] has both a live scraper and a bundled fixture capture, so a
//! country table entry always fans out.

pub mod amazon;
pub mod ebay;
pub mod fixtures;
pub mod flipkart;
pub mod shopsy;
pub mod snapdeal;
pub mod walmart;

use std::sync::Arc;

use reqwest::Client;

use crate::adapter::SourceAdapter;
use crate::config::CountryConfig;
use crate::sources::amazon::AmazonAdapter;
use crate::sources::ebay::EbayAdapter;
use crate::sources::fixtures::FixtureSource;
use crate::sources::flipkart::FlipkartAdapter;
use crate::sources::shopsy::ShopsyAdapter;
use crate::sources::snapdeal::SnapdealAdapter;
use crate::sources::walmart::WalmartAdapter;
use crate::types::Source;

/// Build live scrapers for every source in the country's list.
pub fn live_registry(
    client: &Client,
    country_code: &str,
    country: &CountryConfig,
    user_agent: Option<&str>,
) -> Vec<Arc<dyn SourceAdapter>> {
    let ua = user_agent.map(str::to_owned);
    country
        .sources
        .iter()
        .map(|&source| {
            let adapter: Arc<dyn SourceAdapter> = match source {
                Source::Amazon => Arc::new(AmazonAdapter::new(
                    client.clone(),
                    country_code,
                    ua.clone(),
                )),
                Source::Flipkart => Arc::new(FlipkartAdapter::new(client.clone(), ua.clone())),
                Source::Ebay => Arc::new(EbayAdapter::new(client.clone(), country_code, ua.clone())),
                Source::Walmart => Arc::new(WalmartAdapter::new(client.clone(), ua.clone())),
                Source::Snapdeal => Arc::new(SnapdealAdapter::new(client.clone(), ua.clone())),
                Source::Shopsy => Arc::new(ShopsyAdapter::new(client.clone(), ua.clone())),
            };
            adapter
        })
        .collect()
}

/// Build fixture-backed adapters for every source in the country's list.
pub fn fixture_registry(country: &CountryConfig) -> Vec<Arc<dyn SourceAdapter>> {
    country
        .sources
        .iter()
        .map(|&source| Arc::new(FixtureSource::new(source)) as Arc<dyn SourceAdapter>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AggregatorConfig;

    #[test]
    fn live_registry_covers_every_configured_source() {
        let config = AggregatorConfig::default();
        let country = config.country("IN").expect("IN");
        let registry = live_registry(&Client::new(), "IN", country, None);
        let sources: Vec<Source> = registry.iter().map(|a| a.source()).collect();
        assert_eq!(sources, country.sources);
    }

    #[test]
    fn live_registry_fans_out_to_all_us_sources() {
        let config = AggregatorConfig::default();
        let country = config.country("US").expect("US");
        let registry = live_registry(&Client::new(), "US", country, None);
        let sources: Vec<Source> = registry.iter().map(|a| a.source()).collect();
        assert_eq!(sources, vec![Source::Amazon, Source::Ebay, Source::Walmart]);
    }

    #[test]
    fn fixture_registry_matches_country_sources() {
        let config = AggregatorConfig::default();
        let country = config.country("US").expect("US");
        let registry = fixture_registry(country);
        let sources: Vec<Source> = registry.iter().map(|a| a.source()).collect();
        assert_eq!(sources, country.sources);
    }
}
