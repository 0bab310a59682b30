//! Fixture-backed adapter for offline, reproducible runs.
//!
//! Parses the bundled HTML captures in `test-data/` through the same parse
//! functions the live adapters use, so the whole pipeline downstream of the
//! network is exercised end to end without touching any site. Selected when
//! `Query::use_local_fixtures` is set.

use async_trait::async_trait;
use url::Url;

use crate::adapter::SourceAdapter;
use crate::error::AdapterError;
use crate::sources::{amazon, ebay, flipkart, shopsy, snapdeal, walmart};
use crate::types::{Query, RawOffer, Source};

const AMAZON_CAPTURE: &str = include_str!("../../test-data/amazon.html");
const FLIPKART_CAPTURE: &str = include_str!("../../test-data/flipkart.html");
const EBAY_CAPTURE: &str = include_str!("../../test-data/ebay.html");
const WALMART_CAPTURE: &str = include_str!("../../test-data/walmart.html");
const SNAPDEAL_CAPTURE: &str = include_str!("../../test-data/snapdeal.html");
const SHOPSY_CAPTURE: &str = include_str!("../../test-data/shopsy.html");

/// An adapter that replays a captured search results page for its source.
pub struct FixtureSource {
    source: Source,
}

impl FixtureSource {
    /// Build a fixture adapter. Every source ships a capture.
    pub fn new(source: Source) -> Self {
        Self { source }
    }
}

#[async_trait]
impl SourceAdapter for FixtureSource {
    async fn fetch(&self, _query: &Query) -> Result<Vec<RawOffer>, AdapterError> {
        tracing::trace!(source = %self.source, "serving captured page");
        match self.source {
            Source::Amazon => {
                let base = Url::parse("https://www.amazon.in/")
                    .map_err(|e| AdapterError::Parse(format!("fixture base URL: {e}")))?;
                amazon::parse_amazon_html(AMAZON_CAPTURE, &base)
            }
            Source::Flipkart => flipkart::parse_flipkart_html(FLIPKART_CAPTURE),
            Source::Ebay => ebay::parse_ebay_html(EBAY_CAPTURE),
            Source::Walmart => walmart::parse_walmart_html(WALMART_CAPTURE),
            Source::Snapdeal => snapdeal::parse_snapdeal_html(SNAPDEAL_CAPTURE),
            Source::Shopsy => shopsy::parse_shopsy_html(SHOPSY_CAPTURE),
        }
    }

    fn source(&self) -> Source {
        self.source
    }
}
