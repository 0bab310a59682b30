//! Flipkart storefront adapter (India only).
//!
//! Flipkart uses obfuscated, build-generated class names that rotate on
//! redeploys, so the selectors here target the currently shipped set and
//! will need refreshing when they churn. Parse failures degrade to an empty
//! offer list per record rather than failing the page.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::adapter::SourceAdapter;
use crate::error::AdapterError;
use crate::http;
use crate::types::{Query, RawOffer, RawPrice, Source};

const BASE: &str = "https://www.flipkart.com/";

/// Flipkart search page scraper.
pub struct FlipkartAdapter {
    client: Client,
    user_agent: Option<String>,
}

impl FlipkartAdapter {
    pub fn new(client: Client, user_agent: Option<String>) -> Self {
        Self { client, user_agent }
    }

    fn search_url(&self, query: &Query) -> Result<Url, AdapterError> {
        let mut url = Url::parse(BASE)
            .and_then(|u| u.join("search"))
            .map_err(|e| AdapterError::Parse(format!("Flipkart search URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("q", &query.normalized_text());
        Ok(url)
    }
}

#[async_trait]
impl SourceAdapter for FlipkartAdapter {
    async fn fetch(&self, query: &Query) -> Result<Vec<RawOffer>, AdapterError> {
        let url = self.search_url(query)?;
        tracing::trace!(%url, "Flipkart search");

        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::USER_AGENT,
                http::rotating_user_agent(self.user_agent.as_deref()),
            )
            .header("Accept-Language", "en-IN,en;q=0.9")
            .send()
            .await
            .map_err(|e| AdapterError::Network(format!("Flipkart request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AdapterError::Network(format!("Flipkart HTTP error: {e}")))?;

        let html = response
            .text()
            .await
            .map_err(|e| AdapterError::Network(format!("Flipkart response read failed: {e}")))?;

        tracing::trace!(bytes = html.len(), "Flipkart response received");
        parse_flipkart_html(&html)
    }

    fn source(&self) -> Source {
        Source::Flipkart
    }
}

/// Parse a Flipkart search results page into raw offers.
pub(crate) fn parse_flipkart_html(html: &str) -> Result<Vec<RawOffer>, AdapterError> {
    let document = Html::parse_document(html);

    let result_sel = Selector::parse("div._1AtVbE")
        .map_err(|e| AdapterError::Parse(format!("invalid result selector: {e:?}")))?;
    // Grid cards and list rows use different title classes.
    let title_sel = Selector::parse("div._4rR01T, a.s1Q9rs, a.IRpwTa")
        .map_err(|e| AdapterError::Parse(format!("invalid title selector: {e:?}")))?;
    let price_sel = Selector::parse("div._30jeq3")
        .map_err(|e| AdapterError::Parse(format!("invalid price selector: {e:?}")))?;
    let link_sel = Selector::parse("a._1fQZEK, a.s1Q9rs, a.IRpwTa, a._2rpwqI")
        .map_err(|e| AdapterError::Parse(format!("invalid link selector: {e:?}")))?;

    let base = Url::parse(BASE)
        .map_err(|e| AdapterError::Parse(format!("Flipkart base URL: {e}")))?;

    let mut offers = Vec::new();

    for element in document.select(&result_sel) {
        let name = match element.select(&title_sel).next() {
            Some(el) => el.text().collect::<String>().trim().to_string(),
            None => continue,
        };
        if name.is_empty() {
            continue;
        }

        let price_text = match element.select(&price_sel).next() {
            Some(el) => el.text().collect::<String>().trim().to_string(),
            None => continue,
        };

        let link = element
            .select(&link_sel)
            .next()
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| base.join(href).ok())
            .map(String::from);
        let link = match link {
            Some(l) => l,
            None => continue,
        };

        offers.push(RawOffer {
            source: Source::Flipkart,
            raw_name: name,
            raw_price: RawPrice::Text(price_text),
            raw_currency: None,
            link,
        });
    }

    tracing::debug!(count = offers.len(), "Flipkart offers parsed");
    Ok(offers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::normalize::parse_price;

    const FIXTURE_FLIPKART_HTML: &str = include_str!("../../test-data/flipkart.html");

    #[test]
    fn fixture_extracts_offers() {
        let offers = parse_flipkart_html(FIXTURE_FLIPKART_HTML).expect("should parse");
        assert_eq!(offers.len(), 3);
        assert_eq!(offers[0].raw_name, "Apple iPhone 16 Pro Max (Natural Titanium, 256 GB)");
        assert_eq!(offers[0].source, Source::Flipkart);
    }

    #[test]
    fn fixture_rupee_prices_parse() {
        let offers = parse_flipkart_html(FIXTURE_FLIPKART_HTML).expect("should parse");
        let RawPrice::Text(ref text) = offers[0].raw_price else {
            panic!("expected text price");
        };
        assert!(text.starts_with('₹'), "price should keep rupee symbol: {text}");
        assert_eq!(parse_price(text), Some(152_900.0));
    }

    #[test]
    fn fixture_links_resolve_against_base() {
        let offers = parse_flipkart_html(FIXTURE_FLIPKART_HTML).expect("should parse");
        for offer in &offers {
            assert!(offer.link.starts_with("https://www.flipkart.com/"));
        }
    }

    #[test]
    fn card_without_title_is_skipped() {
        let html = r#"<div class="_1AtVbE"><div class="_30jeq3">₹999</div></div>"#;
        let offers = parse_flipkart_html(html).expect("should parse");
        assert!(offers.is_empty());
    }

    #[test]
    fn empty_page_yields_no_offers() {
        let offers = parse_flipkart_html("<html><body></body></html>").expect("should parse");
        assert!(offers.is_empty());
    }

    #[test]
    fn search_url_encodes_query() {
        let adapter = FlipkartAdapter::new(Client::new(), None);
        let url = adapter
            .search_url(&Query::new("iPhone 16 Pro Max", "IN"))
            .expect("should build");
        assert_eq!(
            url.as_str(),
            "https://www.flipkart.com/search?q=iphone+16+pro+max"
        );
    }
}
