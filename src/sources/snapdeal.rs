//! Snapdeal storefront adapter (India only).
//!
//! Snapdeal's result grid uses stable semantic classes (`product-tuple-*`,
//! `product-title`, `product-price`). Titles are preferred from the `title`
//! attribute, which carries the full untruncated name, falling back to the
//! element text.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::adapter::SourceAdapter;
use crate::error::AdapterError;
use crate::http;
use crate::types::{Query, RawOffer, RawPrice, Source};

const BASE: &str = "https://www.snapdeal.com/";

/// Snapdeal search page scraper.
pub struct SnapdealAdapter {
    client: Client,
    user_agent: Option<String>,
}

impl SnapdealAdapter {
    pub fn new(client: Client, user_agent: Option<String>) -> Self {
        Self { client, user_agent }
    }

    fn search_url(&self, query: &Query) -> Result<Url, AdapterError> {
        let mut url = Url::parse(BASE)
            .and_then(|u| u.join("search"))
            .map_err(|e| AdapterError::Parse(format!("Snapdeal search URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("keyword", &query.normalized_text())
            .append_pair("noOfResults", "20");
        Ok(url)
    }
}

#[async_trait]
impl SourceAdapter for SnapdealAdapter {
    async fn fetch(&self, query: &Query) -> Result<Vec<RawOffer>, AdapterError> {
        let url = self.search_url(query)?;
        tracing::trace!(%url, "Snapdeal search");

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
            .map_err(|e| AdapterError::Network(format!("Snapdeal request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AdapterError::Network(format!("Snapdeal HTTP error: {e}")))?;

        let html = response
            .text()
            .await
            .map_err(|e| AdapterError::Network(format!("Snapdeal response read failed: {e}")))?;

        tracing::trace!(bytes = html.len(), "Snapdeal response received");
        parse_snapdeal_html(&html)
    }

    fn source(&self) -> Source {
        Source::Snapdeal
    }
}

/// Parse a Snapdeal search results page into raw offers.
pub(crate) fn parse_snapdeal_html(html: &str) -> Result<Vec<RawOffer>, AdapterError> {
    let document = Html::parse_document(html);

    let result_sel = Selector::parse("div.product-tuple-listing, div.product-item")
        .map_err(|e| AdapterError::Parse(format!("invalid result selector: {e:?}")))?;
    let title_sel = Selector::parse("p.product-title")
        .map_err(|e| AdapterError::Parse(format!("invalid title selector: {e:?}")))?;
    let price_sel = Selector::parse("span.product-price, div.product-price")
        .map_err(|e| AdapterError::Parse(format!("invalid price selector: {e:?}")))?;
    let link_sel = Selector::parse("a.dp-widget-link, a[href]")
        .map_err(|e| AdapterError::Parse(format!("invalid link selector: {e:?}")))?;

    let base = Url::parse(BASE)
        .map_err(|e| AdapterError::Parse(format!("Snapdeal base URL: {e}")))?;

    let mut offers = Vec::new();

    for element in document.select(&result_sel) {
        let name = match element.select(&title_sel).next() {
            Some(el) => match el.value().attr("title") {
                Some(full) if !full.trim().is_empty() => full.trim().to_string(),
                _ => el.text().collect::<String>().trim().to_string(),
            },
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
            source: Source::Snapdeal,
            raw_name: name,
            raw_price: RawPrice::Text(price_text),
            raw_currency: None,
            link,
        });
    }

    tracing::debug!(count = offers.len(), "Snapdeal offers parsed");
    Ok(offers)
}
