//! Walmart storefront adapter (US only).
//!
//! Walmart's search grid marks each product cell with a `data-item-id`
//! attribute and exposes the title through a `data-automation-id` hook,
//! both of which outlive their styling-class churn. Price cells carry the
//! schema.org `itemprop="price"` marker.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::adapter::SourceAdapter;
use crate::error::AdapterError;
use crate::http;
use crate::types::{Query, RawOffer, RawPrice, Source};

const BASE: &str = "https://www.walmart.com/";

/// Walmart search page scraper.
pub struct WalmartAdapter {
    client: Client,
    user_agent: Option<String>,
}

impl WalmartAdapter {
    pub fn new(client: Client, user_agent: Option<String>) -> Self {
        Self { client, user_agent }
    }

    fn search_url(&self, query: &Query) -> Result<Url, AdapterError> {
        let mut url = Url::parse(BASE)
            .and_then(|u| u.join("search"))
            .map_err(|e| AdapterError::Parse(format!("Walmart search URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("q", &query.normalized_text());
        Ok(url)
    }
}

#[async_trait]
impl SourceAdapter for WalmartAdapter {
    async fn fetch(&self, query: &Query) -> Result<Vec<RawOffer>, AdapterError> {
        let url = self.search_url(query)?;
        tracing::trace!(%url, "Walmart search");

        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::USER_AGENT,
                http::rotating_user_agent(self.user_agent.as_deref()),
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| AdapterError::Network(format!("Walmart request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AdapterError::Network(format!("Walmart HTTP error: {e}")))?;

        let html = response
            .text()
            .await
            .map_err(|e| AdapterError::Network(format!("Walmart response read failed: {e}")))?;

        tracing::trace!(bytes = html.len(), "Walmart response received");
        parse_walmart_html(&html)
    }

    fn source(&self) -> Source {
        Source::Walmart
    }
}

/// Parse a Walmart search results page into raw offers.
pub(crate) fn parse_walmart_html(html: &str) -> Result<Vec<RawOffer>, AdapterError> {
    let document = Html::parse_document(html);

    let result_sel = Selector::parse("div[data-item-id]")
        .map_err(|e| AdapterError::Parse(format!("invalid result selector: {e:?}")))?;
    let title_sel =
        Selector::parse(r#"span[data-automation-id="product-title"], a[data-testid="product-title"]"#)
            .map_err(|e| AdapterError::Parse(format!("invalid title selector: {e:?}")))?;
    let price_sel = Selector::parse(r#"span[itemprop="price"]"#)
        .map_err(|e| AdapterError::Parse(format!("invalid price selector: {e:?}")))?;
    let link_sel = Selector::parse("a[href]")
        .map_err(|e| AdapterError::Parse(format!("invalid link selector: {e:?}")))?;

    let base = Url::parse(BASE)
        .map_err(|e| AdapterError::Parse(format!("Walmart base URL: {e}")))?;

    let mut offers = Vec::new();

    for element in document.select(&result_sel) {
        let name = match element.select(&title_sel).next() {
            Some(el) => el.text().collect::<String>().trim().to_string(),
            None => continue,
        };
        if name.is_empty() {
            continue;
        }

        // Walmart renders the price as "current price $1,199.00"; the
        // normalizer takes the first numeric run, so the prefix is harmless.
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
            source: Source::Walmart,
            raw_name: name,
            raw_price: RawPrice::Text(price_text),
            raw_currency: None,
            link,
        });
    }

    tracing::debug!(count = offers.len(), "Walmart offers parsed");
    Ok(offers)
}
