//! eBay storefront adapter.
//!
//! eBay's listing markup is the most stable of the supported sites, but the
//! first grid cell is usually a "Shop on eBay" placeholder with no real
//! listing behind it, and auction rows render price ranges
//! ("$1,000 to $2,000") that collapse to the low bound downstream.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::adapter::SourceAdapter;
use crate::error::AdapterError;
use crate::http;
use crate::types::{Query, RawOffer, RawPrice, Source};

/// eBay search page scraper for one country site.
pub struct EbayAdapter {
    client: Client,
    base: Url,
    user_agent: Option<String>,
}

impl EbayAdapter {
    pub fn new(client: Client, country: &str, user_agent: Option<String>) -> Self {
        let domain = match country.to_uppercase().as_str() {
            "UK" => "www.ebay.co.uk",
            "DE" => "www.ebay.de",
            "CA" => "www.ebay.ca",
            _ => "www.ebay.com",
        };
        // Fixed domain set, the parse cannot fail.
        let base = Url::parse(&format!("https://{domain}/"))
            .expect("hardcoded storefront URL is valid");
        Self {
            client,
            base,
            user_agent,
        }
    }

    fn search_url(&self, query: &Query) -> Result<Url, AdapterError> {
        let mut url = self
            .base
            .join("sch/i.html")
            .map_err(|e| AdapterError::Parse(format!("eBay search URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("_nkw", &query.normalized_text());
        Ok(url)
    }
}

#[async_trait]
impl SourceAdapter for EbayAdapter {
    async fn fetch(&self, query: &Query) -> Result<Vec<RawOffer>, AdapterError> {
        let url = self.search_url(query)?;
        tracing::trace!(%url, "eBay search");

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
            .map_err(|e| AdapterError::Network(format!("eBay request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AdapterError::Network(format!("eBay HTTP error: {e}")))?;

        let html = response
            .text()
            .await
            .map_err(|e| AdapterError::Network(format!("eBay response read failed: {e}")))?;

        tracing::trace!(bytes = html.len(), "eBay response received");
        parse_ebay_html(&html)
    }

    fn source(&self) -> Source {
        Source::Ebay
    }
}

/// Parse an eBay search results page into raw offers.
pub(crate) fn parse_ebay_html(html: &str) -> Result<Vec<RawOffer>, AdapterError> {
    let document = Html::parse_document(html);

    let result_sel = Selector::parse("li.s-item")
        .map_err(|e| AdapterError::Parse(format!("invalid result selector: {e:?}")))?;
    let title_sel = Selector::parse(".s-item__title")
        .map_err(|e| AdapterError::Parse(format!("invalid title selector: {e:?}")))?;
    let price_sel = Selector::parse(".s-item__price")
        .map_err(|e| AdapterError::Parse(format!("invalid price selector: {e:?}")))?;
    let link_sel = Selector::parse("a.s-item__link")
        .map_err(|e| AdapterError::Parse(format!("invalid link selector: {e:?}")))?;

    let mut offers = Vec::new();

    for element in document.select(&result_sel) {
        let name = match element.select(&title_sel).next() {
            Some(el) => el.text().collect::<String>().trim().to_string(),
            None => continue,
        };
        // Placeholder cell at the top of every result grid.
        if name.is_empty() || name.eq_ignore_ascii_case("Shop on eBay") {
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
            .map(String::from);
        let link = match link {
            Some(l) => l,
            None => continue,
        };

        offers.push(RawOffer {
            source: Source::Ebay,
            raw_name: name,
            raw_price: RawPrice::Text(price_text),
            raw_currency: None,
            link,
        });
    }

    tracing::debug!(count = offers.len(), "eBay offers parsed");
    Ok(offers)
}
