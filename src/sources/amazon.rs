//! Amazon storefront adapter.
//!
//! Scrapes the search results page of the country-local Amazon site
//! (`amazon.com`, `amazon.in`, ...). Amazon's search grid is stable enough
//! to target with the `data-component-type` attribute, which survives their
//! frequent class-name churn better than styling classes do.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::adapter::SourceAdapter;
use crate::error::AdapterError;
use crate::http;
use crate::types::{Query, RawOffer, RawPrice, Source};

/// Amazon search page scraper for one country storefront.
pub struct AmazonAdapter {
    client: Client,
    base: Url,
    user_agent: Option<String>,
}

impl AmazonAdapter {
    /// Build an adapter for the given country code, falling back to the
    /// `.com` storefront for countries without a local site.
    pub fn new(client: Client, country: &str, user_agent: Option<String>) -> Self {
        let tld = match country.to_uppercase().as_str() {
            "IN" => "in",
            "UK" => "co.uk",
            "DE" => "de",
            "CA" => "ca",
            _ => "com",
        };
        // The TLD set above is fixed, so this parse cannot fail.
        let base = Url::parse(&format!("https://www.amazon.{tld}/"))
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
            .join("s")
            .map_err(|e| AdapterError::Parse(format!("Amazon search URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("k", &query.normalized_text());
        Ok(url)
    }
}

#[async_trait]
impl SourceAdapter for AmazonAdapter {
    async fn fetch(&self, query: &Query) -> Result<Vec<RawOffer>, AdapterError> {
        let url = self.search_url(query)?;
        tracing::trace!(%url, "Amazon search");

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
            .map_err(|e| AdapterError::Network(format!("Amazon request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AdapterError::Network(format!("Amazon HTTP error: {e}")))?;

        let html = response
            .text()
            .await
            .map_err(|e| AdapterError::Network(format!("Amazon response read failed: {e}")))?;

        tracing::trace!(bytes = html.len(), "Amazon response received");
        parse_amazon_html(&html, &self.base)
    }

    fn source(&self) -> Source {
        Source::Amazon
    }
}

/// Parse an Amazon search results page into raw offers.
///
/// Extracted as a separate function for testability with captured HTML.
pub(crate) fn parse_amazon_html(html: &str, base: &Url) -> Result<Vec<RawOffer>, AdapterError> {
    let document = Html::parse_document(html);

    let result_sel = Selector::parse(r#"div[data-component-type="s-search-result"]"#)
        .map_err(|e| AdapterError::Parse(format!("invalid result selector: {e:?}")))?;
    let title_sel = Selector::parse("h2 a span, h2 span")
        .map_err(|e| AdapterError::Parse(format!("invalid title selector: {e:?}")))?;
    let link_sel = Selector::parse("h2 a, a.a-link-normal")
        .map_err(|e| AdapterError::Parse(format!("invalid link selector: {e:?}")))?;
    let whole_sel = Selector::parse("span.a-price-whole")
        .map_err(|e| AdapterError::Parse(format!("invalid price selector: {e:?}")))?;
    let fraction_sel = Selector::parse("span.a-price-fraction")
        .map_err(|e| AdapterError::Parse(format!("invalid fraction selector: {e:?}")))?;
    let symbol_sel = Selector::parse("span.a-price-symbol")
        .map_err(|e| AdapterError::Parse(format!("invalid symbol selector: {e:?}")))?;

    let mut offers = Vec::new();

    for element in document.select(&result_sel) {
        let name = match element.select(&title_sel).next() {
            Some(el) => el.text().collect::<String>().trim().to_string(),
            None => continue,
        };
        if name.is_empty() {
            continue;
        }

        let whole = match element.select(&whole_sel).next() {
            Some(el) => el.text().collect::<String>(),
            None => continue,
        };
        let fraction = element
            .select(&fraction_sel)
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default();
        let symbol = element
            .select(&symbol_sel)
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default();
        let price_text = if fraction.is_empty() {
            format!("{symbol}{whole}")
        } else {
            format!("{symbol}{whole}.{fraction}")
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
            source: Source::Amazon,
            raw_name: name,
            raw_price: RawPrice::Text(price_text),
            raw_currency: None,
            link,
        });
    }

    tracing::debug!(count = offers.len(), "Amazon offers parsed");
    Ok(offers)
}
