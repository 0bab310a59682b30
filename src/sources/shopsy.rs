//! Shopsy storefront adapter (India only).
//!
//! Shopsy renders its search results client-side; the server response only
//! carries the data as JSON embedded in a `script#__NEXT_DATA__` tag. The
//! parser walks that payload down to the product-summary widgets instead of
//! scraping markup, so prices arrive already numeric.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use crate::adapter::SourceAdapter;
use crate::error::AdapterError;
use crate::http;
use crate::types::{Query, RawOffer, RawPrice, Source};

const BASE: &str = "https://www.shopsy.in/";

/// Shopsy search page scraper.
pub struct ShopsyAdapter {
    client: Client,
    user_agent: Option<String>,
}

impl ShopsyAdapter {
    pub fn new(client: Client, user_agent: Option<String>) -> Self {
        Self { client, user_agent }
    }

    fn search_url(&self, query: &Query) -> Result<Url, AdapterError> {
        let mut url = Url::parse(BASE)
            .and_then(|u| u.join("search"))
            .map_err(|e| AdapterError::Parse(format!("Shopsy search URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("q", &query.normalized_text());
        Ok(url)
    }
}

#[async_trait]
impl SourceAdapter for ShopsyAdapter {
    async fn fetch(&self, query: &Query) -> Result<Vec<RawOffer>, AdapterError> {
        let url = self.search_url(query)?;
        tracing::trace!(%url, "Shopsy search");

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
            .map_err(|e| AdapterError::Network(format!("Shopsy request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AdapterError::Network(format!("Shopsy HTTP error: {e}")))?;

        let html = response
            .text()
            .await
            .map_err(|e| AdapterError::Network(format!("Shopsy response read failed: {e}")))?;

        tracing::trace!(bytes = html.len(), "Shopsy response received");
        parse_shopsy_html(&html)
    }

    fn source(&self) -> Source {
        Source::Shopsy
    }
}

/// Parse a Shopsy search page by walking the embedded `__NEXT_DATA__` JSON.
pub(crate) fn parse_shopsy_html(html: &str) -> Result<Vec<RawOffer>, AdapterError> {
    let document = Html::parse_document(html);

    let script_sel = Selector::parse("script#__NEXT_DATA__")
        .map_err(|e| AdapterError::Parse(format!("invalid script selector: {e:?}")))?;

    let mut offers = Vec::new();

    for script in document.select(&script_sel) {
        let payload: String = script.text().collect();
        let data: Value = match serde_json::from_str(&payload) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "Shopsy payload is not valid JSON");
                continue;
            }
        };

        let slots = data
            .pointer("/props/pageProps/initialState/pageData/RESPONSE/pageData/slots")
            .and_then(Value::as_array);
        let Some(slots) = slots else { continue };

        for slot in slots {
            if slot.pointer("/widget/type").and_then(Value::as_str) != Some("PRODUCT_SUMMARY") {
                continue;
            }
            let Some(products) = slot
                .pointer("/widget/data/products")
                .and_then(Value::as_array)
            else {
                continue;
            };

            for product in products {
                let Some(info) = product.pointer("/productInfo/value") else {
                    continue;
                };

                let name = info
                    .pointer("/titles/title")
                    .and_then(Value::as_str)
                    .filter(|t| !t.trim().is_empty())
                    .or_else(|| {
                        info.pointer("/titles/newTitle")
                            .and_then(Value::as_str)
                            .filter(|t| !t.trim().is_empty())
                    });
                let Some(name) = name else { continue };

                let Some(price) = info
                    .pointer("/pricing/finalPrice/value")
                    .and_then(Value::as_f64)
                else {
                    continue;
                };
                if price <= 0.0 {
                    continue;
                }

                let path = info
                    .pointer("/baseUrl")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                let link = format!("{}{}", BASE.trim_end_matches('/'), path);

                offers.push(RawOffer {
                    source: Source::Shopsy,
                    raw_name: name.trim().to_string(),
                    raw_price: RawPrice::Amount(price),
                    raw_currency: None,
                    link,
                });
            }
        }
    }

    tracing::debug!(count = offers.len(), "Shopsy offers parsed");
    Ok(offers)
}
