//! Shared HTTP client and User-Agent rotation for storefront requests.
//!
//! Provides a configured [`reqwest::Client`] with cookie support and a
//! fallback User-Agent. Adapters draw a fresh agent per request through
//! [`rotating_user_agent`] so repeated searches on a long-lived client do
//! not present a single fingerprint.

use crate::config::AggregatorConfig;
use crate::error::AdapterError;
use rand::seq::SliceRandom;
use rand::Rng;

/// Realistic browser User-Agent strings drawn from on each request.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Build a [`reqwest::Client`] configured for storefront scraping.
///
/// The client has:
/// - Cookie store enabled (consent interstitials, region selection)
/// - Timeout set to the per-source time box
/// - A default User-Agent for requests that set no header of their own;
///   adapters override it per request via [`rotating_user_agent`]
/// - Brotli and gzip decompression
///
/// # Errors
///
/// Returns [`AdapterError::Network`] if the client cannot be constructed.
pub fn build_client(config: &AggregatorConfig) -> Result<reqwest::Client, AdapterError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(config.per_source_timeout)
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| AdapterError::Network(format!("failed to build HTTP client: {e}")))
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // SAFETY: USER_AGENTS is a non-empty const array, choose only returns None on empty slices
        .unwrap_or(USER_AGENTS[0])
}

/// Pick the User-Agent header value for one outgoing request.
///
/// A configured override always wins; otherwise each call draws a fresh
/// agent from the rotation list.
pub fn rotating_user_agent(custom: Option<&str>) -> String {
    match custom {
        Some(ua) => ua.to_owned(),
        None => random_user_agent().to_owned(),
    }
}

/// Sleep for a random duration within the configured jitter range.
///
/// This is the per-source delay hook: a politeness/backoff policy can widen
/// the range via configuration without touching the orchestrator.
pub async fn request_jitter(range_ms: (u64, u64)) {
    let (min, max) = range_ms;
    if max == 0 {
        return;
    }
    let delay = if min == max {
        min
    } else {
        rand::thread_rng().gen_range(min..=max)
    };
    if delay > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }
}
