//! Multi-criteria scoring and ranking.
//!
//! Each surviving offer gets a composite score from three criteria:
//! query relevance (dominant), price competitiveness within the result set,
//! and source trust. Weights and the relevance floor live in
//! [`ScoringConfig`]; the defaults are 0.75 / 0.20 / 0.05 with a 0.20 floor.
//!
//! Relevance is deliberately more than fuzzy similarity: an offer whose name
//! matches the accessory lexicon while the query does not is penalized hard,
//! so a cheap phone case can never outrank the phone. Offers below the
//! relevance floor are excluded entirely rather than ranked low.

use crate::config::{CountryConfig, ScoringConfig};
use crate::types::{ClusteredOffer, ScoredOffer};

use super::dedup::{token_set_similarity, tokens};

/// Words that mark an accessory listing rather than the product itself.
const ACCESSORY_LEXICON: &[&str] = &[
    "case",
    "cover",
    "charger",
    "cable",
    "protector",
    "tempered",
    "silicone",
    "silicon",
    "leather",
    "pouch",
    "skin",
    "strap",
    "holster",
    "adapter",
];

/// Stop words stripped from the query before term matching.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// Score, filter and rank clustered offers for a query.
///
/// Returns offers sorted by descending composite score; ties break by
/// ascending price, then by source name, so the order is fully deterministic
/// for identical input.
pub fn score_and_rank(
    clustered: Vec<ClusteredOffer>,
    query_text: &str,
    config: &ScoringConfig,
    country: &CountryConfig,
) -> Vec<ScoredOffer> {
    // Relevance first: the floor decides which offers exist at all, and the
    // price range is measured over the survivors only.
    let surviving: Vec<(ClusteredOffer, f64)> = clustered
        .into_iter()
        .map(|c| {
            let relevance = relevance(query_text, &c.offer.product_name);
            (c, relevance)
        })
        .filter(|(c, relevance)| {
            if *relevance < config.relevance_floor {
                tracing::debug!(
                    name = %c.offer.product_name,
                    relevance,
                    "offer below relevance floor, dropped"
                );
                false
            } else {
                true
            }
        })
        .collect();

    let prices: Vec<f64> = surviving.iter().map(|(c, _)| c.offer.price).collect();
    let price_scores = price_competitiveness(&prices);

    let mut scored: Vec<ScoredOffer> = surviving
        .into_iter()
        .zip(price_scores)
        .map(|((c, relevance), price_score)| {
            let trust = source_trust(country, &c);
            let score = (config.relevance_weight * relevance
                + config.price_weight * price_score
                + config.trust_weight * trust)
                .clamp(0.0, 1.0);
            ScoredOffer {
                offer: c.offer,
                relevance,
                score,
                source_count: c.source_count,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.offer.price.total_cmp(&b.offer.price))
            .then_with(|| a.offer.source.name().cmp(b.offer.source.name()))
    });
    scored
}

/// Query relevance of an offer name, in `[0, 1]`.
///
/// Blend of token-set similarity and query-term coverage, boosted when all
/// model tokens (query tokens containing a digit, e.g. "16", "256gb")
/// appear verbatim, and cut to a fraction when the name is an accessory
/// listing but the query is not.
pub fn relevance(query_text: &str, product_name: &str) -> f64 {
    let query = query_text.to_lowercase();
    let name = product_name.to_lowercase();

    let fuzzy = token_set_similarity(&query, &name);

    let terms = key_terms(&query);
    let coverage = if terms.is_empty() {
        0.0
    } else {
        let hits = terms.iter().filter(|t| name.contains(t.as_str())).count();
        hits as f64 / terms.len() as f64
    };

    let mut score = 0.45 * fuzzy + 0.55 * coverage;

    let name_tokens = tokens(&name);
    let model_tokens: Vec<&String> = terms
        .iter()
        .filter(|t| t.chars().any(|c| c.is_ascii_digit()))
        .collect();
    if !model_tokens.is_empty() && model_tokens.iter().all(|t| name_tokens.contains(t.as_str())) {
        score += 0.15;
    }

    if is_accessory(&name) && !is_accessory(&query) {
        score *= 0.15;
    }

    score.clamp(0.0, 1.0)
}

/// Price scores over a result set: min-max inverted, cheapest gets 1.0.
/// A set with no price spread scores 0.5 everywhere.
fn price_competitiveness(prices: &[f64]) -> Vec<f64> {
    let Some(min) = prices.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = prices.iter().copied().fold(min, f64::max);
    let range = max - min;
    if range == 0.0 {
        return vec![0.5; prices.len()];
    }
    prices.iter().map(|p| 1.0 - (p - min) / range).collect()
}

/// Configured source trust, boosted when multiple sources corroborated the
/// offer. Capped at 1.0.
fn source_trust(country: &CountryConfig, clustered: &ClusteredOffer) -> f64 {
    let base = country.trust(clustered.offer.source);
    let boost = 0.05 * clustered.source_count.saturating_sub(1) as f64;
    (base + boost).min(1.0)
}

/// Query terms worth matching: tokens carrying a digit, or words longer
/// than two characters that are not stop words.
fn key_terms(query: &str) -> Vec<String> {
    tokens(query)
        .into_iter()
        .filter(|t| {
            t.chars().any(|c| c.is_ascii_digit())
                || (t.len() > 2 && !STOP_WORDS.contains(&t.as_str()))
        })
        .collect()
}

/// Whether a name matches the accessory lexicon.
fn is_accessory(text: &str) -> bool {
    let toks = tokens(text);
    ACCESSORY_LEXICON.iter().any(|word| toks.contains(*word))
        || text.contains("screen protector")
        || text.contains("tempered glass")
}
