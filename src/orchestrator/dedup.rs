//! Near-duplicate offer clustering.
//!
//! Offers from different sources (or repeated listings on one source) that
//! describe the same real-world product are merged into one cluster. Two
//! offers merge when their names are similar enough **and** their prices lie
//! within a relative tolerance band — both guards together prevent merging
//! genuinely distinct products that share marketing boilerplate.
//!
//! Clustering is transitive via union-find and deterministic: clusters are
//! emitted in first-seen order, so identical input always yields identical
//! output. Running the pass on its own output changes nothing, since every
//! mergeable pair was already unioned.

use std::collections::BTreeSet;

use crate::config::{CountryConfig, DedupConfig};
use crate::types::{ClusteredOffer, Offer};

/// Cluster near-duplicate offers, keeping one representative per cluster.
///
/// The representative is the cheapest offer in the cluster; price ties break
/// by the country's source priority order, then by source name. Each
/// cluster carries the number of distinct contributing sources as a
/// reliability signal for scoring.
pub fn dedupe(
    offers: Vec<Offer>,
    config: &DedupConfig,
    country: &CountryConfig,
) -> Vec<ClusteredOffer> {
    let n = offers.len();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], i: usize) -> usize {
        let mut root = i;
        while parent[root] != root {
            root = parent[root];
        }
        // Path compression.
        let mut cur = i;
        while parent[cur] != root {
            let next = parent[cur];
            parent[cur] = root;
            cur = next;
        }
        root
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if same_product(&offers[i], &offers[j], config) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    // Smaller first-seen index wins the root, keeping
                    // cluster order stable.
                    let (lo, hi) = if ri < rj { (ri, rj) } else { (rj, ri) };
                    parent[hi] = lo;
                }
            }
        }
    }

    // Group members per root, in first-seen order.
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut root_slot: Vec<Option<usize>> = vec![None; n];
    for i in 0..n {
        let root = find(&mut parent, i);
        match root_slot[root] {
            Some(slot) => clusters[slot].push(i),
            None => {
                root_slot[root] = Some(clusters.len());
                clusters.push(vec![i]);
            }
        }
    }

    clusters
        .into_iter()
        .map(|members| {
            let source_count = members
                .iter()
                .map(|&i| offers[i].source)
                .collect::<BTreeSet<_>>()
                .len();
            let best = members
                .into_iter()
                .min_by(|&a, &b| {
                    let (oa, ob) = (&offers[a], &offers[b]);
                    oa.price
                        .total_cmp(&ob.price)
                        .then_with(|| {
                            country
                                .source_priority(oa.source)
                                .cmp(&country.source_priority(ob.source))
                        })
                        .then_with(|| oa.source.name().cmp(ob.source.name()))
                })
                .unwrap_or(0);
            ClusteredOffer {
                offer: offers[best].clone(),
                source_count,
            }
        })
        .collect()
}

/// Merge condition: fuzzy name match plus price proximity.
fn same_product(a: &Offer, b: &Offer, config: &DedupConfig) -> bool {
    if !prices_close(a.price, b.price, config.price_tolerance) {
        return false;
    }
    token_set_similarity(&a.product_name, &b.product_name) >= config.name_similarity
}

/// Relative price gap check: `|a - b| / max(a, b) <= tolerance`.
/// Two zero prices compare as close.
fn prices_close(a: f64, b: f64, tolerance: f64) -> bool {
    let max = a.max(b);
    if max == 0.0 {
        return true;
    }
    (a - b).abs() / max <= tolerance
}

/// Token-set name similarity in `[0, 1]`.
///
/// The fuzzywuzzy `token_set_ratio` construction: split both names into
/// sorted token sets, then take the best normalized Levenshtein ratio among
/// the intersection and the two intersection-plus-remainder strings. A name
/// whose tokens are a subset of the other's scores 1.0, which is exactly
/// what retailer names need ("Apple iPhone 16 Pro Max Natural Titanium" vs
/// "iPhone 16 Pro Max (Natural Titanium)").
pub fn token_set_similarity(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return if ta.is_empty() && tb.is_empty() { 1.0 } else { 0.0 };
    }

    let inter: Vec<&String> = ta.intersection(&tb).collect();
    let only_a: Vec<&String> = ta.difference(&tb).collect();
    let only_b: Vec<&String> = tb.difference(&ta).collect();

    let join = |head: &[&String], tail: &[&String]| -> String {
        head.iter()
            .chain(tail.iter())
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    };

    let t0 = join(&inter, &[]);
    let t1 = join(&inter, &only_a);
    let t2 = join(&inter, &only_b);

    strsim::normalized_levenshtein(&t0, &t1)
        .max(strsim::normalized_levenshtein(&t0, &t2))
        .max(strsim::normalized_levenshtein(&t1, &t2))
}

/// Lowercased alphanumeric tokens as an ordered set.
pub fn tokens(name: &str) -> BTreeSet<String> {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AggregatorConfig;
    use crate::types::Source;

    fn india() -> CountryConfig {
        AggregatorConfig::default().country("IN").expect("IN").clone()
    }

    fn offer(name: &str, price: f64, source: Source) -> Offer {
        Offer {
            product_name: name.into(),
            price,
            currency: "INR".into(),
            link: format!("https://example.com/{}", source.name()),
            source,
        }
    }

    fn run(offers: Vec<Offer>) -> Vec<ClusteredOffer> {
        dedupe(offers, &DedupConfig::default(), &india())
    }

    #[test]
    fn near_identical_offers_merge_with_source_count() {
        let clusters = run(vec![
            offer("iPhone 16 Pro Max (Natural Titanium)", 152_900.0, Source::Flipkart),
            offer("Apple iPhone 16 Pro Max Natural Titanium", 152_990.0, Source::Amazon),
        ]);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].source_count, 2);
        // Representative is the cheaper listing.
        assert!((clusters[0].offer.price - 152_900.0).abs() < f64::EPSILON);
        assert_eq!(clusters[0].offer.source, Source::Flipkart);
    }

    #[test]
    fn similar_names_far_prices_stay_apart() {
        let clusters = run(vec![
            offer("Apple iPhone 16 Pro Max 256GB", 152_900.0, Source::Amazon),
            offer("Apple iPhone 16 Pro Max 512GB", 182_900.0, Source::Amazon),
        ]);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn close_prices_different_products_stay_apart() {
        let clusters = run(vec![
            offer("Samsung Galaxy S25 Ultra", 129_999.0, Source::Amazon),
            offer("Apple iPhone 16 Pro Max", 131_900.0, Source::Flipkart),
        ]);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn clustering_is_transitive() {
        // A~B and B~C chain into one cluster even if A and C are farther apart.
        let clusters = run(vec![
            offer("Sony WH-1000XM5 Wireless Headphones", 26_990.0, Source::Amazon),
            offer("Sony WH-1000XM5 Wireless Headphones Black", 28_990.0, Source::Flipkart),
            offer("Sony WH-1000XM5 Wireless Headphones Black Edition", 30_500.0, Source::Snapdeal),
        ]);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].source_count, 3);
        assert!((clusters[0].offer.price - 26_990.0).abs() < f64::EPSILON);
    }

    #[test]
    fn price_tie_breaks_by_source_priority() {
        // Amazon precedes Flipkart in the IN priority order.
        let clusters = run(vec![
            offer("Logitech MX Master 3S", 8_495.0, Source::Flipkart),
            offer("Logitech MX Master 3S Mouse", 8_495.0, Source::Amazon),
        ]);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].offer.source, Source::Amazon);
    }

    #[test]
    fn repeated_listing_same_source_counts_once() {
        let clusters = run(vec![
            offer("Kindle Paperwhite 16GB", 14_999.0, Source::Amazon),
            offer("Kindle Paperwhite (16GB)", 14_999.0, Source::Amazon),
        ]);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].source_count, 1);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let clusters = run(vec![
            offer("iPhone 16 Pro Max (Natural Titanium)", 152_900.0, Source::Flipkart),
            offer("Apple iPhone 16 Pro Max Natural Titanium", 152_990.0, Source::Amazon),
            offer("OnePlus 13R 256GB", 42_997.0, Source::Amazon),
        ]);
        let first: Vec<Offer> = clusters.iter().map(|c| c.offer.clone()).collect();
        let again = run(first.clone());
        let second: Vec<Offer> = again.iter().map(|c| c.offer.clone()).collect();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.product_name, b.product_name);
            assert!((a.price - b.price).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn output_order_is_first_seen() {
        let clusters = run(vec![
            offer("Zebra Thermal Printer", 22_000.0, Source::Amazon),
            offer("Anker 65W Charger", 2_999.0, Source::Flipkart),
        ]);
        assert_eq!(clusters[0].offer.product_name, "Zebra Thermal Printer");
        assert_eq!(clusters[1].offer.product_name, "Anker 65W Charger");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(run(vec![]).is_empty());
    }

    #[test]
    fn token_set_subset_scores_full_similarity() {
        let s = token_set_similarity(
            "iPhone 16 Pro Max (Natural Titanium)",
            "Apple iPhone 16 Pro Max Natural Titanium",
        );
        assert!((s - 1.0).abs() < 1e-9, "subset similarity should be 1.0, got {s}");
    }

    #[test]
    fn token_set_unrelated_names_score_low() {
        let s = token_set_similarity("Dyson V15 Detect Vacuum", "Apple iPhone 16 Pro Max");
        assert!(s < 0.5, "unrelated names should score low, got {s}");
    }

    #[test]
    fn token_set_handles_empty_names() {
        assert!((token_set_similarity("", "") - 1.0).abs() < 1e-9);
        assert!(token_set_similarity("iphone", "").abs() < 1e-9);
    }

    #[test]
    fn tokens_split_on_punctuation_and_lowercase() {
        let t = tokens("Apple iPhone 16 Pro Max (Natural-Titanium), 256GB");
        assert!(t.contains("iphone"));
        assert!(t.contains("titanium"));
        assert!(t.contains("256gb"));
        assert!(!t.contains("(natural"));
    }

    #[test]
    fn prices_close_tolerance_band() {
        assert!(prices_close(100.0, 110.0, 0.15));
        assert!(!prices_close(100.0, 130.0, 0.15));
        assert!(prices_close(0.0, 0.0, 0.15));
        assert!(!prices_close(0.0, 10.0, 0.15));
    }
}
