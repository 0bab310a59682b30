//! Raw record normalization: heterogeneous adapter output to canonical
//! [`Offer`]s.
//!
//! One malformed record must never fail the whole query, so rejection is a
//! value here: [`normalize`] returns the reason, [`normalize_all`] counts
//! rejects and logs them at debug level.

use url::Url;

use crate::config::CountryConfig;
use crate::types::{Offer, RawOffer, RawPrice};

/// Why a raw record was dropped. Counted, never propagated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Price text could not be parsed to a finite, non-negative number.
    UnparsablePrice,
    /// Explicit currency conflicts with the country's accepted set.
    CurrencyMismatch,
    /// Product name empty after cleanup.
    EmptyName,
    /// Link is not an absolute http(s) URL.
    InvalidLink,
}

/// Convert one raw record into a canonical offer, or reject it.
pub fn normalize(raw: &RawOffer, country: &CountryConfig) -> Result<Offer, RejectReason> {
    let price = match &raw.raw_price {
        RawPrice::Amount(p) => *p,
        RawPrice::Text(text) => parse_price(text).ok_or(RejectReason::UnparsablePrice)?,
    };
    if !price.is_finite() || price < 0.0 {
        return Err(RejectReason::UnparsablePrice);
    }

    let currency = match &raw.raw_currency {
        Some(code) => {
            let code = code.trim().to_uppercase();
            if !country.accepts_currency(&code) {
                return Err(RejectReason::CurrencyMismatch);
            }
            code
        }
        None => country.currency.clone(),
    };

    let product_name = clean_name(&raw.raw_name);
    if product_name.is_empty() {
        return Err(RejectReason::EmptyName);
    }

    let link = raw.link.trim();
    let parsed = Url::parse(link).map_err(|_| RejectReason::InvalidLink)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(RejectReason::InvalidLink);
    }

    Ok(Offer {
        product_name,
        price,
        currency,
        link: link.to_string(),
        source: raw.source,
    })
}

/// Normalize a batch, returning the surviving offers and the reject count.
pub fn normalize_all(raws: Vec<RawOffer>, country: &CountryConfig) -> (Vec<Offer>, usize) {
    let mut offers = Vec::with_capacity(raws.len());
    let mut rejected = 0;
    for raw in &raws {
        match normalize(raw, country) {
            Ok(offer) => offers.push(offer),
            Err(reason) => {
                tracing::debug!(source = %raw.source, ?reason, name = %raw.raw_name, "record rejected");
                rejected += 1;
            }
        }
    }
    (offers, rejected)
}

/// Trim, collapse internal whitespace and strip control characters.
fn clean_name(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a display price such as `"₹1,52,900"`, `"$1,234.56"` or
/// `"1.234,56 €"` into a number.
///
/// Strips currency symbols and grouping, then decides which separator (if
/// any) is the decimal one:
/// - both `,` and `.` present: the one occurring last is decimal
/// - only `,`: a single comma followed by 1–2 digits is a decimal comma,
///   anything else is grouping (covers Indian `1,52,900`)
/// - only `.`: a final group of 1–2 digits is decimal, otherwise grouping
///
/// Returns `None` when no digits survive or the result is not finite.
pub fn parse_price(text: &str) -> Option<f64> {
    // First contiguous run of digits and separators; "₹1,000 to ₹2,000"
    // style ranges collapse to the first number.
    let mut cleaned = String::new();
    let mut started = false;
    for c in text.chars() {
        if c.is_ascii_digit() {
            cleaned.push(c);
            started = true;
        } else if (c == ',' || c == '.') && started {
            cleaned.push(c);
        } else if started {
            break;
        }
    }
    let cleaned = cleaned.trim_end_matches(['.', ',']);
    if cleaned.is_empty() {
        return None;
    }

    let has_comma = cleaned.contains(',');
    let has_dot = cleaned.contains('.');

    let numeric = if has_comma && has_dot {
        let last_comma = cleaned.rfind(',').unwrap_or(0);
        let last_dot = cleaned.rfind('.').unwrap_or(0);
        if last_dot > last_comma {
            // 1,234.56 — comma groups, dot decimal
            cleaned.replace(',', "")
        } else {
            // 1.234,56 — dot groups, comma decimal
            cleaned.replace('.', "").replace(',', ".")
        }
    } else if has_comma {
        let parts: Vec<&str> = cleaned.split(',').collect();
        if parts.len() == 2 && (1..=2).contains(&parts[1].len()) {
            // 12,50 — decimal comma
            cleaned.replace(',', ".")
        } else {
            // 1,52,900 / 152,900 — grouping
            cleaned.replace(',', "")
        }
    } else if has_dot {
        let parts: Vec<&str> = cleaned.split('.').collect();
        let last_len = parts.last().map_or(0, |p| p.len());
        if parts.len() > 2 || last_len == 3 {
            // 1.234.567 / 1.234 — grouping dots
            cleaned.replace('.', "")
        } else {
            cleaned.to_string()
        }
    } else {
        cleaned.to_string()
    };

    numeric.parse::<f64>().ok().filter(|p| p.is_finite())
}
