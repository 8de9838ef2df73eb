//! Price extraction for receipt lines.
//!
//! Receipts print the line total at the right edge, so the right-most valid
//! price wins. Lines that look like a date or a time never yield a price.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::debug;

use super::math::round_money;
use super::patterns::{followed_by_digit, DATE_OR_TIME, PRICE, SOFT_PRICE, SOFT_PRICE_PARTS};
use super::{ExtractionMatch, FieldExtractor};

/// Two-decimal price extractor.
pub struct PriceParser;

impl PriceParser {
    pub fn new() -> Self {
        Self
    }

    /// Right-most valid price on the line.
    pub fn parse(&self, text: &str) -> Option<Decimal> {
        self.extract(text).map(|m| m.value)
    }

    /// Weak price matches (one or two decimals, split decimals), used in recovery.
    pub fn extract_soft(&self, text: &str) -> Vec<ExtractionMatch<Decimal>> {
        if is_date_or_time(text) {
            return Vec::new();
        }

        SOFT_PRICE
            .find_iter(text)
            .filter(|m| !followed_by_digit(text, m.end()))
            .filter_map(|m| {
                parse_amount(m.as_str()).map(|value| {
                    ExtractionMatch::new(value, 0.4, m.as_str()).with_position(m.start(), m.end())
                })
            })
            .collect()
    }

    /// Recover a price from raw text when strict parsing missed it.
    pub fn recover(&self, text: &str) -> Option<Decimal> {
        if is_date_or_time(text) {
            return None;
        }

        let caps = SOFT_PRICE_PARTS.captures_iter(text).last()?;
        let fraction = &caps[2];
        let raw = if fraction.is_empty() {
            caps[1].to_string()
        } else {
            format!("{}.{}", &caps[1], fraction)
        };

        match Decimal::from_str(&raw) {
            Ok(value) => Some(round_money(value)),
            Err(e) => {
                debug!("price recovery failed for '{}': {}", raw, e);
                None
            }
        }
    }
}

impl Default for PriceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PriceParser {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).pop()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        if is_date_or_time(text) {
            return Vec::new();
        }

        let mut results = Vec::new();
        for m in PRICE.find_iter(text) {
            if followed_by_digit(text, m.end()) {
                continue;
            }
            if let Some(value) = parse_amount(m.as_str()) {
                results.push(
                    ExtractionMatch::new(value, 0.9, m.as_str()).with_position(m.start(), m.end()),
                );
            }
        }
        results
    }
}

/// Whether the text carries a date (`dd.mm.yy[yy]`) or a time (`hh:mm[:ss]`).
pub fn is_date_or_time(text: &str) -> bool {
    DATE_OR_TIME.is_match(text)
}

/// Parse a price token with either decimal separator (e.g. "-0,30", "1. 99").
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let normalized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    match Decimal::from_str(&normalized) {
        Ok(value) => Some(round_money(value)),
        Err(e) => {
            debug!("price conversion failed for '{}': {}", raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_rightmost_price() {
        let parser = PriceParser::new();
        assert_eq!(parser.parse("Fairtrade Rosen 2,99 x 4 11,96 A"), Some(dec!(11.96)));
        assert_eq!(parser.parse("Milch 1.19"), Some(dec!(1.19)));
        assert_eq!(parser.parse("Preisvorteil -0,30"), Some(dec!(-0.30)));
    }

    #[test]
    fn test_rejects_dates_and_times() {
        let parser = PriceParser::new();
        assert_eq!(parser.parse("24.12.2025 18:05 12,50"), None);
        assert_eq!(parser.parse("Uhrzeit 18:05"), None);
        assert!(parser.extract_all("Datum 01.02.24").is_empty());
    }

    #[test]
    fn test_rejects_more_than_two_decimals() {
        let parser = PriceParser::new();
        assert_eq!(parser.parse("1,234 kg"), None);
        assert_eq!(parser.parse("Artikel 12345"), None);
    }

    #[test]
    fn test_extract_all_positions() {
        let parser = PriceParser::new();
        let all = parser.extract_all("Gurken 0,95 x 2 1,90 A");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].position, Some((7, 11)));
        assert_eq!(all[1].value, dec!(1.90));
    }

    #[test]
    fn test_soft_price_and_recovery() {
        let parser = PriceParser::new();
        assert_eq!(parser.parse("Butter 1,9"), None);
        assert_eq!(parser.extract_soft("Butter 1,9").len(), 1);
        assert_eq!(parser.recover("Butter 1,9"), Some(dec!(1.90)));
        assert_eq!(parser.recover("Butter 2, 49"), Some(dec!(2.49)));
    }

    #[test]
    fn test_parse_amount_normalizes() {
        assert_eq!(parse_amount("1,99"), Some(dec!(1.99)));
        assert_eq!(parse_amount("-0.30"), Some(dec!(-0.30)));
        assert_eq!(parse_amount("abc"), None);
    }
}
