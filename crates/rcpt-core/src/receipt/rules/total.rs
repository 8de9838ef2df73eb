//! Receipt total extraction.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};

use crate::models::KeywordTables;

use super::keywords::contains_keyword;
use super::patterns::{DATE_TAIL, PRICE, TOTAL_AMOUNT};
use super::price::parse_amount;
use super::ExtractionMatch;

/// Upper bound for a plausible receipt total; larger values are card or
/// document numbers.
const MAX_TOTAL: Decimal = dec!(100000);

/// Lines below a total keyword that may still carry the amount.
const SEARCH_AREA: usize = 6;

/// Keywords that unambiguously mark the amount due.
const PRIORITY_KEYWORDS: &[&str] = &["summe", "total", "zu zahlen", "итого", "сумма"];

pub struct TotalExtractor {
    keywords: KeywordTables,
    priority: Vec<String>,
}

impl TotalExtractor {
    pub fn new(keywords: KeywordTables) -> Self {
        Self {
            keywords,
            priority: PRIORITY_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Amount due, searched bottom-up from the end of the receipt.
    pub fn extract<S: AsRef<str>>(&self, lines: &[S]) -> Option<ExtractionMatch<Decimal>> {
        let mut priority_hit: Option<ExtractionMatch<Decimal>> = None;
        let mut plain_hit: Option<ExtractionMatch<Decimal>> = None;

        for i in (0..lines.len()).rev() {
            let text = lines[i].as_ref();
            if !self.keywords.is_total(text) || self.keywords.is_discount_total(text) {
                continue;
            }

            let is_priority = contains_keyword(text, &self.priority);
            let slot = if is_priority { &mut priority_hit } else { &mut plain_hit };
            if slot.is_some() {
                continue;
            }

            let end = (i + SEARCH_AREA).min(lines.len());
            for area in &lines[i..end] {
                let area = area.as_ref();
                if area.contains('%')
                    || self.keywords.is_discount(area)
                    || self.keywords.is_discount_total(area)
                {
                    continue;
                }
                if let Some(value) = first_amount(area) {
                    let confidence = if is_priority { 0.95 } else { 0.8 };
                    debug!("total candidate {} (priority={}) in '{}'", value, is_priority, area);
                    *slot = Some(ExtractionMatch::new(value, confidence, area));
                    break;
                }
            }
        }

        if let Some(best) = priority_hit.or(plain_hit) {
            info!("receipt total: {} ({:.2})", best.value, best.confidence);
            return Some(best);
        }

        self.fallback_max(lines)
    }

    fn fallback_max<S: AsRef<str>>(&self, lines: &[S]) -> Option<ExtractionMatch<Decimal>> {
        let mut best: Option<Decimal> = None;

        for line in lines {
            let line = line.as_ref();
            for m in PRICE.find_iter(line) {
                if DATE_TAIL.is_match(&line[m.end()..]) {
                    continue;
                }
                let Some(value) = parse_amount(m.as_str()) else {
                    continue;
                };
                if value < MAX_TOTAL && best.is_none_or(|b| value > b) {
                    best = Some(value);
                }
            }
        }

        let value = best?;
        info!("receipt total from fallback max: {}", value);
        Some(ExtractionMatch::new(value, 0.4, "fallback max"))
    }
}

impl Default for TotalExtractor {
    fn default() -> Self {
        Self::new(KeywordTables::default())
    }
}

/// First grouped two-decimal amount standing on its own.
fn first_amount(text: &str) -> Option<Decimal> {
    for m in TOTAL_AMOUNT.find_iter(text) {
        let glued_before = text[..m.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_digit() || c == '.' || c == ',');
        let glued_after = text[m.end()..].chars().next().is_some_and(|c| c.is_ascii_digit());
        let prefix_start = text[..m.start()]
            .char_indices()
            .rev()
            .nth(9)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        if glued_before || glued_after || text[prefix_start..m.start()].contains('#') {
            continue;
        }

        if let Some(value) = parse_amount(m.as_str()) {
            if value > Decimal::ZERO && value < MAX_TOTAL {
                return Some(value);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_priority_keyword_wins() {
        let extractor = TotalExtractor::default();
        let receipt = lines("Milch 1,19 A\nZwischensumme 12,30\nzu zahlen 143,37\nGesamter Preisvorteil 4,44");
        let total = extractor.extract(&receipt).unwrap();
        assert_eq!(total.value, dec!(143.37));
        assert_eq!(total.confidence, 0.95);
    }

    #[test]
    fn test_amount_on_next_line() {
        let extractor = TotalExtractor::default();
        let receipt = lines("Brot 2,49 A\nSUMME EUR\n2,49");
        assert_eq!(extractor.extract(&receipt).unwrap().value, dec!(2.49));
    }

    #[test]
    fn test_plain_keyword_confidence() {
        let extractor = TotalExtractor::default();
        let receipt = lines("Brot 2,49 A\nBetrag 2,49");
        let total = extractor.extract(&receipt).unwrap();
        assert_eq!(total.confidence, 0.8);
    }

    #[test]
    fn test_fallback_max_skips_dates() {
        let extractor = TotalExtractor::default();
        let receipt = lines("Brot 2,49 A\nKaese 3,99 B\nDatum 12.03.2024");
        let total = extractor.extract(&receipt).unwrap();
        assert_eq!(total.value, dec!(3.99));
        assert_eq!(total.confidence, 0.4);
    }

    #[test]
    fn test_no_amounts() {
        let extractor = TotalExtractor::default();
        assert!(extractor.extract(&lines("Danke fuer Ihren Einkauf")).is_none());
    }

    #[test]
    fn test_first_amount_ignores_glued_numbers() {
        assert_eq!(first_amount("Summe 12,345"), None);
        assert_eq!(first_amount("Summe 1 234,56"), Some(dec!(1234.56)));
        assert_eq!(first_amount("Beleg #12,00"), None);
    }
}
