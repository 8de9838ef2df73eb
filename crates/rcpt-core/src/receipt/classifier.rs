//! Coarse line buckets used to bound item scanning.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::models::KeywordTables;

use super::rules::patterns::PERCENT_TOKEN;

/// Intent of a receipt line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineType {
    Item,
    Total,
    Discount,
    TaxInfo,
    Noise,
}

impl LineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineType::Item => "item",
            LineType::Total => "total",
            LineType::Discount => "discount",
            LineType::TaxInfo => "tax_info",
            LineType::Noise => "noise",
        }
    }
}

/// Keyword-driven line classifier.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    keywords: KeywordTables,
}

impl LineClassifier {
    pub fn new(keywords: KeywordTables) -> Self {
        Self { keywords }
    }

    /// Priority order: TOTAL, DISCOUNT, TAX_INFO, NOISE keyword, ITEM, NOISE.
    pub fn classify(&self, text: &str, has_price: bool, has_qty: bool) -> LineType {
        let line_type = if text.trim().is_empty() {
            LineType::Noise
        } else if has_price && self.keywords.is_total(text) {
            LineType::Total
        } else if self.keywords.is_discount(text) {
            LineType::Discount
        } else if self.keywords.is_tax_info(text) || (has_price && is_rate_row(text)) {
            LineType::TaxInfo
        } else if self.keywords.is_noise(text) {
            LineType::Noise
        } else if has_price {
            LineType::Item
        } else {
            LineType::Noise
        };

        trace!("classified '{}' as {} (price={}, qty={})", text, line_type.as_str(), has_price, has_qty);
        line_type
    }
}

/// A `NN%` token with no product name in front of it, e.g. "A 19% 12,00 2,28".
/// "H-Milch 3,5% 1,19 A" names a product and stays an item.
fn is_rate_row(text: &str) -> bool {
    PERCENT_TOKEN.find(text).is_some_and(|m| {
        !text[..m.start()]
            .split_whitespace()
            .any(|token| token.chars().filter(|c| c.is_alphabetic()).count() >= 2)
    })
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new(KeywordTables::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_requires_price() {
        let classifier = LineClassifier::default();
        assert_eq!(classifier.classify("zu zahlen 143,37", true, false), LineType::Total);
        assert_ne!(classifier.classify("SUMME EUR", false, false), LineType::Total);
    }

    #[test]
    fn test_discount_before_noise() {
        let classifier = LineClassifier::default();
        assert_eq!(classifier.classify("Preisvorteil -0,30", true, false), LineType::Discount);
        assert_eq!(classifier.classify("RABATT 20% -1,60", true, false), LineType::Discount);
    }

    #[test]
    fn test_tax_info_bucket() {
        let classifier = LineClassifier::default();
        assert_eq!(classifier.classify("A 19% 12,00 2,28", true, false), LineType::TaxInfo);
        assert_eq!(classifier.classify("USt 7 % 0,49", true, false), LineType::TaxInfo);
    }

    #[test]
    fn test_percentage_in_product_name_is_an_item() {
        let classifier = LineClassifier::default();
        assert_eq!(classifier.classify("H-Milch 3,5% 1,19 A", true, false), LineType::Item);
        assert_eq!(classifier.classify("Joghurt 1,5% 0,79 A", true, false), LineType::Item);
        assert_eq!(classifier.classify("19% 12,00 2,28", true, false), LineType::TaxInfo);
    }

    #[test]
    fn test_noise_and_items() {
        let classifier = LineClassifier::default();
        assert_eq!(classifier.classify("Tel. 030 123456", false, false), LineType::Noise);
        assert_eq!(classifier.classify("Milch 1,19 A", true, false), LineType::Item);
        assert_eq!(classifier.classify("Wasser medium", false, false), LineType::Noise);
        assert_eq!(classifier.classify("", false, false), LineType::Noise);
    }

    #[test]
    fn test_keyword_inside_word_is_ignored() {
        let classifier = LineClassifier::default();
        // "off" must not fire inside "Coffee"
        assert_eq!(classifier.classify("Coffee Beans 4,99 A", true, false), LineType::Item);
    }
}
