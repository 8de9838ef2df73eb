//! Locale-independent discount detection.
//!
//! Works on plain receipt text. A line is a discount when it carries a
//! negative price, or a discount keyword together with any price (line
//! merging upstream can drop the minus sign).

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::models::{
    DiscountExtractionResult, DiscountItem, DiscountKind, KeywordTables, RcptConfig,
};

use super::rules::patterns::{
    ANY_PRICE, DISCOUNT_NAME_TRAIL, LEADING_MINUS, LEADING_PRICE, NEGATIVE_PRICE,
    PRICE_AND_REST, PRICE_AT_LINE_END, TRAILING_UNIT_TIMES_QTY,
};
use super::rules::{parse_amount, DecimalFixer};

/// Marker prefix written by the quantity marker.
pub const QTY_LINE_TAG: &str = "[QTY_LINE]";

const FALLBACK_NAME: &str = "Discount";

/// Whether `line` is an individual discount (discount totals are not).
pub fn is_discount_line(line: &str, keywords: &KeywordTables) -> bool {
    if keywords.is_discount_total(line) {
        return false;
    }
    NEGATIVE_PRICE.is_match(line) || (keywords.is_discount(line) && ANY_PRICE.is_match(line))
}

/// Discount amount, always non-negative; zero when none is found.
pub fn extract_discount_amount(line: &str, keywords: &KeywordTables) -> Decimal {
    if let Some(caps) = NEGATIVE_PRICE.captures(line) {
        if let Some(amount) = parse_amount(&caps[1]) {
            return amount.abs();
        }
    }

    if keywords.is_discount(line) {
        if let Some(m) = ANY_PRICE.find_iter(line).last() {
            if let Some(amount) = parse_amount(m.as_str()) {
                return amount.abs();
            }
        }
    }

    Decimal::ZERO
}

/// Standalone discount extractor over plain text.
pub struct DiscountExtractor {
    keywords: KeywordTables,
    decimal_comma: bool,
    name_max_len: usize,
}

impl DiscountExtractor {
    pub fn new(config: &RcptConfig) -> Self {
        Self {
            keywords: config.keywords.clone(),
            decimal_comma: config.locale.decimal_separator == ',',
            name_max_len: config.extraction.discount_name_max_len,
        }
    }

    pub fn is_discount_line(&self, line: &str) -> bool {
        is_discount_line(line, &self.keywords)
    }

    pub fn extract_discount_amount(&self, line: &str) -> Decimal {
        extract_discount_amount(line, &self.keywords)
    }

    /// Scan the receipt top to bottom and collect every discount.
    pub fn extract_discounts(&self, text: &str) -> DiscountExtractionResult {
        let text = self.normalize(text);
        let mut result = DiscountExtractionResult::default();

        let mut prev_product_name: Option<String> = None;
        let mut prev_line: Option<&str> = None;
        let mut after_total = false;

        for (i, raw) in text.split('\n').enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if self.is_discount_line(line) {
                let amount = self.extract_discount_amount(line);
                if amount > Decimal::ZERO {
                    let name = self.discount_name(line, prev_line);
                    let (kind, related_item) = if after_total {
                        (DiscountKind::Summary, None)
                    } else if let Some(product) = &prev_product_name {
                        (DiscountKind::ItemDiscount, Some(truncate(product, self.name_max_len)))
                    } else {
                        (DiscountKind::Inline, None)
                    };

                    debug!("discount '{}' {} ({}) on line {}", name, amount, kind, i);
                    result.total_discount += amount;
                    result.discounts.push(DiscountItem {
                        name,
                        amount,
                        kind,
                        related_item,
                        source_line_index: i,
                    });
                }
            } else if self.keywords.is_total(line) {
                after_total = true;
            } else if PRICE_AT_LINE_END.is_match(line) && !self.keywords.is_discount(line) {
                let name = PRICE_AND_REST.replace(line, "");
                let name = TRAILING_UNIT_TIMES_QTY.replace(&name, "");
                let name = name.trim();

                if !name.is_empty() {
                    prev_product_name = Some(name.to_string());
                } else if let Some(prev) = prev_line {
                    // Price-only line: the name sits on the line above
                    if !self.keywords.is_discount(prev) && !LEADING_PRICE.is_match(prev) {
                        prev_product_name = Some(prev.to_string());
                    }
                }
            }

            prev_line = Some(line);
        }

        result.discount_count = result.discounts.len();
        if result.discount_count > 0 {
            info!(
                "found {} discounts totalling {}",
                result.discount_count, result.total_discount
            );
        }
        result
    }

    /// Diagnostic count of lines that look like priced purchases.
    pub fn count_price_lines(&self, text: &str) -> usize {
        let text = self.normalize(text);
        text.split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| {
                // Marked lines carry "TOTAL=" and would otherwise hit the skip list
                line.starts_with(QTY_LINE_TAG)
                    || (!self.keywords.is_count_skip(line)
                        && !NEGATIVE_PRICE.is_match(line)
                        && PRICE_AT_LINE_END.is_match(line))
            })
            .count()
    }

    fn discount_name(&self, line: &str, prev_line: Option<&str>) -> String {
        let stripped = DISCOUNT_NAME_TRAIL.replace(line, "");
        let stripped = LEADING_MINUS.replace(stripped.trim(), "");
        let mut name = stripped.trim().to_string();

        if name.is_empty() {
            if let Some(prev) = prev_line.filter(|p| self.keywords.is_discount(p)) {
                name = prev.trim().to_string();
            }
        }
        if name.is_empty() {
            name = FALLBACK_NAME.to_string();
        }

        truncate(&name, self.name_max_len)
    }

    fn normalize(&self, text: &str) -> String {
        if self.decimal_comma {
            DecimalFixer::new().fix(text).text
        } else {
            text.to_string()
        }
    }
}

impl Default for DiscountExtractor {
    fn default() -> Self {
        Self::new(&RcptConfig::default())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
