//! Receipt parser combining locale detection with item, discount, total and
//! metadata extraction.

use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::{
    DiscountExtractionResult, LineItem, LocaleConfig, OcrDocument, RcptConfig, StoreInfo,
};

use super::discount::DiscountExtractor;
use super::extractor::{net_sum, ItemExtractor};
use super::locale::LocaleDetector;
use super::qty_marker::QuantityMarker;
use super::rules::{DateExtractor, FieldExtractor, StoreDetector, TotalExtractor};
use super::ReceiptExtractor;

/// Result of receipt extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptResult {
    /// Line items in receipt order.
    pub items: Vec<LineItem>,
    /// Standalone discount scan over the raw text.
    pub discounts: DiscountExtractionResult,
    /// Amount due, when a total line was found.
    pub receipt_total: Option<Decimal>,
    /// Locale the receipt was parsed with.
    pub locale: String,
    /// Transaction date.
    pub date: Option<NaiveDate>,
    pub store: Option<StoreInfo>,
    /// Raw text with quantity lines rewritten to the tagged form.
    pub marked_text: String,
    /// Diagnostic count of priced lines.
    pub price_line_count: usize,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ReceiptResult {
    /// Items that are purchases rather than standalone discounts.
    pub fn purchases(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(|i| !i.is_discount())
    }

    /// Sum of item totals less discounts.
    pub fn net_total(&self) -> Decimal {
        net_sum(&self.items)
    }
}

/// Rule-based receipt parser.
pub struct ReceiptParser {
    config: RcptConfig,
    items: ItemExtractor,
    discounts: DiscountExtractor,
    marker: QuantityMarker,
    totals: TotalExtractor,
    dates: DateExtractor,
    stores: StoreDetector,
    locales: LocaleDetector,
}

impl ReceiptParser {
    pub fn new(config: RcptConfig) -> Self {
        Self {
            items: ItemExtractor::new(config.clone()),
            discounts: DiscountExtractor::new(&config),
            marker: QuantityMarker::new(),
            totals: TotalExtractor::new(config.keywords.clone()),
            dates: DateExtractor::new(),
            stores: StoreDetector::new(config.keywords.clone()),
            locales: LocaleDetector::new(config.locale.code.clone()),
            config,
        }
    }

    pub fn config(&self) -> &RcptConfig {
        &self.config
    }

    /// Parse an OCR document.
    ///
    /// With locale detection on, a receipt whose detected locale differs from
    /// the configured one is parsed with that locale's settings.
    pub fn parse(&self, document: &OcrDocument) -> ReceiptResult {
        let start = Instant::now();

        let text = if document.text.trim().is_empty() {
            document.joined_text()
        } else {
            document.text.clone()
        };
        info!(
            "Parsing receipt: {} lines, {} characters of text",
            document.lines.len(),
            text.len()
        );

        if self.config.locale.detect {
            let detected = self.locales.detect(&text);
            if detected.code != self.config.locale.code {
                let mut config = self.config.clone();
                config.locale = LocaleConfig::from_code(&detected.code);
                return ReceiptParser::new(config).run(document, &text, start);
            }
        }

        self.run(document, &text, start)
    }

    fn run(&self, document: &OcrDocument, text: &str, start: Instant) -> ReceiptResult {

        let items = self.items.extract(document.lines.clone());
        let discounts = self.discounts.extract_discounts(text);
        let price_line_count = self.discounts.count_price_lines(text);
        let marked = self.marker.process(text);

        let text_lines: Vec<&str> = text.lines().collect();
        let receipt_total = self.totals.extract(&text_lines).map(|m| m.value);
        let date = self.dates.extract(text).map(|m| m.value);
        let store = self.stores.detect(&text_lines);

        let warnings = self.check(&items, price_line_count, receipt_total);
        for warning in &warnings {
            warn!("{}", warning);
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Receipt parsed: {} items, {} discounts in {}ms",
            items.len(),
            discounts.discount_count,
            processing_time_ms
        );

        ReceiptResult {
            items,
            discounts,
            receipt_total,
            locale: self.config.locale.code.clone(),
            date,
            store,
            marked_text: marked.marked_text,
            price_line_count,
            warnings,
            processing_time_ms,
        }
    }

    /// Parse plain receipt text.
    pub fn parse_text(&self, text: &str) -> ReceiptResult {
        self.parse(&OcrDocument::from_text(text))
    }

    fn check(
        &self,
        items: &[LineItem],
        price_line_count: usize,
        receipt_total: Option<Decimal>,
    ) -> Vec<String> {
        let mut warnings = Vec::new();

        if items.is_empty() {
            warnings.push("Could not extract line items".to_string());
        }

        let purchases = items.iter().filter(|i| !i.is_discount()).count();
        if purchases != price_line_count {
            warnings.push(format!(
                "Extracted {} items but counted {} priced lines",
                purchases, price_line_count
            ));
        }

        if let Some(total) = receipt_total {
            let sum = net_sum(items);
            if (sum - total).abs() > self.config.extraction.reconcile_tolerance {
                warnings.push(format!(
                    "Item sum {} does not match receipt total {}",
                    sum, total
                ));
            }
        }

        warnings
    }
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new(RcptConfig::default())
    }
}

impl ReceiptExtractor for ReceiptParser {
    fn extract(&self, document: &OcrDocument) -> ReceiptResult {
        self.parse(document)
    }

    fn extract_from_text(&self, text: &str) -> ReceiptResult {
        self.parse_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_consistent_receipt_has_no_warnings() {
        let parser = ReceiptParser::default();
        let result = parser.parse_text("Milch 1,19 A\nBrot 2,49 A\nSumme 3,68");
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.receipt_total, Some(dec!(3.68)));
        assert_eq!(result.price_line_count, 2);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_reconciliation_warning() {
        let parser = ReceiptParser::default();
        let result = parser.parse_text("Milch 1,19 A\nBrot 2,49 A\nSumme 9,99");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("does not match"));
    }

    #[test]
    fn test_empty_receipt_warns() {
        let parser = ReceiptParser::default();
        let result = parser.extract_from_text("");
        assert!(result.items.is_empty());
        assert!(result.warnings.iter().any(|w| w.contains("line items")));
    }

    #[test]
    fn test_date_and_store_metadata() {
        let parser = ReceiptParser::default();
        let result = parser.parse_text("REWE Markt GmbH\nMilch 1,19 A\nSumme 1,19\nDatum 24.12.2025 18:05");
        assert_eq!(result.date, NaiveDate::from_ymd_opt(2025, 12, 24));
        assert_eq!(result.store.as_ref().and_then(|s| s.brand.as_deref()), Some("REWE"));
        assert_eq!(result.items.len(), 1);
    }

    #[test]
    fn test_detected_locale_switches_separator() {
        let parser = ReceiptParser::default();
        let result = parser.parse_text("Coffee Beans 4.99 A\nMilk 1.29 A\nSUBTOTAL 6.28\nCASH 10.00\nCHANGE 3.72");
        assert_eq!(result.locale, "en");
        assert_eq!(result.receipt_total, Some(dec!(6.28)));
        let totals: Vec<_> = result.items.iter().map(|i| i.total).collect();
        assert_eq!(totals, vec![dec!(4.99), dec!(1.29)]);
    }

    #[test]
    fn test_fixed_locale_skips_detection() {
        let parser = ReceiptParser::new(RcptConfig::for_locale("de"));
        let result = parser.parse_text("Coffee Beans 4.99 A\nSUBTOTAL 4.99\nCASH 5.00\nCHANGE 0.01");
        assert_eq!(result.locale, "de");
    }

    #[test]
    fn test_discounts_reduce_net_total() {
        let parser = ReceiptParser::default();
        let result = parser.parse_text("Schweinenackenbraten 10,85 A\nPreisvorteil -0,30\nSumme 10,55");
        assert_eq!(result.net_total(), dec!(10.55));
        assert_eq!(result.discounts.total_discount, dec!(0.30));
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }
}
