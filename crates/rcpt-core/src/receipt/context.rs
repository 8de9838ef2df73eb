//! Per-line feature extraction.
//!
//! Every processed line is analyzed exactly once into a [`ContextLine`]; the
//! item extractor and the splitter only ever read these views.

use rust_decimal::Decimal;
use tracing::trace;

use crate::models::{Line, RcptConfig, TaxCode};

use super::classifier::{LineClassifier, LineType};
use super::discount::is_discount_line;
use super::rules::patterns::{MATH_PATTERN, METADATA, STAIR_UNIT_PRICE};
use super::rules::{
    is_date_or_time, CyrillicFixer, ExtractionMatch, FieldExtractor, GhostSuffixFixer,
    PriceParser, QuantityParser, TaxParser,
};

/// Analyzed view of one processed line.
#[derive(Debug, Clone)]
pub struct ContextLine {
    /// Position in the processed (post-split) sequence.
    pub index: usize,
    /// Index of the OCR line this one was produced from.
    pub original_index: usize,
    /// Repaired text.
    pub text: String,
    /// Right-most strict price.
    pub parsed_value: Option<Decimal>,
    pub tax_code: Option<TaxCode>,
    /// Every strict price with its byte range, left to right.
    pub price_ranges: Vec<ExtractionMatch<Decimal>>,
    /// Every weak price with its byte range, left to right.
    pub soft_ranges: Vec<ExtractionMatch<Decimal>>,
    pub line_type: LineType,

    pub is_full_item: bool,
    pub is_price_candidate: bool,
    pub is_soft_price: bool,
    pub is_math_pattern: bool,
    pub is_discount_marker: bool,
    pub is_noise: bool,
    pub is_text_candidate: bool,
    pub is_metadata_line: bool,
    /// Carries a total keyword (`summe`, `zu zahlen`, ...).
    pub is_total_line: bool,
    /// Dangling `price x` fragment of a staircase item.
    pub is_unit_fragment: bool,
    /// Usable as a Phase 1 anchor.
    pub is_valid_anchor: bool,
}

impl ContextLine {
    /// Text left of the first strict price, or the whole line.
    pub fn text_before_price(&self) -> &str {
        match self.price_ranges.first() {
            Some(m) => &self.text[..m.start()],
            None => &self.text,
        }
    }

    /// Text left of the first weak price, or the whole line.
    pub fn text_before_soft_price(&self) -> &str {
        match self.soft_ranges.first() {
            Some(m) => &self.text[..m.start()],
            None => &self.text,
        }
    }

    /// Usable as a recovery anchor in Phase 2.
    pub fn is_recovery_anchor(&self) -> bool {
        self.is_soft_price
            && !self.is_valid_anchor
            && !self.is_noise
            && !self.is_discount_marker
            && !self.is_math_pattern
            && !self.is_metadata_line
            && !self.is_unit_fragment
    }
}

/// Builds [`ContextLine`]s from raw lines.
pub struct LineAnalyzer {
    config: RcptConfig,
    classifier: LineClassifier,
    prices: PriceParser,
    taxes: TaxParser,
    quantities: QuantityParser,
    cyrillic: CyrillicFixer,
    ghost: GhostSuffixFixer,
}

impl LineAnalyzer {
    pub fn new(config: RcptConfig) -> Self {
        Self {
            classifier: LineClassifier::new(config.keywords.clone()),
            config,
            prices: PriceParser::new(),
            taxes: TaxParser::new(),
            quantities: QuantityParser::new(),
            cyrillic: CyrillicFixer::new(),
            ghost: GhostSuffixFixer::new(),
        }
    }

    pub fn config(&self) -> &RcptConfig {
        &self.config
    }

    /// Analyze every line; `provenance[i]` is the OCR line of processed line `i`.
    pub fn analyze_all(&self, lines: &[Line], provenance: &[usize]) -> Vec<ContextLine> {
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let original = provenance.get(i).copied().unwrap_or(i);
                self.analyze(line, i, original)
            })
            .collect()
    }

    pub fn analyze(&self, line: &Line, index: usize, original_index: usize) -> ContextLine {
        let text = self.repair(&line.text());
        self.analyze_text(text, index, original_index)
    }

    /// Analyze already repaired text.
    pub fn analyze_text(&self, text: String, index: usize, original_index: usize) -> ContextLine {
        let keywords = &self.config.keywords;

        let price_ranges = self.prices.extract_all(&text);
        let soft_ranges = self.prices.extract_soft(&text);
        let parsed_value = price_ranges.last().map(|m| m.value);
        let tax_code = self.taxes.parse(&text);
        let is_math_pattern = MATH_PATTERN.is_match(&text);
        let has_qty = self.quantities.parse(&text).is_some();
        let line_type = self.classifier.classify(&text, parsed_value.is_some(), has_qty);

        let letters = count_letters(&text);
        let name_letters = price_ranges
            .first()
            .map(|m| count_letters(&text[..m.start()]))
            .unwrap_or(letters);

        let is_noise = match line_type {
            LineType::Noise => letters < 2 || keywords.is_noise(&text) || is_date_or_time(&text),
            LineType::TaxInfo | LineType::Total => true,
            LineType::Item | LineType::Discount => false,
        };
        let is_discount_marker = is_discount_line(&text, keywords);
        let is_total_line = keywords.is_total(&text);
        let is_metadata_line = METADATA.is_match(&text);
        let is_unit_fragment = !is_math_pattern && STAIR_UNIT_PRICE.is_match(&text);

        // A lone "price x qty" without a total is a multiplier row, not a price
        let is_price_candidate =
            parsed_value.is_some() && !(is_math_pattern && price_ranges.len() < 2);
        let is_soft_price = !soft_ranges.is_empty();

        let is_full_item = name_letters >= 2
            && is_price_candidate
            && tax_code.is_some()
            && !is_noise
            && !is_discount_marker;
        let is_text_candidate = letters >= 2
            && parsed_value.is_none()
            && !is_noise
            && !is_discount_marker
            && !is_total_line;
        let is_valid_anchor = is_price_candidate
            && !is_noise
            && !is_discount_marker
            && !is_metadata_line
            && !is_unit_fragment;

        trace!(
            "line {} (ocr {}): '{}' type={} value={:?} full={} anchor={}",
            index,
            original_index,
            text,
            line_type.as_str(),
            parsed_value,
            is_full_item,
            is_valid_anchor
        );

        ContextLine {
            index,
            original_index,
            text,
            parsed_value,
            tax_code,
            price_ranges,
            soft_ranges,
            line_type,
            is_full_item,
            is_price_candidate,
            is_soft_price,
            is_math_pattern,
            is_discount_marker,
            is_noise,
            is_text_candidate,
            is_metadata_line,
            is_total_line,
            is_unit_fragment,
            is_valid_anchor,
        }
    }

    /// Confusable-script and ghost-suffix repair.
    pub fn repair(&self, raw: &str) -> String {
        let text = self.cyrillic.fix(raw, &self.config.locale).text;
        self.ghost.fix(&text).text
    }
}

fn count_letters(text: &str) -> usize {
    text.chars().filter(|c| c.is_alphabetic()).count()
}
