//! Phased anchor scan that turns analyzed lines into line items.
//!
//! Phase 1 handles full one-line items and price anchors, Phase 2 retries
//! weak-price lines in recovery mode, Phase 3 emits leftover discounts as
//! negative items. Nothing at or after the first total line is scanned.

use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::models::{ExtractionMethod, Line, LineItem, RcptConfig};

use super::context::{ContextLine, LineAnalyzer};
use super::rules::{round_money, DecimalFixer};
use super::splitter::LineSplitter;
use super::strategies::{self, ItemCandidate, ScanContext};

/// Mutable state of one extraction run.
#[derive(Debug, Default)]
pub struct ScanState {
    /// Processed line indices already folded into an item.
    pub consumed: HashSet<usize>,
    pub items: Vec<LineItem>,
    /// First index of the dead zone.
    pub boundary: usize,
}

impl ScanState {
    pub fn new(boundary: usize) -> Self {
        Self {
            boundary,
            ..Self::default()
        }
    }

    pub fn is_consumed(&self, idx: usize) -> bool {
        self.consumed.contains(&idx)
    }

    /// Record an item and consume its lines.
    pub fn commit(&mut self, item: LineItem) {
        self.consumed.extend(item.source_line_indices.iter().copied());
        self.items.push(item);
    }
}

/// Items plus the intermediate views they were built from.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub items: Vec<LineItem>,
    pub lines: Vec<ContextLine>,
    /// OCR line index per processed line.
    pub provenance: Vec<usize>,
    pub boundary: usize,
}

/// Item extractor over OCR lines.
pub struct ItemExtractor {
    config: RcptConfig,
    analyzer: LineAnalyzer,
    splitter: LineSplitter,
    decimal: DecimalFixer,
}

impl ItemExtractor {
    pub fn new(config: RcptConfig) -> Self {
        Self {
            analyzer: LineAnalyzer::new(config.clone()),
            splitter: LineSplitter::new(&config.extraction),
            decimal: DecimalFixer::new(),
            config,
        }
    }

    pub fn config(&self) -> &RcptConfig {
        &self.config
    }

    pub fn extract(&self, lines: Vec<Line>) -> Vec<LineItem> {
        self.extract_with_trace(lines).items
    }

    /// Run the full scan and keep the analyzed lines for inspection.
    pub fn extract_with_trace(&self, mut lines: Vec<Line>) -> ExtractionOutcome {
        if self.config.locale.decimal_separator == ',' {
            self.normalize_words(&mut lines);
        }

        let (processed, provenance) = self.splitter.split(&self.analyzer, lines);
        let analyzed = self.analyzer.analyze_all(&processed, &provenance);
        let boundary = self.find_boundary(&analyzed);
        debug!("{} processed lines, dead zone starts at {}", analyzed.len(), boundary);

        let mut state = ScanState::new(boundary);
        self.high_confidence_pass(&analyzed, &mut state);
        self.recovery_pass(&analyzed, &mut state);
        self.residual_discount_pass(&analyzed, &mut state);

        let mut items = state.items;
        items.sort_by_key(LineItem::first_line);

        info!("extracted {} items from {} lines", items.len(), analyzed.len());

        ExtractionOutcome {
            items,
            lines: analyzed,
            provenance,
            boundary,
        }
    }

    /// Dotted prices become comma prices word by word.
    fn normalize_words(&self, lines: &mut [Line]) {
        for word in lines.iter_mut().flat_map(|l| l.words.iter_mut()) {
            if let Some(fixed) = self.decimal.fix_token(&word.text) {
                word.text = fixed;
            }
        }
    }

    /// First total line, else the end. Unpriced total lines above the first
    /// priced line are store headers such as "NETTO Marken-Discount".
    fn find_boundary(&self, lines: &[ContextLine]) -> usize {
        let first_priced = lines
            .iter()
            .position(|l| l.is_price_candidate && !l.is_total_line && !l.is_noise);

        lines
            .iter()
            .enumerate()
            .position(|(i, l)| {
                l.is_total_line
                    && (l.parsed_value.is_some()
                        || l.is_soft_price
                        || first_priced.is_some_and(|p| p < i))
            })
            .unwrap_or(lines.len())
    }

    fn context<'a>(
        &'a self,
        lines: &'a [ContextLine],
        anchor: usize,
        state: &'a ScanState,
        recovery: bool,
    ) -> ScanContext<'a> {
        ScanContext::new(lines, anchor, &state.consumed, state.boundary, recovery, &self.config)
    }

    fn high_confidence_pass(&self, lines: &[ContextLine], state: &mut ScanState) {
        for i in 0..state.boundary {
            if state.is_consumed(i) {
                continue;
            }
            let line = &lines[i];

            let item = if line.is_full_item {
                let ctx = self.context(lines, i, state, false);
                strategies::one_liner(&ctx).map(|item| strategies::fold_weight_line(&ctx, item))
            } else if line.is_valid_anchor {
                let ctx = self.context(lines, i, state, false);
                strategies::kg_two_liner(&ctx).or_else(|| strategies::collect_upwards(&ctx))
            } else {
                None
            };

            if let Some(item) = item {
                self.finish(lines, item, state);
            }
        }
    }

    fn recovery_pass(&self, lines: &[ContextLine], state: &mut ScanState) {
        for i in 0..state.boundary {
            if state.is_consumed(i) || !lines[i].is_recovery_anchor() {
                continue;
            }

            let item = {
                let ctx = self.context(lines, i, state, true);
                strategies::collect_upwards(&ctx)
            };

            if let Some(item) = item {
                debug!("recovered '{}' from line {}", item.name, i);
                self.finish(lines, item, state);
            }
        }
    }

    fn residual_discount_pass(&self, lines: &[ContextLine], state: &mut ScanState) {
        for i in 0..state.boundary {
            if state.is_consumed(i) {
                continue;
            }
            let line = &lines[i];
            let Some(value) = line.parsed_value.filter(|v| line.is_discount_marker && !v.is_zero())
            else {
                continue;
            };

            let amount = -value.abs();
            let item = {
                let ctx = self.context(lines, i, state, false);
                ctx.build(ItemCandidate::single(
                    line.text.clone(),
                    amount,
                    line.tax_code,
                    vec![i],
                    ExtractionMethod::DiscountOnly,
                ))
            };

            if let Some(item) = item {
                debug!("unattached discount '{}' {} on line {}", item.name, item.total, i);
                state.commit(item);
            }
        }
    }

    /// Attach a discount printed right below the item, then commit.
    fn finish(&self, lines: &[ContextLine], mut item: LineItem, state: &mut ScanState) {
        let next = item.last_line() + 1;
        if next < state.boundary && !state.is_consumed(next) {
            let line = &lines[next];
            if let Some(value) = line.parsed_value.filter(|v| line.is_discount_marker && !v.is_zero()) {
                item.discount = round_money(value.abs());
                strategies::attach_line(&mut item, next, lines);
                debug!("attached discount {} to '{}'", item.discount, item.name);
            }
        }
        state.commit(item);
    }
}

impl Default for ItemExtractor {
    fn default() -> Self {
        Self::new(RcptConfig::default())
    }
}

/// Sum of item totals less attached discounts.
pub fn net_sum(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::net_total).sum()
}
