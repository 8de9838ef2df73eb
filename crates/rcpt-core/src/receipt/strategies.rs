//! Item reconstruction strategies.
//!
//! Each strategy is a pure function from a [`ScanContext`] to an optional
//! [`LineItem`]. The extractor tries them in a fixed order and keeps the
//! first success. Every candidate passes through [`ScanContext::build`],
//! which owns name cleanup, rejection rules and the arithmetic check.

use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{ExtractionConfig, ExtractionMethod, KeywordTables, LineItem, RcptConfig, TaxCode};

use super::context::ContextLine;
use super::rules::patterns::{
    KG_LINE, MATH_PATTERN, NAME_PRICE_SUFFIX, PRICE, STAIR_QTY, STAIR_UNIT_PRICE, STAIR_X_QTY,
};
use super::rules::quantity::parse_number;
use super::rules::{parse_amount, round_money, MathChecker, PriceParser};

/// Read-only view of the scan handed to each strategy.
pub struct ScanContext<'a> {
    pub lines: &'a [ContextLine],
    /// Index of the anchor line.
    pub anchor: usize,
    pub consumed: &'a HashSet<usize>,
    /// First index of the dead zone.
    pub boundary: usize,
    /// Phase 2 mode: soft-price anchors and recovered values.
    pub recovery: bool,
    /// Price of the anchor, recovered from raw text in recovery mode.
    pub value: Option<Decimal>,
    config: &'a RcptConfig,
    checker: MathChecker,
}

/// Unvalidated item assembled by a strategy.
#[derive(Debug, Clone)]
pub struct ItemCandidate {
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: Decimal,
    pub total: Decimal,
    pub tax_code: Option<TaxCode>,
    pub lines: Vec<usize>,
    pub method: ExtractionMethod,
}

impl ItemCandidate {
    /// Quantity-one candidate where the unit price is the total.
    pub fn single(
        name: impl Into<String>,
        total: Decimal,
        tax_code: Option<TaxCode>,
        lines: Vec<usize>,
        method: ExtractionMethod,
    ) -> Self {
        Self {
            name: name.into(),
            unit_price: total,
            quantity: Decimal::ONE,
            total,
            tax_code,
            lines,
            method,
        }
    }
}

impl<'a> ScanContext<'a> {
    pub fn new(
        lines: &'a [ContextLine],
        anchor: usize,
        consumed: &'a HashSet<usize>,
        boundary: usize,
        recovery: bool,
        config: &'a RcptConfig,
    ) -> Self {
        let line = &lines[anchor];
        let value = match line.parsed_value {
            Some(value) => Some(value),
            None if recovery => PriceParser::new().recover(&line.text),
            None => None,
        };

        Self {
            lines,
            anchor,
            consumed,
            boundary,
            recovery,
            value,
            config,
            checker: MathChecker::new(),
        }
    }

    pub fn anchor_line(&self) -> &ContextLine {
        &self.lines[self.anchor]
    }

    pub fn is_free(&self, idx: usize) -> bool {
        !self.consumed.contains(&idx)
    }

    pub fn settings(&self) -> &ExtractionConfig {
        &self.config.extraction
    }

    pub fn keywords(&self) -> &KeywordTables {
        &self.config.keywords
    }

    /// Indices above the anchor, nearest first.
    fn above(&self, window: usize) -> impl Iterator<Item = usize> {
        (self.anchor.saturating_sub(window)..self.anchor).rev()
    }

    /// Anchor name: text left of its first price.
    fn anchor_name(&self) -> &str {
        let line = self.anchor_line();
        if line.price_ranges.is_empty() {
            line.text_before_soft_price()
        } else {
            line.text_before_price()
        }
    }

    /// Validate a candidate and turn it into a line item.
    pub fn build(&self, candidate: ItemCandidate) -> Option<LineItem> {
        let name = clean_name(&candidate.name);

        if !name.chars().any(char::is_alphabetic) {
            debug!("rejected {} candidate '{}': no letters", candidate.method, candidate.name);
            return None;
        }
        if self.keywords().is_summary(&name) {
            debug!("rejected {} candidate '{}': summary keyword", candidate.method, name);
            return None;
        }
        let corroborated = candidate.method == ExtractionMethod::DiscountOnly
            || (candidate.unit_price > Decimal::ZERO && candidate.total > Decimal::ZERO);
        if is_stray_tax_fragment(&name) && !corroborated {
            debug!("rejected {} candidate '{}': stray tax letters", candidate.method, name);
            return None;
        }

        let tolerance = if candidate.method.is_weight_based() {
            self.settings().weight_tolerance
        } else {
            self.settings().arithmetic_tolerance
        };
        if !self.checker.holds(candidate.quantity, candidate.unit_price, candidate.total, tolerance) {
            debug!(
                "rejected {} candidate '{}': {} x {} != {}",
                candidate.method, name, candidate.quantity, candidate.unit_price, candidate.total
            );
            return None;
        }

        let mut source_line_indices = candidate.lines;
        source_line_indices.sort_unstable();
        source_line_indices.dedup();
        let origin_line_indices = self.origins(&source_line_indices);

        Some(LineItem {
            name,
            unit_price: round_money(candidate.unit_price),
            quantity: candidate.quantity,
            total: round_money(candidate.total),
            discount: round_money(Decimal::ZERO),
            tax_code: candidate.tax_code,
            source_line_indices,
            origin_line_indices,
            extraction_method: candidate.method,
        })
    }

    fn origins(&self, indices: &[usize]) -> Vec<usize> {
        origins(self.lines, indices)
    }
}

/// Fold line `idx` into an existing item, keeping indices sorted.
pub fn attach_line(item: &mut LineItem, idx: usize, lines: &[ContextLine]) {
    if !item.source_line_indices.contains(&idx) {
        item.source_line_indices.push(idx);
        item.source_line_indices.sort_unstable();
    }
    item.origin_line_indices = origins(lines, &item.source_line_indices);
}

fn origins(lines: &[ContextLine], indices: &[usize]) -> Vec<usize> {
    let mut origin: Vec<usize> = indices
        .iter()
        .filter_map(|&i| lines.get(i).map(|l| l.original_index))
        .collect();
    origin.sort_unstable();
    origin.dedup();
    origin
}

pub type Strategy = fn(&ScanContext<'_>) -> Option<LineItem>;

/// "Collect upwards" chain, in evaluation order.
pub const COLLECT_UPWARDS: [(&str, Strategy); 5] = [
    ("one-liner", one_liner),
    ("staircase", staircase),
    ("math-hybrid", math_hybrid),
    ("kg-two-liner", kg_two_liner),
    ("simple-two-liner", simple_two_liner),
];

/// First strategy of the chain that yields an item.
pub fn collect_upwards(ctx: &ScanContext<'_>) -> Option<LineItem> {
    COLLECT_UPWARDS.iter().find_map(|(label, strategy)| {
        let item = strategy(ctx)?;
        debug!("anchor {} -> {} '{}' {}", ctx.anchor, label, item.name, item.total);
        Some(item)
    })
}

/// Name and price on the anchor line, with an optional inline `price x qty`.
pub fn one_liner(ctx: &ScanContext<'_>) -> Option<LineItem> {
    let anchor = ctx.anchor_line();
    let eligible = anchor.is_full_item
        || anchor.is_price_candidate
        || (ctx.recovery && anchor.is_soft_price);
    if !eligible {
        return None;
    }

    if anchor.is_math_pattern {
        if let Some(item) = inline_math(ctx, anchor) {
            return Some(item);
        }
    }

    let total = ctx.value?;
    ctx.build(ItemCandidate::single(
        ctx.anchor_name(),
        total,
        anchor.tax_code,
        vec![ctx.anchor],
        ExtractionMethod::OneLiner,
    ))
}

fn inline_math(ctx: &ScanContext<'_>, anchor: &ContextLine) -> Option<LineItem> {
    let caps = MATH_PATTERN.captures(&anchor.text)?;
    let whole = caps.get(0)?;
    let unit_price = parse_amount(&caps[1])?;
    let quantity = parse_number(&caps[2])?;
    let total = anchor
        .price_ranges
        .iter()
        .filter(|m| m.start() >= whole.end())
        .last()?
        .value;

    ctx.build(ItemCandidate {
        name: anchor.text[..whole.start()].to_string(),
        unit_price,
        quantity,
        total,
        tax_code: anchor.tax_code,
        lines: vec![ctx.anchor],
        method: ExtractionMethod::OneLiner,
    })
}

/// Quantity, unit price and name on separate lines above the total.
pub fn staircase(ctx: &ScanContext<'_>) -> Option<LineItem> {
    let total = ctx.value?;
    let mut quantity = None;
    let mut unit_price = None;
    let mut name_line = None;
    let mut lines = vec![ctx.anchor];

    for i in ctx.above(ctx.settings().max_lookback) {
        if !ctx.is_free(i) {
            break;
        }
        let line = &ctx.lines[i];
        if line.is_price_candidate && (unit_price.is_some() || line.is_full_item) {
            break;
        }
        let text = line.text.trim();

        if quantity.is_none() {
            if let Some(caps) = STAIR_QTY.captures(text).or_else(|| STAIR_X_QTY.captures(text)) {
                quantity = parse_number(&caps[1]);
                lines.push(i);
                continue;
            }
        }

        if unit_price.is_none() {
            if let Some(caps) = STAIR_UNIT_PRICE.captures(text) {
                unit_price = parse_amount(&caps[1]);
                lines.push(i);
                continue;
            }
            // Bare price with at most a tax letter next to it
            if line.is_price_candidate && PRICE.replace_all(text, "").trim().chars().count() < 3 {
                unit_price = line.parsed_value;
                lines.push(i);
                continue;
            }
        }

        if name_line.is_none()
            && line.is_text_candidate
            && (quantity.is_some() || unit_price.is_some())
        {
            name_line = Some(i);
            lines.push(i);
        }

        if quantity.is_some() && unit_price.is_some() && name_line.is_some() {
            break;
        }
    }

    let name = &ctx.lines[name_line?].text;
    ctx.build(ItemCandidate {
        name: name.clone(),
        unit_price: unit_price?,
        quantity: quantity?,
        total,
        tax_code: ctx.anchor_line().tax_code,
        lines,
        method: ExtractionMethod::Staircase,
    })
}

/// A `price x qty` line above the anchor whose product is the anchor total.
pub fn math_hybrid(ctx: &ScanContext<'_>) -> Option<LineItem> {
    let total = ctx.value?;

    for i in ctx.above(ctx.settings().max_lookback) {
        if !ctx.is_free(i) {
            break;
        }
        let line = &ctx.lines[i];
        if line.is_math_pattern {
            return math_row(ctx, i, total);
        }
        if line.is_price_candidate || (line.is_soft_price && !line.is_noise) {
            break;
        }
    }
    None
}

fn math_row(ctx: &ScanContext<'_>, row: usize, total: Decimal) -> Option<LineItem> {
    let line = &ctx.lines[row];
    let caps = MATH_PATTERN.captures(&line.text)?;
    let start = caps.get(0)?.start();
    let unit_price = parse_amount(&caps[1])?;
    let quantity = parse_number(&caps[2])?;

    let mut name = line.text[..start].to_string();
    let mut lines = vec![row, ctx.anchor];

    // "2 x 0,99" rows often carry no name; take it from the line above
    if !name.chars().any(char::is_alphabetic) && row > 0 {
        let above = &ctx.lines[row - 1];
        if ctx.is_free(row - 1) && above.is_text_candidate {
            name = above.text.clone();
            lines.push(row - 1);
        }
    }

    ctx.build(ItemCandidate {
        name,
        unit_price,
        quantity,
        total,
        tax_code: ctx.anchor_line().tax_code.or(line.tax_code),
        lines,
        method: ExtractionMethod::MathHybrid,
    })
}

/// Anchor followed by a `weight unit x unit_price` line.
pub fn kg_two_liner(ctx: &ScanContext<'_>) -> Option<LineItem> {
    let total = ctx.value?;
    let next = ctx.anchor + 1;
    let weight_line = weight_continuation(ctx, next)?;

    let (quantity, unit_price) = match weight_line {
        WeightLine::Verified { weight, unit_price } => (weight, unit_price),
        WeightLine::Metadata => (Decimal::ONE, total),
    };

    ctx.build(ItemCandidate {
        name: ctx.anchor_name().to_string(),
        unit_price,
        quantity,
        total,
        tax_code: ctx.anchor_line().tax_code,
        lines: vec![ctx.anchor, next],
        method: ExtractionMethod::KgTwoLiner,
    })
}

/// Fold a following weight line into a one-liner item.
pub fn fold_weight_line(ctx: &ScanContext<'_>, mut item: LineItem) -> LineItem {
    let next = item.last_line() + 1;
    match weight_continuation(ctx, next) {
        Some(WeightLine::Verified { weight, unit_price }) if item.quantity == Decimal::ONE => {
            debug!("folded weight line {} into '{}'", next, item.name);
            item.quantity = weight;
            item.unit_price = round_money(unit_price);
            item.extraction_method = ExtractionMethod::KgTwoLiner;
            attach_line(&mut item, next, ctx.lines);
        }
        Some(_) => {
            debug!("folded metadata line {} into '{}'", next, item.name);
            attach_line(&mut item, next, ctx.lines);
        }
        None => {}
    }
    item
}

enum WeightLine {
    /// Weight times unit price matches the anchor total.
    Verified { weight: Decimal, unit_price: Decimal },
    /// Weight line that does not verify but is plainly metadata.
    Metadata,
}

fn weight_continuation(ctx: &ScanContext<'_>, next: usize) -> Option<WeightLine> {
    let total = ctx.value?;
    if next >= ctx.boundary || !ctx.is_free(next) {
        return None;
    }
    let line = ctx.lines.get(next)?;
    let caps = KG_LINE.captures(&line.text)?;
    let weight = parse_number(&caps[1])?;
    let unit_price = parse_number(&caps[2])?;

    if ctx.checker.holds(weight, unit_price, total, ctx.settings().weight_tolerance) {
        Some(WeightLine::Verified { weight, unit_price })
    } else if line.is_metadata_line {
        Some(WeightLine::Metadata)
    } else {
        None
    }
}

/// Name-only line directly above a price-only anchor.
pub fn simple_two_liner(ctx: &ScanContext<'_>) -> Option<LineItem> {
    let total = ctx.value?;

    for i in ctx.above(ctx.settings().two_liner_lookback) {
        if !ctx.is_free(i) {
            break;
        }
        let line = &ctx.lines[i];
        if line.is_price_candidate || (line.is_soft_price && !line.is_noise) {
            break;
        }
        if line.is_noise {
            continue;
        }
        if line.is_text_candidate {
            return ctx.build(ItemCandidate::single(
                line.text.clone(),
                total,
                ctx.anchor_line().tax_code,
                vec![i, ctx.anchor],
                ExtractionMethod::SimpleTwoLiner,
            ));
        }
    }
    None
}

/// Collapse whitespace, drop a trailing price and edge punctuation.
fn clean_name(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let cut = match NAME_PRICE_SUFFIX.find(&collapsed) {
        Some(m) => &collapsed[..m.start()],
        None => collapsed.as_str(),
    };
    cut.trim_matches(|c: char| c.is_whitespace() || ".,-+*".contains(c))
        .to_string()
}

/// Short names made of tax letters and fragments ("A B", "B & 7%").
fn is_stray_tax_fragment(name: &str) -> bool {
    if name.chars().count() >= 10 {
        return false;
    }
    let tokens: Vec<&str> = name
        .split_whitespace()
        .filter(|t| *t != "&" && !is_tax_letter(t))
        .collect();
    tokens.len() <= 3 && tokens.iter().all(|t| t.chars().count() < 5)
}

fn is_tax_letter(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some('A'..='G'), None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Line;
    use crate::receipt::context::LineAnalyzer;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn analyze(texts: &[&str]) -> Vec<ContextLine> {
        let analyzer = LineAnalyzer::new(RcptConfig::default());
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| analyzer.analyze(&Line::from_text(t), i, i))
            .collect()
    }

    fn run(strategy: Strategy, texts: &[&str], anchor: usize) -> Option<LineItem> {
        let lines = analyze(texts);
        let config = RcptConfig::default();
        let consumed = HashSet::new();
        let ctx = ScanContext::new(&lines, anchor, &consumed, lines.len(), false, &config);
        strategy(&ctx)
    }

    #[test]
    fn test_one_liner_with_inline_math() {
        let item = run(one_liner, &["Fairtrade Rosen 2,99 x 4 11,96 A"], 0).unwrap();
        assert_eq!(item.name, "Fairtrade Rosen");
        assert_eq!(item.unit_price, dec!(2.99));
        assert_eq!(item.quantity, dec!(4));
        assert_eq!(item.total, dec!(11.96));
        assert_eq!(item.extraction_method, ExtractionMethod::OneLiner);
    }

    #[test]
    fn test_one_liner_plain() {
        let item = run(one_liner, &["Zaziki 1,79 A"], 0).unwrap();
        assert_eq!(item.name, "Zaziki");
        assert_eq!(item.quantity, dec!(1));
        assert_eq!(item.tax_code, Some(TaxCode::Letter('A')));
    }

    #[test]
    fn test_staircase() {
        let texts = ["Wasser medium", "30", "0,29 x", "8,70 B"];
        let item = run(staircase, &texts, 3).unwrap();
        assert_eq!(item.name, "Wasser medium");
        assert_eq!(item.quantity, dec!(30));
        assert_eq!(item.unit_price, dec!(0.29));
        assert_eq!(item.total, dec!(8.70));
        assert_eq!(item.source_line_indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_staircase_rejects_wrong_product() {
        let texts = ["Wasser medium", "30", "0,29 x", "9,70 B"];
        assert!(run(staircase, &texts, 3).is_none());
    }

    #[test]
    fn test_math_hybrid() {
        let item = run(math_hybrid, &["Gurken 0,95 x 2", "1,90 A"], 1).unwrap();
        assert_eq!(item.name, "Gurken");
        assert_eq!(item.quantity, dec!(2));
        assert_eq!(item.source_line_indices, vec![0, 1]);
        assert_eq!(item.extraction_method, ExtractionMethod::MathHybrid);
    }

    #[test]
    fn test_math_hybrid_borrows_name_from_above() {
        let item = run(math_hybrid, &["Joghurt Natur", "0,49 x 3", "1,47 A"], 2).unwrap();
        assert_eq!(item.name, "Joghurt Natur");
        assert_eq!(item.source_line_indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_kg_two_liner() {
        let item = run(kg_two_liner, &["Bananen 1,72 A", "1,234 kg x 1,39 EUR/kg"], 0).unwrap();
        assert_eq!(item.name, "Bananen");
        assert_eq!(item.quantity, dec!(1.234));
        assert_eq!(item.unit_price, dec!(1.39));
        assert_eq!(item.extraction_method, ExtractionMethod::KgTwoLiner);
    }

    #[test]
    fn test_simple_two_liner_and_competing_price() {
        let item = run(simple_two_liner, &["Vollkornbrot", "2,49 B"], 1).unwrap();
        assert_eq!(item.name, "Vollkornbrot");
        assert_eq!(item.source_line_indices, vec![0, 1]);

        assert!(run(simple_two_liner, &["Milch 1,19 A", "2,49 B"], 1).is_none());
    }

    #[test]
    fn test_collect_upwards_order() {
        let lines = analyze(&["Wasser medium", "30", "0,29 x", "8,70 B"]);
        let config = RcptConfig::default();
        let consumed = HashSet::new();
        let ctx = ScanContext::new(&lines, 3, &consumed, lines.len(), false, &config);
        let item = collect_upwards(&ctx).unwrap();
        assert_eq!(item.extraction_method, ExtractionMethod::Staircase);
    }

    #[test]
    fn test_recovery_value() {
        let lines = analyze(&["Butter 1,9"]);
        let config = RcptConfig::default();
        let consumed = HashSet::new();
        let ctx = ScanContext::new(&lines, 0, &consumed, 1, true, &config);
        assert_eq!(ctx.value, Some(dec!(1.90)));
        let item = one_liner(&ctx).unwrap();
        assert_eq!(item.name, "Butter");
        assert_eq!(item.total, dec!(1.90));
    }

    #[test]
    fn test_name_cleanup_and_rejections() {
        assert_eq!(clean_name("  Milch   3,5%  - "), "Milch 3,5%");
        assert_eq!(clean_name("Brot 2,49"), "Brot");
        assert!(is_stray_tax_fragment("A B"));
        assert!(is_stray_tax_fragment("B & x"));
        assert!(!is_stray_tax_fragment("Zaziki"));

        assert!(run(one_liner, &["Summe 12,00 A"], 0).is_none());
        assert!(run(one_liner, &["12,00 A"], 0).is_none());
    }
}
