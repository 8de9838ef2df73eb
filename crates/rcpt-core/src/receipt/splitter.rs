//! Pre-pass that separates two logical rows OCR merged into one line.
//!
//! Strategies in order: math pair, word layers, column gap. Every produced
//! line keeps the index of the OCR line it came from.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{ExtractionConfig, Line, Word};

use super::context::{ContextLine, LineAnalyzer};
use super::rules::patterns::{MATH_PATTERN, PRICE, SPLIT_QTY};
use super::rules::quantity::parse_number;
use super::rules::{parse_amount, MathChecker};

/// Characters around a price pair searched for a `x qty` token.
const QTY_WINDOW: usize = 10;

/// Overlap ratio (of the narrower word) marking two words as stacked.
const LAYER_OVERLAP: f32 = 0.3;

/// Overlap ratio marking two price words as stacked.
const PRICE_LAYER_OVERLAP: f32 = 0.7;

pub struct LineSplitter {
    tolerance: Decimal,
    min_column_gap: f32,
    checker: MathChecker,
}

impl LineSplitter {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            tolerance: config.split_tolerance,
            min_column_gap: config.min_column_gap,
            checker: MathChecker::new(),
        }
    }

    /// Split merged lines; returns the processed lines and, per processed
    /// line, the index of its OCR line.
    pub fn split(&self, analyzer: &LineAnalyzer, lines: Vec<Line>) -> (Vec<Line>, Vec<usize>) {
        let mut processed = Vec::with_capacity(lines.len());
        let mut provenance = Vec::with_capacity(lines.len());

        for (idx, line) in lines.into_iter().enumerate() {
            let ctx = analyzer.analyze(&line, idx, idx);
            if ctx.price_ranges.len() < 2 || self.is_clean(&ctx) {
                processed.push(line);
                provenance.push(idx);
                continue;
            }

            let parts = self
                .split_by_math(&line, &ctx)
                .or_else(|| self.split_by_layers(analyzer, &line))
                .or_else(|| self.split_by_columns(analyzer, &line));

            match parts {
                Some((first, second)) => {
                    debug!("split line {} '{}' -> '{}' | '{}'", idx, ctx.text, first.text(), second.text());
                    processed.push(first);
                    provenance.push(idx);
                    processed.push(second);
                    provenance.push(idx);
                }
                None => {
                    processed.push(line);
                    provenance.push(idx);
                }
            }
        }

        (processed, provenance)
    }

    /// A coherent `price x qty total` row, or a full item with no second
    /// name between its prices.
    fn is_clean(&self, ctx: &ContextLine) -> bool {
        if self.math_is_coherent(ctx) {
            return true;
        }

        let (Some(first), Some(last)) = (ctx.price_ranges.first(), ctx.price_ranges.last()) else {
            return true;
        };
        let between = &ctx.text[first.end()..last.start()];
        let second_name = between
            .split_whitespace()
            .any(|token| token.chars().filter(|c| c.is_alphabetic()).count() >= 2);

        ctx.is_full_item && !second_name
    }

    fn math_is_coherent(&self, ctx: &ContextLine) -> bool {
        let (Some(caps), Some(total)) = (MATH_PATTERN.captures(&ctx.text), ctx.parsed_value) else {
            return false;
        };
        match (parse_amount(&caps[1]), parse_number(&caps[2])) {
            (Some(unit), Some(qty)) => self.checker.holds(qty, unit, total, self.tolerance),
            _ => false,
        }
    }

    /// Split after the word holding `p2` when some `p1 x qty = p2` pair exists.
    fn split_by_math(&self, line: &Line, ctx: &ContextLine) -> Option<(Line, Line)> {
        let words = sorted_by_left(line);
        let text = ctx.text.as_str();
        let ranges = &ctx.price_ranges;

        for i in 0..ranges.len() {
            for j in (i + 1)..ranges.len() {
                let (p1, p2) = (&ranges[i], &ranges[j]);
                if p2.value <= Decimal::ZERO {
                    continue;
                }

                let from = floor_boundary(text, p1.end().saturating_sub(QTY_WINDOW));
                let to = ceil_boundary(text, p2.start() + QTY_WINDOW);
                let Some(qty) = SPLIT_QTY
                    .captures(&text[from..to])
                    .and_then(|caps| parse_number(&caps[1]))
                else {
                    continue;
                };

                if !self.checker.holds(qty, p1.value, p2.value, self.tolerance) {
                    continue;
                }

                let after = words.iter().position(|w| w.text.contains(&p1.source)).map_or(0, |k| k + 1);
                let split_at = words
                    .iter()
                    .enumerate()
                    .skip(after)
                    .find(|(_, w)| w.text.contains(&p2.source))
                    .map(|(k, _)| k);

                if let Some(k) = split_at.filter(|&k| k + 1 < words.len()) {
                    return Some((Line::new(words[..=k].to_vec()), Line::new(words[k + 1..].to_vec())));
                }
            }
        }
        None
    }

    /// De-interleave words of two stacked rows rendered as one line.
    fn split_by_layers(&self, analyzer: &LineAnalyzer, line: &Line) -> Option<(Line, Line)> {
        let mut words = line.words.clone();
        if words.len() < 4 {
            return None;
        }
        words.sort_by(|a, b| {
            a.left
                .partial_cmp(&b.left)
                .unwrap_or(Ordering::Equal)
                .then(a.right.partial_cmp(&b.right).unwrap_or(Ordering::Equal))
        });

        let prices: Vec<&Word> = words.iter().filter(|w| PRICE.is_match(&w.text)).collect();
        let stacked_prices = prices
            .windows(2)
            .any(|p| p[0].overlap(p[1]) > p[0].width.min(p[1].width) * PRICE_LAYER_OVERLAP);

        let mut upper = Vec::new();
        let mut lower = Vec::new();
        let mut overlaps = 0;
        let mut i = 0;

        while i < words.len() {
            if let Some(next) = words.get(i + 1) {
                let current = &words[i];
                let stacked = current.overlap(next) > current.width.min(next.width) * LAYER_OVERLAP;
                if stacked || (stacked_prices && i % 2 == 0) {
                    upper.push(current.clone());
                    lower.push(next.clone());
                    overlaps += 1;
                    i += 2;
                    continue;
                }
            }
            upper.push(words[i].clone());
            i += 1;
        }

        if overlaps == 0 {
            return None;
        }

        let (first, second) = (Line::new(upper), Line::new(lower));
        (has_price(analyzer, &first) && has_price(analyzer, &second)).then_some((first, second))
    }

    /// Split at the widest gap whose halves both carry a price.
    fn split_by_columns(&self, analyzer: &LineAnalyzer, line: &Line) -> Option<(Line, Line)> {
        let words = sorted_by_left(line);

        let mut gaps: Vec<(f32, usize)> = words
            .windows(2)
            .enumerate()
            .map(|(i, pair)| (pair[0].gap_to(&pair[1]), i))
            .collect();
        gaps.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        for (gap, idx) in gaps {
            if gap < self.min_column_gap {
                break;
            }
            let first = Line::new(words[..=idx].to_vec());
            let second = Line::new(words[idx + 1..].to_vec());
            if has_price(analyzer, &first) && has_price(analyzer, &second) {
                return Some((first, second));
            }
        }
        None
    }
}

impl Default for LineSplitter {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

fn sorted_by_left(line: &Line) -> Vec<Word> {
    let mut words = line.words.clone();
    words.sort_by(|a, b| a.left.partial_cmp(&b.left).unwrap_or(Ordering::Equal));
    words
}

fn has_price(analyzer: &LineAnalyzer, line: &Line) -> bool {
    !analyzer.analyze(line, 0, 0).price_ranges.is_empty()
}

fn floor_boundary(text: &str, idx: usize) -> usize {
    let mut idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_boundary(text: &str, idx: usize) -> usize {
    let mut idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RcptConfig;
    use pretty_assertions::assert_eq;

    fn setup() -> (LineAnalyzer, LineSplitter) {
        let config = RcptConfig::default();
        (LineAnalyzer::new(config.clone()), LineSplitter::new(&config.extraction))
    }

    fn texts(lines: &[Line]) -> Vec<String> {
        lines.iter().map(Line::text).collect()
    }

    #[test]
    fn test_math_pair_split() {
        let (analyzer, splitter) = setup();
        let lines = vec![Line::from_text("Cola 0,99 x 2 1,98 Milch 1,19 A")];
        let (out, provenance) = splitter.split(&analyzer, lines);
        assert_eq!(texts(&out), vec!["Cola 0,99 x 2 1,98", "Milch 1,19 A"]);
        assert_eq!(provenance, vec![0, 0]);
    }

    #[test]
    fn test_coherent_math_row_untouched() {
        let (analyzer, splitter) = setup();
        let lines = vec![
            Line::from_text("Brot 2,49 A"),
            Line::from_text("Fairtrade Rosen 2,99 x 4 11,96 A"),
        ];
        let (out, provenance) = splitter.split(&analyzer, lines);
        assert_eq!(out.len(), 2);
        assert_eq!(provenance, vec![0, 1]);
    }

    #[test]
    fn test_layer_split() {
        let (analyzer, splitter) = setup();
        let line = Line::new(vec![
            Word::new("Milch", 0.0, 50.0),
            Word::new("Brot", 5.0, 45.0),
            Word::new("1,19", 200.0, 240.0),
            Word::new("2,49", 205.0, 245.0),
        ]);
        let (out, _) = splitter.split(&analyzer, vec![line]);
        assert_eq!(texts(&out), vec!["Milch 1,19", "Brot 2,49"]);
    }

    #[test]
    fn test_column_split() {
        let (analyzer, splitter) = setup();
        let line = Line::new(vec![
            Word::new("Milch", 0.0, 50.0),
            Word::new("1,19", 60.0, 100.0),
            Word::new("Brot", 300.0, 340.0),
            Word::new("2,49", 350.0, 390.0),
        ]);
        let (out, provenance) = splitter.split(&analyzer, vec![Line::from_text("Kasse 3"), line]);
        assert_eq!(texts(&out), vec!["Kasse 3", "Milch 1,19", "Brot 2,49"]);
        assert_eq!(provenance, vec![0, 1, 1]);
    }

    #[test]
    fn test_narrow_gaps_pass_through() {
        let (analyzer, splitter) = setup();
        let (out, _) = splitter.split(&analyzer, vec![Line::from_text("Milch 1,19 Brot 2,49")]);
        assert_eq!(texts(&out), vec!["Milch 1,19 Brot 2,49"]);
    }
}
