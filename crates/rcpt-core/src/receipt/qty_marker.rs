//! Rewrites `price x qty total [tax]` lines into an explicit tagged form.
//!
//! `Wasser medium 0,29 x 30 8,70 B` becomes
//! `[QTY_LINE] Wasser medium | qty=30 | price=0.29 | TOTAL=8.70 | B`.

use tracing::{debug, info};

use super::discount::QTY_LINE_TAG;
use super::rules::patterns::QTY_LINE;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QtyMarkerResult {
    pub marked_text: String,
    pub lines_marked: usize,
    /// `(original, marked)` pairs.
    pub marked_lines: Vec<(String, String)>,
}

pub struct QuantityMarker;

impl QuantityMarker {
    pub fn new() -> Self {
        Self
    }

    pub fn process(&self, text: &str) -> QtyMarkerResult {
        let mut marked_lines = Vec::new();

        let lines: Vec<String> = text
            .split('\n')
            .map(|line| match self.mark_line(line) {
                Some(marked) => {
                    debug!("marked '{}' -> '{}'", line, marked);
                    marked_lines.push((line.to_string(), marked.clone()));
                    marked
                }
                None => line.to_string(),
            })
            .collect();

        if !marked_lines.is_empty() {
            info!("marked {} quantity lines", marked_lines.len());
        }

        QtyMarkerResult {
            marked_text: lines.join("\n"),
            lines_marked: marked_lines.len(),
            marked_lines,
        }
    }

    /// Tagged form of one line, or `None` when it does not match.
    pub fn mark_line(&self, line: &str) -> Option<String> {
        if line.trim_start().starts_with(QTY_LINE_TAG) {
            return None;
        }

        let caps = QTY_LINE.captures(line)?;
        let start = caps.get(0)?.start();
        let name = line[..start].trim();
        let price = caps[1].replace(',', ".");
        let qty = &caps[2];
        let total = caps[3].replace(',', ".");
        let tax = caps.get(4).map(|m| m.as_str()).unwrap_or("");

        let marked = format!(
            "{} {} | qty={} | price={} | TOTAL={} | {}",
            QTY_LINE_TAG, name, qty, price, total, tax
        );
        Some(marked.trim().to_string())
    }
}

impl Default for QuantityMarker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_marks_quantity_line() {
        let marker = QuantityMarker::new();
        let result = marker.process("Wasser medium 0,29 x 30 8,70 B");
        assert_eq!(
            result.marked_text,
            "[QTY_LINE] Wasser medium | qty=30 | price=0.29 | TOTAL=8.70 | B"
        );
        assert_eq!(result.lines_marked, 1);
    }

    #[test]
    fn test_leaves_other_lines_untouched() {
        let marker = QuantityMarker::new();
        let text = "Milch 1,19 A\nGurken 0,95 x 2 1,90\nzu zahlen 3,09";
        let result = marker.process(text);
        assert_eq!(result.lines_marked, 1);
        assert_eq!(
            result.marked_text,
            "Milch 1,19 A\n[QTY_LINE] Gurken | qty=2 | price=0.95 | TOTAL=1.90 |\nzu zahlen 3,09"
        );
    }

    #[test]
    fn test_idempotent() {
        let marker = QuantityMarker::new();
        let once = marker.process("Rosen 2,99 x 4 11,96 A\nBrot 2,49 A").marked_text;
        let twice = marker.process(&once);
        assert_eq!(twice.marked_text, once);
        assert_eq!(twice.lines_marked, 0);
    }
}
