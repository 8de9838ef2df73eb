//! Tax code extraction.

use crate::models::TaxCode;

use super::patterns::{TAX_LETTER, TAX_PERCENT};
use super::{ExtractionMatch, FieldExtractor};

/// Finds the tax class printed at the end of an item line.
pub struct TaxParser;

impl TaxParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, text: &str) -> Option<TaxCode> {
        self.extract(text).map(|m| m.value)
    }
}

impl Default for TaxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TaxParser {
    type Output = ExtractionMatch<TaxCode>;

    /// Last standalone letter A-G; otherwise a trailing percentage.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        if let Some(letter) = self.extract_all(text).pop() {
            return Some(letter);
        }

        let caps = TAX_PERCENT.captures(text)?;
        let pct = caps.get(1)?;
        let value = pct.as_str().parse::<u8>().ok()?;
        Some(
            ExtractionMatch::new(TaxCode::Percent(value), 0.7, caps.get(0)?.as_str())
                .with_position(pct.start(), caps.get(0)?.end()),
        )
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        TAX_LETTER
            .captures_iter(text)
            .filter_map(|caps| {
                let m = caps.get(1)?;
                let letter = m.as_str().chars().next()?;
                Some(
                    ExtractionMatch::new(TaxCode::Letter(letter), 0.9, m.as_str())
                        .with_position(m.start(), m.end()),
                )
            })
            .collect()
    }
}
