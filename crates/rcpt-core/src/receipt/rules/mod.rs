//! Single-purpose extractors and fixers for receipt lines.

pub mod cyrillic;
pub mod dates;
pub mod decimal;
pub mod ghost_suffix;
pub mod keywords;
pub mod math;
pub mod patterns;
pub mod price;
pub mod quantity;
pub mod store;
pub mod tax;
pub mod total;

pub use cyrillic::{CyrillicFixResult, CyrillicFixer};
pub use dates::DateExtractor;
pub use decimal::{DecimalFixResult, DecimalFixer};
pub use ghost_suffix::{GhostSuffixFixer, GhostSuffixResult};
pub use keywords::contains_keyword;
pub use math::{round_money, MathChecker, MathResult};
pub use price::{is_date_or_time, parse_amount, PriceParser};
pub use quantity::{QtyMatch, QuantityParser};
pub use store::StoreDetector;
pub use tax::TaxParser;
pub use total::TotalExtractor;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Byte range in the source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    pub fn start(&self) -> usize {
        self.position.map(|(s, _)| s).unwrap_or(0)
    }

    pub fn end(&self) -> usize {
        self.position.map(|(_, e)| e).unwrap_or(0)
    }
}
