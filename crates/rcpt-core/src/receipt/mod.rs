//! Receipt line-item extraction module.

pub mod classifier;
pub mod context;
pub mod discount;
pub mod extractor;
pub mod locale;
mod parser;
pub mod qty_marker;
pub mod rules;
pub mod splitter;
pub mod strategies;

pub use classifier::{LineClassifier, LineType};
pub use context::{ContextLine, LineAnalyzer};
pub use discount::{extract_discount_amount, is_discount_line, DiscountExtractor, QTY_LINE_TAG};
pub use extractor::{ExtractionOutcome, ItemExtractor, ScanState};
pub use locale::{LocaleDetector, LocaleMatch};
pub use parser::{ReceiptParser, ReceiptResult};
pub use qty_marker::{QtyMarkerResult, QuantityMarker};
pub use splitter::LineSplitter;

use crate::models::OcrDocument;

/// Trait for receipt extractors.
pub trait ReceiptExtractor {
    /// Extract line items, discounts and totals from an OCR document.
    fn extract(&self, document: &OcrDocument) -> ReceiptResult;

    /// Extract from plain receipt text.
    fn extract_from_text(&self, text: &str) -> ReceiptResult;
}
