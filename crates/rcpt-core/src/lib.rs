//! Core library for receipt line-item extraction from noisy OCR output.
//!
//! This crate provides:
//! - OCR document model (words with horizontal geometry, lines)
//! - Atomic parsers for prices, tax codes, quantities and OCR repairs
//! - Line splitting, analysis and classification
//! - Phased anchor-based item extraction with arithmetic verification
//! - Discount detection, quantity-line marking and receipt totals
//! - Locale detection, transaction date and store metadata

pub mod error;
pub mod models;
pub mod receipt;

pub use error::{DocumentError, RcptError, Result};
pub use models::{
    DiscountExtractionResult, DiscountItem, DiscountKind, ExtractionConfig, ExtractionMethod,
    KeywordTables, Line, LineItem, LocaleConfig, OcrDocument, RcptConfig, StoreInfo, TaxCode,
    Word,
};
pub use receipt::{
    DiscountExtractor, ItemExtractor, LineAnalyzer, LineClassifier, LineSplitter, LineType,
    LocaleDetector, LocaleMatch, QuantityMarker, ReceiptExtractor, ReceiptParser, ReceiptResult,
};
