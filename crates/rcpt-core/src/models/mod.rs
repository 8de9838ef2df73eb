//! Data models for receipt parsing.

pub mod config;
pub mod layout;
pub mod receipt;

pub use config::{ExtractionConfig, KeywordTables, LocaleConfig, RcptConfig};
pub use layout::{Line, OcrDocument, Word};
pub use receipt::{
    DiscountExtractionResult, DiscountItem, DiscountKind, ExtractionMethod, LineItem, StoreInfo,
    TaxCode,
};
