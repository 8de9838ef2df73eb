//! Error types for the rcpt-core library.
//!
//! Extraction itself never fails: parse misses degrade to `None` and
//! rejected candidates are dropped. Errors only surface while loading
//! configuration or ingesting an OCR document.

use thiserror::Error;

/// Main error type for the rcpt library.
#[derive(Error, Debug)]
pub enum RcptError {
    /// OCR document ingestion error.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while decoding an OCR document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document is not valid JSON or does not match the expected shape.
    #[error("invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A word carries impossible geometry.
    #[error("invalid geometry in line {line}, word {word}: {reason}")]
    Geometry {
        line: usize,
        word: usize,
        reason: String,
    },

    /// Neither lines nor text were provided.
    #[error("document has no lines and no text")]
    Empty,
}

/// Result type for the rcpt library.
pub type Result<T> = std::result::Result<T, RcptError>;
