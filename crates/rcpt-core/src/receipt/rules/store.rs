//! Store detection from the receipt header.

use tracing::{debug, trace};

use crate::models::{KeywordTables, StoreInfo};

/// Header lines searched for a brand first.
const HEADER_LINES: usize = 8;

/// Lines considered when no brand is found.
const FALLBACK_LINES: usize = 5;

const MIN_NAME_LEN: usize = 3;

/// Finds the issuing store: a known brand in the header, then anywhere, then
/// the first plain text line of the header.
pub struct StoreDetector {
    keywords: KeywordTables,
}

impl StoreDetector {
    pub fn new(keywords: KeywordTables) -> Self {
        Self { keywords }
    }

    pub fn detect<S: AsRef<str>>(&self, lines: &[S]) -> Option<StoreInfo> {
        let header = &lines[..lines.len().min(HEADER_LINES)];

        if let Some(brand) = self.find_brand(header) {
            return Some(self.branded(brand, 0.95));
        }
        if let Some(brand) = self.find_brand(lines) {
            return Some(self.branded(brand, 0.85));
        }

        let fallback = lines
            .iter()
            .take(FALLBACK_LINES)
            .map(|l| l.as_ref().trim())
            .find(|l| self.is_plain_name(l))?;
        debug!("store name from header line '{}'", fallback);
        Some(StoreInfo {
            name: fallback.to_string(),
            brand: None,
            confidence: 0.5,
        })
    }

    fn find_brand<S: AsRef<str>>(&self, lines: &[S]) -> Option<&str> {
        lines.iter().find_map(|line| {
            let lower = line.as_ref().to_lowercase();
            let words: Vec<&str> = lower.split(|c: char| !c.is_alphanumeric()).collect();
            self.keywords
                .stores
                .iter()
                .find(|brand| words.contains(&brand.as_str()))
                .map(String::as_str)
        })
    }

    fn branded(&self, brand: &str, confidence: f32) -> StoreInfo {
        debug!("store brand '{}' ({:.2})", brand, confidence);
        let name = brand.to_uppercase();
        StoreInfo {
            brand: Some(name.clone()),
            name,
            confidence,
        }
    }

    /// Letters, no digits, no price or contact markers.
    fn is_plain_name(&self, line: &str) -> bool {
        let plain = line.chars().count() > MIN_NAME_LEN
            && line.chars().any(char::is_alphabetic)
            && !line.chars().any(|c| c.is_ascii_digit() || "*@%€".contains(c))
            && !line.starts_with('+')
            && !self.keywords.is_noise(line);
        if !plain {
            trace!("'{}' is not a store name", line);
        }
        plain
    }
}

impl Default for StoreDetector {
    fn default() -> Self {
        Self::new(KeywordTables::default())
    }
}
