//! Receipt line-item and discount records.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tax code printed next to a receipt line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TaxCode {
    /// Tax class letter (A-G).
    Letter(char),
    /// Explicit percentage (e.g. `19%`).
    Percent(u8),
}

impl fmt::Display for TaxCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxCode::Letter(c) => write!(f, "{c}"),
            TaxCode::Percent(p) => write!(f, "{p}%"),
        }
    }
}

impl FromStr for TaxCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(pct) = s.strip_suffix('%') {
            return pct
                .trim()
                .parse::<u8>()
                .map(TaxCode::Percent)
                .map_err(|_| format!("invalid tax percentage: '{s}'"));
        }

        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if ('A'..='G').contains(&c.to_ascii_uppercase()) => {
                Ok(TaxCode::Letter(c.to_ascii_uppercase()))
            }
            _ => Err(format!("invalid tax code: '{s}'")),
        }
    }
}

impl TryFrom<String> for TaxCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaxCode> for String {
    fn from(code: TaxCode) -> Self {
        code.to_string()
    }
}

/// How a line item was reconstructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    /// Name and price on one line, optionally with an inline `price x qty`.
    OneLiner,
    /// `price x qty` line verified against a total on the anchor line below.
    MathHybrid,
    /// Quantity, unit price and name spread over several lines above the anchor.
    Staircase,
    /// Anchor followed by a `weight unit x unit_price` line.
    KgTwoLiner,
    /// Name line directly above a price-only anchor.
    SimpleTwoLiner,
    /// Unattached discount emitted as its own negative item.
    DiscountOnly,
}

impl ExtractionMethod {
    /// Weight-based methods verify with the looser tolerance.
    pub fn is_weight_based(&self) -> bool {
        matches!(self, ExtractionMethod::KgTwoLiner)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::OneLiner => "one-liner",
            ExtractionMethod::MathHybrid => "math-hybrid",
            ExtractionMethod::Staircase => "staircase",
            ExtractionMethod::KgTwoLiner => "kg-two-liner",
            ExtractionMethod::SimpleTwoLiner => "simple-two-liner",
            ExtractionMethod::DiscountOnly => "discount-only",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single purchased item reconstructed from one or more receipt lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product name.
    pub name: String,

    /// Price per unit (per kg for weighed goods).
    pub unit_price: Decimal,

    /// Quantity or weight.
    pub quantity: Decimal,

    /// Line total as printed.
    pub total: Decimal,

    /// Discount attached from the line below (always non-negative).
    #[serde(default)]
    pub discount: Decimal,

    /// Tax code printed on the anchor line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_code: Option<TaxCode>,

    /// Indices into the post-split line sequence, ascending.
    pub source_line_indices: Vec<usize>,

    /// Indices of the OCR lines these came from, ascending and unique.
    pub origin_line_indices: Vec<usize>,

    /// Strategy that produced the item.
    pub extraction_method: ExtractionMethod,
}

impl LineItem {
    /// Smallest source line index, used to restore receipt order.
    pub fn first_line(&self) -> usize {
        self.source_line_indices.iter().copied().min().unwrap_or(usize::MAX)
    }

    /// Largest source line index.
    pub fn last_line(&self) -> usize {
        self.source_line_indices.iter().copied().max().unwrap_or(0)
    }

    /// Amount actually paid for this line.
    pub fn net_total(&self) -> Decimal {
        self.total - self.discount
    }

    pub fn is_discount(&self) -> bool {
        self.extraction_method == ExtractionMethod::DiscountOnly
    }
}

/// Kind of a discount line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    /// Discount with no purchase seen before it.
    Inline,
    /// Discount printed after the receipt total.
    Summary,
    /// Discount reducing a preceding purchase.
    ItemDiscount,
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountKind::Inline => write!(f, "INLINE"),
            DiscountKind::Summary => write!(f, "SUMMARY"),
            DiscountKind::ItemDiscount => write!(f, "ITEM_DISCOUNT"),
        }
    }
}

/// A discount found by the standalone discount extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountItem {
    /// Label of the discount (e.g. "Preisvorteil", "RABATT 20%").
    pub name: String,

    /// Discount amount, always positive.
    pub amount: Decimal,

    pub kind: DiscountKind,

    /// Name of the purchase the discount most likely reduces.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_item: Option<String>,

    /// Zero-based line index in the scanned text.
    pub source_line_index: usize,
}

/// Result of scanning a receipt text for discounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscountExtractionResult {
    pub discounts: Vec<DiscountItem>,
    pub total_discount: Decimal,
    pub discount_count: usize,
}

/// Store a receipt was issued by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub name: String,
    /// Set when the name matched the known-brand table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tax_code_parse_and_display() {
        assert_eq!("a".parse::<TaxCode>().unwrap(), TaxCode::Letter('A'));
        assert_eq!("19%".parse::<TaxCode>().unwrap(), TaxCode::Percent(19));
        assert_eq!(TaxCode::Percent(7).to_string(), "7%");
        assert!("H".parse::<TaxCode>().is_err());
        assert!("AB".parse::<TaxCode>().is_err());
    }

    #[test]
    fn test_tax_code_serde_as_string() {
        let json = serde_json::to_string(&TaxCode::Letter('B')).unwrap();
        assert_eq!(json, "\"B\"");
        let back: TaxCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TaxCode::Letter('B'));
    }

    #[test]
    fn test_extraction_method_serde() {
        let json = serde_json::to_string(&ExtractionMethod::KgTwoLiner).unwrap();
        assert_eq!(json, "\"kg-two-liner\"");
        assert!(ExtractionMethod::KgTwoLiner.is_weight_based());
        assert!(!ExtractionMethod::Staircase.is_weight_based());
    }

    #[test]
    fn test_discount_kind_display() {
        assert_eq!(DiscountKind::ItemDiscount.to_string(), "ITEM_DISCOUNT");
        let json = serde_json::to_string(&DiscountKind::ItemDiscount).unwrap();
        assert_eq!(json, "\"ITEM_DISCOUNT\"");
    }
}
