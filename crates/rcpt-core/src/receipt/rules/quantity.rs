//! Quantity and unit price extraction.

use rust_decimal::Decimal;

use super::patterns::{COUNT_TIMES_PRICE, MATH_PATTERN, QTY_TOKEN, WEIGHT_TIMES_PRICE};
use super::price::parse_amount;

/// Quantity found on a line, with the unit price when it is printed next to it.
#[derive(Debug, Clone, PartialEq)]
pub struct QtyMatch {
    pub quantity: Decimal,
    pub unit_price: Option<Decimal>,
    pub raw: String,
}

pub struct QuantityParser;

impl QuantityParser {
    pub fn new() -> Self {
        Self
    }

    /// Tries, in order: weight x price, count x price, price x count, a bare count.
    pub fn parse(&self, text: &str) -> Option<QtyMatch> {
        if let Some(caps) = WEIGHT_TIMES_PRICE.captures(text) {
            if let (Some(quantity), Some(unit)) = (parse_number(&caps[1]), parse_amount(&caps[2])) {
                return Some(QtyMatch {
                    quantity,
                    unit_price: Some(unit),
                    raw: caps[0].to_string(),
                });
            }
        }

        if let Some(caps) = COUNT_TIMES_PRICE.captures(text) {
            if let (Some(quantity), Some(unit)) = (parse_number(&caps[1]), parse_amount(&caps[2])) {
                return Some(QtyMatch {
                    quantity,
                    unit_price: Some(unit),
                    raw: caps[0].trim().to_string(),
                });
            }
        }

        if let Some(caps) = MATH_PATTERN.captures(text) {
            if let (Some(unit), Some(quantity)) = (parse_amount(&caps[1]), parse_number(&caps[2])) {
                return Some(QtyMatch {
                    quantity,
                    unit_price: Some(unit),
                    raw: caps[0].to_string(),
                });
            }
        }

        self.parse_count(text).map(|quantity| QtyMatch {
            quantity,
            unit_price: None,
            raw: text.trim().to_string(),
        })
    }

    /// A bare count token such as `x 4`, `4x` or `4 Stk`.
    pub fn parse_count(&self, text: &str) -> Option<Decimal> {
        let caps = QTY_TOKEN.captures(text)?;
        let digits = caps.get(1).or_else(|| caps.get(2))?;
        parse_number(digits.as_str())
    }
}

impl Default for QuantityParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a quantity keeping its full precision (weights carry three decimals).
pub fn parse_number(raw: &str) -> Option<Decimal> {
    raw.trim().replace(',', ".").parse::<Decimal>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_weight_times_price() {
        let parser = QuantityParser::new();
        let m = parser.parse("1,207 kg x 8,99").unwrap();
        assert_eq!(m.quantity, dec!(1.207));
        assert_eq!(m.unit_price, Some(dec!(8.99)));
    }

    #[test]
    fn test_count_times_price() {
        let parser = QuantityParser::new();
        let m = parser.parse("2 x 0,99").unwrap();
        assert_eq!(m.quantity, dec!(2));
        assert_eq!(m.unit_price, Some(dec!(0.99)));
    }

    #[test]
    fn test_price_times_count() {
        let parser = QuantityParser::new();
        let m = parser.parse("Fairtrade Rosen 2,99 x 4 11,96 A").unwrap();
        assert_eq!(m.quantity, dec!(4));
        assert_eq!(m.unit_price, Some(dec!(2.99)));
    }

    #[test]
    fn test_bare_count() {
        let parser = QuantityParser::new();
        assert_eq!(parser.parse_count("x 30"), Some(dec!(30)));
        assert_eq!(parser.parse_count("6 Stk"), Some(dec!(6)));
        assert_eq!(parser.parse_count("Milch"), None);
        assert_eq!(parser.parse("Milch 1,19"), None);
    }
}
