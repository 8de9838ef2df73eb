//! Arithmetic verification of `quantity x unit_price = total`.

use rust_decimal::Decimal;

/// Round to cents and pin the scale so amounts print as `1.90`, not `1.9`.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    rounded
}

/// Outcome of an arithmetic check.
#[derive(Debug, Clone, PartialEq)]
pub struct MathResult {
    pub is_valid: bool,
    /// Absolute deviation between expected and printed total.
    pub difference: Decimal,
    /// `quantity x unit_price` rounded to cents.
    pub expected_total: Option<Decimal>,
}

impl MathResult {
    fn invalid() -> Self {
        Self {
            is_valid: false,
            difference: Decimal::ZERO,
            expected_total: None,
        }
    }
}

pub struct MathChecker;

impl MathChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn verify(
        &self,
        quantity: Decimal,
        unit_price: Decimal,
        total: Decimal,
        tolerance: Decimal,
    ) -> MathResult {
        let Some(product) = quantity.checked_mul(unit_price) else {
            return MathResult::invalid();
        };

        let expected = round_money(product);
        let difference = (expected - round_money(total)).abs();

        MathResult {
            is_valid: difference <= tolerance,
            difference,
            expected_total: Some(expected),
        }
    }

    /// Shorthand for `verify(..).is_valid`.
    pub fn holds(&self, quantity: Decimal, unit_price: Decimal, total: Decimal, tolerance: Decimal) -> bool {
        self.verify(quantity, unit_price, total, tolerance).is_valid
    }
}

impl Default for MathChecker {
    fn default() -> Self {
        Self::new()
    }
}
