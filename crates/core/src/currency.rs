//! Currency rounding.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// Digits used when no company currency is known.
pub const DEFAULT_CURRENCY_DIGITS: u32 = 2;

/// A currency and its decimal precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub digits: u32,
}

impl ValueObject for Currency {}

impl Currency {
    pub fn new(code: impl Into<String>, digits: u32) -> Self {
        Self {
            code: code.into(),
            digits,
        }
    }

    /// Round half-even to the currency's digit count.
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.digits, RoundingStrategy::MidpointNearestEven)
    }

    pub fn is_zero(&self, amount: Decimal) -> bool {
        self.round(amount).is_zero()
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::new("USD", DEFAULT_CURRENCY_DIGITS)
    }
}
