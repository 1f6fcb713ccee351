//! Units of measure.
//!
//! Units are grouped in categories (weight, volume, unit...). Conversion is
//! linear and only defined between units of the same category.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use dishcost_core::{DomainError, DomainResult, Entity, typed_id};

typed_id!(
    /// Unit-of-measure category identifier.
    UomCategoryId
);

typed_id!(
    /// Unit-of-measure identifier.
    UomId
);

/// Digits used to display quantities when the unit is unknown.
pub const DEFAULT_UNIT_DIGITS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UomCategory {
    pub id: UomCategoryId,
    pub name: String,
}

impl Entity for UomCategory {
    type Id = UomCategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A unit of measure.
///
/// `factor` is the size of one of this unit expressed in the category's
/// reference unit (kilogram = 1, gram = 0.001 in a weight category whose
/// reference is the kilogram).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uom {
    pub id: UomId,
    pub name: String,
    pub symbol: String,
    pub category: UomCategoryId,
    pub factor: Decimal,
    /// Display precision for quantities in this unit.
    pub digits: u32,
}

impl Entity for Uom {
    type Id = UomId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Uom {
    pub fn new(
        id: UomId,
        name: impl Into<String>,
        symbol: impl Into<String>,
        category: UomCategoryId,
        factor: Decimal,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            symbol: symbol.into(),
            category,
            factor,
            digits: DEFAULT_UNIT_DIGITS,
        }
    }

    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    /// Round a quantity expressed in this unit to its display precision.
    pub fn round_qty(&self, qty: Decimal) -> Decimal {
        qty.round_dp_with_strategy(self.digits, RoundingStrategy::MidpointNearestEven)
    }

    /// Convert `qty` expressed in `from` into `to`.
    pub fn compute_qty(from: &Uom, qty: Decimal, to: &Uom) -> DomainResult<Decimal> {
        if from.id == to.id {
            return Ok(qty);
        }
        ensure_convertible(from, to)?;
        qty.checked_mul(from.factor)
            .and_then(|v| v.checked_div(to.factor))
            .ok_or_else(|| overflow(from, to))
    }

    /// Convert a price per `from` unit into a price per `to` unit.
    pub fn compute_price(from: &Uom, price: Decimal, to: &Uom) -> DomainResult<Decimal> {
        if from.id == to.id {
            return Ok(price);
        }
        ensure_convertible(from, to)?;
        price
            .checked_mul(to.factor)
            .and_then(|v| v.checked_div(from.factor))
            .ok_or_else(|| overflow(from, to))
    }
}

fn overflow(from: &Uom, to: &Uom) -> DomainError {
    DomainError::validation(format!(
        "converting from '{}' to '{}' overflows the decimal range",
        from.name, to.name
    ))
}

fn ensure_convertible(from: &Uom, to: &Uom) -> DomainResult<()> {
    if from.category != to.category {
        return Err(DomainError::validation(format!(
            "cannot convert between '{}' and '{}': different unit categories",
            from.name, to.name
        )));
    }
    if from.factor <= Decimal::ZERO || to.factor <= Decimal::ZERO {
        return Err(DomainError::validation("unit factor must be positive"));
    }
    Ok(())
}
