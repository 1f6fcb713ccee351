//! Supplier taxes and the tax computation collaborator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dishcost_core::{DomainError, DomainResult, Entity, typed_id};

typed_id!(
    /// Tax identifier.
    TaxId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum TaxRate {
    /// Percentage of the base (`21` means 21%).
    Percentage(Decimal),
    /// Fixed amount per unit of quantity.
    Fixed(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tax {
    pub id: TaxId,
    pub name: String,
    pub description: String,
    pub legal_notice: Option<String>,
    pub rate: TaxRate,
    pub invoice_account: Option<String>,
    pub credit_note_account: Option<String>,
}

impl Entity for Tax {
    type Id = TaxId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Tax {
    pub fn percentage(id: TaxId, name: impl Into<String>, rate: Decimal) -> Self {
        let name = name.into();
        Self {
            id,
            description: name.clone(),
            name,
            legal_notice: None,
            rate: TaxRate::Percentage(rate),
            invoice_account: None,
            credit_note_account: None,
        }
    }

    pub fn fixed(id: TaxId, name: impl Into<String>, amount: Decimal) -> Self {
        let name = name.into();
        Self {
            id,
            description: name.clone(),
            name,
            legal_notice: None,
            rate: TaxRate::Fixed(amount),
            invoice_account: None,
            credit_note_account: None,
        }
    }

    fn amount_for(&self, base: Decimal, quantity: Decimal) -> Option<Decimal> {
        match self.rate {
            TaxRate::Percentage(rate) => base.checked_mul(rate)?.checked_div(Decimal::ONE_HUNDRED),
            TaxRate::Fixed(amount) => amount.checked_mul(quantity),
        }
    }
}

/// One computed tax line (unrounded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxLine {
    pub tax: TaxId,
    pub description: String,
    pub legal_notice: Option<String>,
    pub invoice_account: Option<String>,
    pub credit_note_account: Option<String>,
    pub base: Decimal,
    pub amount: Decimal,
}

impl TaxLine {
    /// Account the line books to: invoice account for non-negative bases,
    /// credit-note account otherwise.
    pub fn account(&self) -> Option<&str> {
        if self.base >= Decimal::ZERO {
            self.invoice_account.as_deref()
        } else {
            self.credit_note_account.as_deref()
        }
    }
}

/// Compute the tax lines of `quantity` units at `price_unit`.
///
/// Fails when the base or an amount leaves the decimal range.
pub fn compute_taxes(taxes: &[Tax], price_unit: Decimal, quantity: Decimal) -> DomainResult<Vec<TaxLine>> {
    let base = price_unit
        .checked_mul(quantity)
        .ok_or_else(|| DomainError::validation("tax base overflows the decimal range"))?;
    taxes
        .iter()
        .map(|tax| {
            let amount = tax.amount_for(base, quantity).ok_or_else(|| {
                DomainError::validation(format!("amount of tax '{}' overflows the decimal range", tax.name))
            })?;
            Ok(TaxLine {
                tax: tax.id,
                description: tax.description.clone(),
                legal_notice: tax.legal_notice.clone(),
                invoice_account: tax.invoice_account.clone(),
                credit_note_account: tax.credit_note_account.clone(),
                base,
                amount,
            })
        })
        .collect()
}
