//! Supplier invoice history used by the "last cost" costing basis.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dishcost_core::CompanyId;

use crate::product::ProductId;
use crate::uom::UomId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceState {
    Draft,
    Validated,
    Posted,
    Paid,
    Cancelled,
}

impl InvoiceState {
    /// Whether the invoice is booked (its prices count as real costs).
    pub fn is_booked(self) -> bool {
        matches!(self, InvoiceState::Posted | InvoiceState::Paid)
    }
}

/// A product line of a supplier invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseInvoiceLine {
    pub company: CompanyId,
    pub product: ProductId,
    pub unit: UomId,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub state: InvoiceState,
    pub invoice_date: NaiveDate,
}

impl PurchaseInvoiceLine {
    /// Whether this line can serve as the last cost of its product for
    /// `company` at `as_of`.
    pub fn qualifies(&self, company: CompanyId, as_of: Option<NaiveDate>) -> bool {
        self.company == company
            && self.state.is_booked()
            && self.unit_price > Decimal::ZERO
            && as_of.is_none_or(|date| self.invoice_date <= date)
    }
}
