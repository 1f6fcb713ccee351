//! Supplier tax roll-up for a component's cost basis.

use rust_decimal::Decimal;

use dishcost_core::Currency;
use dishcost_products::{Tax, TaxId, compute_taxes};

use crate::error::{CostError, checked_sum};

/// Identity of an aggregated tax line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaxKey {
    pub description: String,
    pub legal_notice: Option<String>,
    pub account: Option<String>,
    pub tax: TaxId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedTaxLine {
    pub key: TaxKey,
    pub base: Decimal,
    pub amount: Decimal,
}

/// Tax lines for one unit at `cost_basis`, rounded to `currency` when known and
/// merged by [`TaxKey`] (bases and amounts of duplicate keys are summed).
/// First-seen order is kept.
pub fn aggregate_tax_lines(
    taxes: &[Tax],
    cost_basis: Decimal,
    currency: Option<&Currency>,
) -> Result<Vec<AggregatedTaxLine>, CostError> {
    let mut out: Vec<AggregatedTaxLine> = Vec::new();

    for line in compute_taxes(taxes, cost_basis, Decimal::ONE)? {
        let (base, amount) = match currency {
            Some(currency) => (currency.round(line.base), currency.round(line.amount)),
            None => (line.base, line.amount),
        };
        let key = TaxKey {
            description: line.description.clone(),
            legal_notice: line.legal_notice.clone(),
            account: line.account().map(str::to_owned),
            tax: line.tax,
        };

        match out.iter_mut().find(|existing| existing.key == key) {
            Some(existing) => {
                existing.base = checked_sum([existing.base, base], "tax base")?;
                existing.amount = checked_sum([existing.amount, amount], "tax amount")?;
            }
            None => out.push(AggregatedTaxLine { key, base, amount }),
        }
    }

    Ok(out)
}

/// Total supplier tax on one unit at `cost_basis`.
///
/// Sums every aggregated line. Returning only the last line's amount would
/// drop all but one tax when a product carries several.
pub fn supplier_tax_amount(
    taxes: &[Tax],
    cost_basis: Decimal,
    currency: Option<&Currency>,
) -> Result<Decimal, CostError> {
    let lines = aggregate_tax_lines(taxes, cost_basis, currency)?;
    checked_sum(lines.iter().map(|line| line.amount), "tax amount")
}
