//! Component line costing: unit conversion, supplier taxes, last cost.

use rust_decimal::Decimal;

use dishcost_products::{Product, PurchaseInvoiceLine, Uom};
use dishcost_recipes::Component;

use crate::context::{CostBasis, CostContext};
use crate::error::{CostError, checked_sum};
use crate::source::{ProductCatalog, PurchaseHistory};
use crate::tax::supplier_tax_amount;

/// Cost of one `component.unit` of the component's product.
///
/// Zero when the product or unit cannot be resolved (incomplete drafts), or
/// when the last-purchase basis finds no qualifying invoice line.
pub fn component_unit_cost(
    component: &Component,
    ctx: &CostContext,
    catalog: &dyn ProductCatalog,
    purchases: Option<&dyn PurchaseHistory>,
) -> Result<Decimal, CostError> {
    let (Some(product), Some(unit)) = (
        catalog.product(component.product),
        catalog.uom(component.unit),
    ) else {
        return Ok(Decimal::ZERO);
    };

    let cost = match ctx.basis() {
        CostBasis::Standard => standard_price(&product, &unit, ctx, catalog)?,
        CostBasis::LastPurchase => match purchases {
            Some(history) => last_purchase_price(&product, &unit, ctx, catalog, history)?,
            None => None,
        },
    };
    let Some(cost) = cost else {
        return Ok(Decimal::ZERO);
    };

    if !component.include_taxes {
        return Ok(cost);
    }

    let taxes: Vec<_> = product
        .supplier_taxes()
        .iter()
        .filter_map(|id| catalog.tax(*id))
        .collect();
    let tax = supplier_tax_amount(&taxes, cost, ctx.currency())?;
    checked_sum([cost, tax], "taxed unit cost")
}

/// Company cost price of `product` converted to a price per `unit`.
fn standard_price(
    product: &Product,
    unit: &Uom,
    ctx: &CostContext,
    catalog: &dyn ProductCatalog,
) -> Result<Option<Decimal>, CostError> {
    let Some(default_uom) = product.default_uom().and_then(|id| catalog.uom(id)) else {
        return Ok(None);
    };
    let price = Uom::compute_price(&default_uom, product.cost_price(ctx.company()), unit)?;
    Ok(Some(price))
}

/// Most recent booked purchase price of `product`, converted to a price per `unit`.
///
/// Lines from other companies, unbooked invoices, non-positive prices and
/// invoices dated after the context's `as_of` are skipped. Among lines of the
/// same date the later one wins.
pub fn last_purchase_price(
    product: &Product,
    unit: &Uom,
    ctx: &CostContext,
    catalog: &dyn ProductCatalog,
    history: &dyn PurchaseHistory,
) -> Result<Option<Decimal>, CostError> {
    let lines = history.purchase_lines(product.id_typed());
    let latest = lines
        .iter()
        .filter(|line| line.qualifies(ctx.company(), ctx.as_of()))
        .fold(None, |best: Option<&PurchaseInvoiceLine>, line| match best {
            Some(b) if b.invoice_date > line.invoice_date => Some(b),
            _ => Some(line),
        });

    let Some(line) = latest else {
        return Ok(None);
    };
    let Some(line_unit) = catalog.uom(line.unit) else {
        return Ok(None);
    };

    Ok(Some(Uom::compute_price(&line_unit, line.unit_price, unit)?))
}
