//! Read access to the data a cost evaluation needs.
//!
//! Lookups return owned snapshots; a missing record is `None`, never an error.

use std::collections::HashMap;
use std::sync::Arc;

use dishcost_core::{CompanyId, Currency};
use dishcost_products::{Product, ProductId, PurchaseInvoiceLine, Tax, TaxId, Uom, UomId};
use dishcost_recipes::{Recipe, RecipeId};

/// Products, units of measure, taxes and company currencies.
pub trait ProductCatalog {
    fn product(&self, id: ProductId) -> Option<Product>;
    fn uom(&self, id: UomId) -> Option<Uom>;
    fn tax(&self, id: TaxId) -> Option<Tax>;

    /// Currency registered for `company`, if any.
    fn company_currency(&self, _company: CompanyId) -> Option<Currency> {
        None
    }
}

pub trait RecipeLookup {
    fn recipe(&self, id: RecipeId) -> Option<Recipe>;
}

/// Supplier invoice lines, used by the last-purchase cost basis.
pub trait PurchaseHistory {
    /// All invoice lines for `product`, in insertion order.
    fn purchase_lines(&self, product: ProductId) -> Vec<PurchaseInvoiceLine>;
}

impl RecipeLookup for HashMap<RecipeId, Recipe> {
    fn recipe(&self, id: RecipeId) -> Option<Recipe> {
        self.get(&id).cloned()
    }
}

impl<S> RecipeLookup for Arc<S>
where
    S: RecipeLookup + ?Sized,
{
    fn recipe(&self, id: RecipeId) -> Option<Recipe> {
        (**self).recipe(id)
    }
}

impl<S> ProductCatalog for Arc<S>
where
    S: ProductCatalog + ?Sized,
{
    fn product(&self, id: ProductId) -> Option<Product> {
        (**self).product(id)
    }

    fn uom(&self, id: UomId) -> Option<Uom> {
        (**self).uom(id)
    }

    fn tax(&self, id: TaxId) -> Option<Tax> {
        (**self).tax(id)
    }

    fn company_currency(&self, company: CompanyId) -> Option<Currency> {
        (**self).company_currency(company)
    }
}

impl<S> PurchaseHistory for Arc<S>
where
    S: PurchaseHistory + ?Sized,
{
    fn purchase_lines(&self, product: ProductId) -> Vec<PurchaseInvoiceLine> {
        (**self).purchase_lines(product)
    }
}
