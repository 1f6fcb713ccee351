//! In-memory products, units, taxes, currencies and purchase history.

use std::collections::HashMap;
use std::sync::RwLock;

use dishcost_core::{Aggregate, CompanyId, Currency, DomainError, DomainResult};
use dishcost_costing::{ProductCatalog, PurchaseHistory};
use dishcost_products::{
    Product, ProductCommand, ProductId, PurchaseInvoiceLine, Tax, TaxId, Uom, UomCategory,
    UomCategoryId, UomId,
};

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
    categories: RwLock<HashMap<UomCategoryId, UomCategory>>,
    uoms: RwLock<HashMap<UomId, Uom>>,
    taxes: RwLock<HashMap<TaxId, Tax>>,
    currencies: RwLock<HashMap<CompanyId, Currency>>,
}

fn poisoned() -> DomainError {
    DomainError::invariant("catalog lock poisoned")
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_uom_category(&self, category: UomCategory) {
        if let Ok(mut map) = self.categories.write() {
            map.insert(category.id, category);
        }
    }

    /// Register a unit; its category must be known and its factor positive.
    pub fn add_uom(&self, uom: Uom) -> DomainResult<()> {
        let known = self.categories.read().map_err(|_| poisoned())?.contains_key(&uom.category);
        if !known {
            return Err(DomainError::validation(format!(
                "unit {} refers to an unknown category",
                uom.symbol
            )));
        }
        if uom.factor <= rust_decimal::Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "unit {} must have a positive factor",
                uom.symbol
            )));
        }
        self.uoms.write().map_err(|_| poisoned())?.insert(uom.id, uom);
        Ok(())
    }

    pub fn add_tax(&self, tax: Tax) {
        if let Ok(mut map) = self.taxes.write() {
            map.insert(tax.id, tax);
        }
    }

    pub fn set_company_currency(&self, company: CompanyId, currency: Currency) {
        if let Ok(mut map) = self.currencies.write() {
            map.insert(company, currency);
        }
    }

    /// Run a product command: load (or start empty), handle, apply, store.
    ///
    /// A product's default unit must belong to its unit category, and its
    /// supplier taxes must exist.
    pub fn execute(&self, product_id: ProductId, command: ProductCommand) -> DomainResult<Product> {
        let mut product = self
            .product(product_id)
            .unwrap_or_else(|| Product::empty(product_id));

        let events = product.handle(&command)?;

        match &command {
            ProductCommand::CreateProduct(cmd) => {
                let uom = self
                    .uom(cmd.default_uom)
                    .ok_or_else(|| DomainError::validation("default unit does not exist"))?;
                if uom.category != cmd.uom_category {
                    return Err(DomainError::validation(
                        "default unit must belong to the product's unit category",
                    ));
                }
            }
            ProductCommand::SetSupplierTaxes(cmd) => {
                if let Some(missing) = cmd.taxes.iter().find(|id| self.tax(**id).is_none()) {
                    return Err(DomainError::validation(format!("unknown tax {missing}")));
                }
            }
            ProductCommand::SetCostPrice(_) => {}
        }

        for event in &events {
            product.apply(event);
        }
        self.products
            .write()
            .map_err(|_| poisoned())?
            .insert(product_id, product.clone());

        tracing::debug!(product_id = %product_id, events = events.len(), "product command applied");
        Ok(product)
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn product(&self, id: ProductId) -> Option<Product> {
        self.products.read().ok()?.get(&id).cloned()
    }

    fn uom(&self, id: UomId) -> Option<Uom> {
        self.uoms.read().ok()?.get(&id).cloned()
    }

    fn tax(&self, id: TaxId) -> Option<Tax> {
        self.taxes.read().ok()?.get(&id).cloned()
    }

    fn company_currency(&self, company: CompanyId) -> Option<Currency> {
        self.currencies.read().ok()?.get(&company).cloned()
    }
}

/// In-memory supplier invoice lines.
#[derive(Debug, Default)]
pub struct InMemoryPurchaseHistory {
    lines: RwLock<Vec<PurchaseInvoiceLine>>,
}

impl InMemoryPurchaseHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, line: PurchaseInvoiceLine) {
        if let Ok(mut lines) = self.lines.write() {
            lines.push(line);
        }
    }
}

impl PurchaseHistory for InMemoryPurchaseHistory {
    fn purchase_lines(&self, product: ProductId) -> Vec<PurchaseInvoiceLine> {
        match self.lines.read() {
            Ok(lines) => lines.iter().filter(|l| l.product == product).cloned().collect(),
            Err(_) => vec![],
        }
    }
}
