//! Products domain module: the raw materials and sellable services recipes
//! refer to, their units of measure, supplier taxes and purchase history.
//!
//! Pure domain logic only (no IO, no storage).

pub mod product;
pub mod purchase;
pub mod tax;
pub mod uom;

pub use product::{
    CostPriceSet, CreateProduct, Product, ProductCommand, ProductCreated, ProductEvent, ProductId,
    ProductKind, SetCostPrice, SetSupplierTaxes, SupplierTaxesSet,
};
pub use purchase::{InvoiceState, PurchaseInvoiceLine};
pub use tax::{Tax, TaxId, TaxLine, TaxRate, compute_taxes};
pub use uom::{Uom, UomCategory, UomCategoryId, UomId};
