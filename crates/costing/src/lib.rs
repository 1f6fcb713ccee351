//! Recipe cost roll-up.
//!
//! Derives a recipe's cost from its components (product cost converted to the
//! line's unit, optionally taxed, inflated by waste) and its sub-recipes
//! (recursive), and its margin percentage from the per-company price.
//! Every entry point takes an explicit [`CostContext`].

pub mod context;
pub mod engine;
pub mod error;
pub mod line;
pub mod source;
pub mod tax;

#[cfg(test)]
mod testing;

pub use context::{CostBasis, CostContext};
pub use engine::{ComponentCost, CostEngine, RecipeCost, SubRecipeCost, percentage};
pub use error::CostError;
pub use line::{component_unit_cost, last_purchase_price};
pub use source::{ProductCatalog, PurchaseHistory, RecipeLookup};
pub use tax::{AggregatedTaxLine, TaxKey, aggregate_tax_lines, supplier_tax_amount};
