use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dishcost_core::{
    Aggregate, AggregateRoot, CompanyId, CompanyValues, DomainError, Event, typed_id,
};

use crate::tax::TaxId;
use crate::uom::{UomCategoryId, UomId};

typed_id!(
    /// Product identifier.
    ProductId
);

/// What a product is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    /// Stockable raw material (recipe components).
    Goods,
    /// Sellable service (the dish a recipe is linked to).
    Service,
}

/// Aggregate root: Product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    code: Option<String>,
    name: String,
    kind: ProductKind,
    default_uom: Option<UomId>,
    uom_category: Option<UomCategoryId>,
    /// Cost per `default_uom`, per company.
    cost_price: CompanyValues<Decimal>,
    supplier_taxes: Vec<TaxId>,
    version: u64,
    created: bool,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            code: None,
            name: String::new(),
            kind: ProductKind::Goods,
            default_uom: None,
            uom_category: None,
            cost_price: CompanyValues::new(),
            supplier_taxes: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProductKind {
        self.kind
    }

    pub fn is_service(&self) -> bool {
        self.kind == ProductKind::Service
    }

    pub fn default_uom(&self) -> Option<UomId> {
        self.default_uom
    }

    pub fn uom_category(&self) -> Option<UomCategoryId> {
        self.uom_category
    }

    /// Cost price per default unit for `company` (zero when never set there).
    pub fn cost_price(&self, company: CompanyId) -> Decimal {
        self.cost_price.get_or(company, Decimal::ZERO)
    }

    pub fn cost_prices(&self) -> &CompanyValues<Decimal> {
        &self.cost_price
    }

    pub fn supplier_taxes(&self) -> &[TaxId] {
        &self.supplier_taxes
    }

    pub fn is_created(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub product_id: ProductId,
    pub code: Option<String>,
    pub name: String,
    pub kind: ProductKind,
    pub default_uom: UomId,
    pub uom_category: UomCategoryId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetCostPrice (company-scoped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCostPrice {
    pub product_id: ProductId,
    pub company_id: CompanyId,
    pub cost_price: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetSupplierTaxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSupplierTaxes {
    pub product_id: ProductId,
    pub taxes: Vec<TaxId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCommand {
    CreateProduct(CreateProduct),
    SetCostPrice(SetCostPrice),
    SetSupplierTaxes(SetSupplierTaxes),
}

/// Event: ProductCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub product_id: ProductId,
    pub code: Option<String>,
    pub name: String,
    pub kind: ProductKind,
    pub default_uom: UomId,
    pub uom_category: UomCategoryId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CostPriceSet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostPriceSet {
    pub product_id: ProductId,
    pub company_id: CompanyId,
    pub cost_price: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SupplierTaxesSet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierTaxesSet {
    pub product_id: ProductId,
    pub taxes: Vec<TaxId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductCreated(ProductCreated),
    CostPriceSet(CostPriceSet),
    SupplierTaxesSet(SupplierTaxesSet),
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated(_) => "products.product.created",
            ProductEvent::CostPriceSet(_) => "products.product.cost_price_set",
            ProductEvent::SupplierTaxesSet(_) => "products.product.supplier_taxes_set",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductCreated(e) => e.occurred_at,
            ProductEvent::CostPriceSet(e) => e.occurred_at,
            ProductEvent::SupplierTaxesSet(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::ProductCreated(e) => {
                self.id = e.product_id;
                self.code = e.code.clone();
                self.name = e.name.clone();
                self.kind = e.kind;
                self.default_uom = Some(e.default_uom);
                self.uom_category = Some(e.uom_category);
                self.created = true;
            }
            ProductEvent::CostPriceSet(e) => {
                self.cost_price.set(e.company_id, e.cost_price);
            }
            ProductEvent::SupplierTaxesSet(e) => {
                self.supplier_taxes = e.taxes.clone();
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::CreateProduct(cmd) => self.handle_create(cmd),
            ProductCommand::SetCostPrice(cmd) => self.handle_set_cost_price(cmd),
            ProductCommand::SetSupplierTaxes(cmd) => self.handle_set_supplier_taxes(cmd),
        }
    }
}

impl Product {
    fn ensure_created(&self, product_id: ProductId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found("product"));
        }
        if self.id != product_id {
            return Err(DomainError::invariant("product_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("product already exists"));
        }

        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        // Whether `default_uom` belongs to `uom_category` is checked by the
        // catalog, which owns the units.
        Ok(vec![ProductEvent::ProductCreated(ProductCreated {
            product_id: cmd.product_id,
            code: cmd.code.clone(),
            name: cmd.name.clone(),
            kind: cmd.kind,
            default_uom: cmd.default_uom,
            uom_category: cmd.uom_category,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_cost_price(&self, cmd: &SetCostPrice) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_created(cmd.product_id)?;

        if cmd.cost_price < Decimal::ZERO {
            return Err(DomainError::validation("cost price cannot be negative"));
        }

        Ok(vec![ProductEvent::CostPriceSet(CostPriceSet {
            product_id: cmd.product_id,
            company_id: cmd.company_id,
            cost_price: cmd.cost_price,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_supplier_taxes(
        &self,
        cmd: &SetSupplierTaxes,
    ) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_created(cmd.product_id)?;

        let mut seen = std::collections::HashSet::new();
        if !cmd.taxes.iter().all(|tax| seen.insert(*tax)) {
            return Err(DomainError::validation("duplicate supplier tax"));
        }

        Ok(vec![ProductEvent::SupplierTaxesSet(SupplierTaxesSet {
            product_id: cmd.product_id,
            taxes: cmd.taxes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
