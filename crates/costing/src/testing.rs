//! In-memory kitchen used by the costing tests.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;

use dishcost_core::{Aggregate, CompanyId, Currency};
use dishcost_products::{
    CreateProduct, Product, ProductCommand, ProductId, ProductKind, PurchaseInvoiceLine,
    SetCostPrice, SetSupplierTaxes, Tax, TaxId, Uom, UomCategoryId, UomId,
};
use dishcost_recipes::{
    AddComponent, AddSubRecipe, Component, ComponentId, CreateRecipe, Recipe, RecipeCommand,
    RecipeId, SetPrice, SubRecipe, SubRecipeId,
};

use crate::source::{ProductCatalog, PurchaseHistory, RecipeLookup};

pub fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub struct Kitchen {
    pub products: HashMap<ProductId, Product>,
    pub uoms: HashMap<UomId, Uom>,
    pub taxes: HashMap<TaxId, Tax>,
    pub recipes: HashMap<RecipeId, Recipe>,
    pub purchases: Vec<PurchaseInvoiceLine>,
    pub currencies: HashMap<CompanyId, Currency>,
    pub weight: UomCategoryId,
    pub kg: UomId,
    pub g: UomId,
}

impl Kitchen {
    pub fn new() -> Self {
        let weight = UomCategoryId::generate();
        let kg = Uom::new(UomId::generate(), "Kilogram", "kg", weight, Decimal::ONE);
        let g = Uom::new(UomId::generate(), "Gram", "g", weight, d("0.001"));
        let mut kitchen = Kitchen {
            products: HashMap::new(),
            uoms: HashMap::new(),
            taxes: HashMap::new(),
            recipes: HashMap::new(),
            purchases: Vec::new(),
            currencies: HashMap::new(),
            weight,
            kg: kg.id,
            g: g.id,
        };
        kitchen.uoms.insert(kg.id, kg);
        kitchen.uoms.insert(g.id, g);
        kitchen
    }

    /// A goods product stocked per kilogram.
    pub fn ingredient(&mut self, name: &str) -> ProductId {
        let product_id = ProductId::generate();
        let mut product = Product::empty(product_id);
        self.execute_product(
            &mut product,
            ProductCommand::CreateProduct(CreateProduct {
                product_id,
                code: None,
                name: name.to_string(),
                kind: ProductKind::Goods,
                default_uom: self.kg,
                uom_category: self.weight,
                occurred_at: Utc::now(),
            }),
        );
        self.products.insert(product_id, product);
        product_id
    }

    pub fn set_cost(&mut self, product_id: ProductId, company: CompanyId, cost: &str) {
        let mut product = self.products.remove(&product_id).unwrap();
        self.execute_product(
            &mut product,
            ProductCommand::SetCostPrice(SetCostPrice {
                product_id,
                company_id: company,
                cost_price: d(cost),
                occurred_at: Utc::now(),
            }),
        );
        self.products.insert(product_id, product);
    }

    pub fn set_taxes(&mut self, product_id: ProductId, taxes: Vec<Tax>) {
        let ids = taxes.iter().map(|t| t.id).collect();
        for tax in taxes {
            self.taxes.insert(tax.id, tax);
        }
        let mut product = self.products.remove(&product_id).unwrap();
        self.execute_product(
            &mut product,
            ProductCommand::SetSupplierTaxes(SetSupplierTaxes {
                product_id,
                taxes: ids,
                occurred_at: Utc::now(),
            }),
        );
        self.products.insert(product_id, product);
    }

    pub fn new_recipe(&mut self, name: &str) -> RecipeId {
        let recipe_id = RecipeId::generate();
        let mut recipe = Recipe::empty(recipe_id);
        execute_recipe(
            &mut recipe,
            RecipeCommand::CreateRecipe(CreateRecipe {
                recipe_id,
                name: name.to_string(),
                description: None,
                preparation: None,
                category: None,
                product: None,
                sequence: 0,
                occurred_at: Utc::now(),
            }),
        );
        self.recipes.insert(recipe_id, recipe);
        recipe_id
    }

    pub fn add_component(&mut self, recipe_id: RecipeId, component: Component) {
        self.with_recipe(
            recipe_id,
            RecipeCommand::AddComponent(AddComponent {
                recipe_id,
                component,
                occurred_at: Utc::now(),
            }),
        );
    }

    pub fn add_sub_recipe(&mut self, recipe_id: RecipeId, target: RecipeId, quantity: &str) -> SubRecipeId {
        let line = SubRecipe {
            id: SubRecipeId::generate(),
            recipe: target,
            quantity: d(quantity),
            sequence: 0,
        };
        let id = line.id;
        self.with_recipe(
            recipe_id,
            RecipeCommand::AddSubRecipe(AddSubRecipe {
                recipe_id,
                line,
                occurred_at: Utc::now(),
            }),
        );
        id
    }

    pub fn set_price(&mut self, recipe_id: RecipeId, company: CompanyId, price: &str) {
        self.with_recipe(
            recipe_id,
            RecipeCommand::SetPrice(SetPrice {
                recipe_id,
                company_id: company,
                price: d(price),
                occurred_at: Utc::now(),
            }),
        );
    }

    pub fn grams(&self, product: ProductId, quantity: &str) -> Component {
        Component {
            id: ComponentId::generate(),
            product,
            quantity: d(quantity),
            unit: self.g,
            waste: None,
            include_taxes: false,
            sequence: 0,
        }
    }

    pub fn kilograms(&self, product: ProductId, quantity: &str) -> Component {
        Component {
            unit: self.kg,
            ..self.grams(product, quantity)
        }
    }

    fn with_recipe(&mut self, recipe_id: RecipeId, command: RecipeCommand) {
        let recipe = self.recipes.get_mut(&recipe_id).unwrap();
        execute_recipe(recipe, command);
    }

    fn execute_product(&self, product: &mut Product, command: ProductCommand) {
        for event in product.handle(&command).unwrap() {
            product.apply(&event);
        }
    }
}

fn execute_recipe(recipe: &mut Recipe, command: RecipeCommand) {
    for event in recipe.handle(&command).unwrap() {
        recipe.apply(&event);
    }
}

impl ProductCatalog for Kitchen {
    fn product(&self, id: ProductId) -> Option<Product> {
        self.products.get(&id).cloned()
    }

    fn uom(&self, id: UomId) -> Option<Uom> {
        self.uoms.get(&id).cloned()
    }

    fn tax(&self, id: TaxId) -> Option<Tax> {
        self.taxes.get(&id).cloned()
    }

    fn company_currency(&self, company: CompanyId) -> Option<Currency> {
        self.currencies.get(&company).cloned()
    }
}

impl RecipeLookup for Kitchen {
    fn recipe(&self, id: RecipeId) -> Option<Recipe> {
        self.recipes.get(&id).cloned()
    }
}

impl PurchaseHistory for Kitchen {
    fn purchase_lines(&self, product: ProductId) -> Vec<PurchaseInvoiceLine> {
        self.purchases
            .iter()
            .filter(|line| line.product == product)
            .cloned()
            .collect()
    }
}
