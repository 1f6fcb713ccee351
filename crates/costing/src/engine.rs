//! Cost Aggregation Engine.
//!
//! `cost = cost_components + cost_subrecipes`, each side the currency-rounded
//! sum of its line totals:
//!
//! ```text
//! component total = unit cost (in the line's unit, taxes included if asked)
//!                   x quantity x (1 + waste/100 when 0 < waste < 100)
//! sub-recipe total = referenced recipe's cost x quantity
//! ```
//!
//! One evaluation pass tracks the recipes on the current path (a sub-recipe
//! cycle is reported, not recursed into) and caches each recipe's cost so a
//! sub-recipe shared by several branches is evaluated once.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use dishcost_core::{CompanyId, Currency};
use dishcost_recipes::{Component, ComponentId, Recipe, RecipeId, SubRecipe, SubRecipeId};

use crate::context::CostContext;
use crate::error::{CostError, checked_sum};
use crate::line::component_unit_cost;
use crate::source::{ProductCatalog, PurchaseHistory, RecipeLookup};

/// Cost breakdown of one component line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentCost {
    pub component_id: ComponentId,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
}

/// Cost breakdown of one sub-recipe line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubRecipeCost {
    pub line_id: SubRecipeId,
    pub recipe: RecipeId,
    /// Cost of one unit of the referenced recipe.
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
}

/// Derived fields of a recipe for one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeCost {
    pub recipe_id: RecipeId,
    pub company: CompanyId,
    pub currency: Currency,
    pub cost_components: Decimal,
    pub cost_subrecipes: Decimal,
    pub cost: Decimal,
    pub price: Option<Decimal>,
    pub components: Vec<ComponentCost>,
    pub sub_recipes: Vec<SubRecipeCost>,
}

impl RecipeCost {
    /// `cost / price * 100`, rounded to the currency.
    ///
    /// `None` when no price is set for the company; a zero price is an error.
    pub fn percentage(&self) -> Result<Option<Decimal>, CostError> {
        percentage(self.recipe_id, Some(self.cost), self.price, &self.currency)
    }
}

/// `cost / price * 100` rounded to `currency`.
///
/// Undefined (`None`) when either operand is undefined; a zero price is
/// reported as [`CostError::ZeroPrice`].
pub fn percentage(
    recipe_id: RecipeId,
    cost: Option<Decimal>,
    price: Option<Decimal>,
    currency: &Currency,
) -> Result<Option<Decimal>, CostError> {
    let (Some(cost), Some(price)) = (cost, price) else {
        return Ok(None);
    };
    if price.is_zero() {
        return Err(CostError::ZeroPrice(recipe_id));
    }
    let ratio = cost
        .checked_div(price)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(CostError::Overflow("percentage"))?;
    Ok(Some(currency.round(ratio)))
}

/// Evaluates recipe costs against a catalog and a set of recipes.
pub struct CostEngine<'a> {
    catalog: &'a dyn ProductCatalog,
    recipes: &'a dyn RecipeLookup,
    purchases: Option<&'a dyn PurchaseHistory>,
}

impl<'a> CostEngine<'a> {
    pub fn new(catalog: &'a dyn ProductCatalog, recipes: &'a dyn RecipeLookup) -> Self {
        Self {
            catalog,
            recipes,
            purchases: None,
        }
    }

    /// Enable the last-purchase cost basis.
    pub fn with_purchase_history(mut self, purchases: &'a dyn PurchaseHistory) -> Self {
        self.purchases = Some(purchases);
        self
    }

    /// Recompute every derived field of a stored recipe.
    pub fn evaluate(&self, recipe_id: RecipeId, ctx: &CostContext) -> Result<RecipeCost, CostError> {
        let recipe = self
            .recipes
            .recipe(recipe_id)
            .ok_or(CostError::RecipeNotFound(recipe_id))?;
        self.evaluate_recipe(&recipe, ctx)
    }

    /// Recompute every derived field of `recipe`, which may be an unsaved draft.
    ///
    /// Sub-recipes are resolved through the engine's recipe lookup.
    pub fn evaluate_recipe(&self, recipe: &Recipe, ctx: &CostContext) -> Result<RecipeCost, CostError> {
        let mut pass = Pass::new(self, ctx);
        let result = pass.breakdown(recipe);

        match &result {
            Ok(breakdown) => tracing::debug!(
                recipe_id = %recipe.id_typed(),
                company = %ctx.company(),
                cost = %breakdown.cost,
                "recipe cost evaluated"
            ),
            Err(CostError::CycleDetected { path }) => tracing::warn!(
                recipe_id = %recipe.id_typed(),
                depth = path.len(),
                "sub-recipe cycle detected"
            ),
            Err(CostError::Overflow(what)) => tracing::warn!(
                recipe_id = %recipe.id_typed(),
                what = *what,
                "recipe cost overflows"
            ),
            Err(_) => {}
        }

        let breakdown = result?;
        Ok(RecipeCost {
            recipe_id: recipe.id_typed(),
            company: ctx.company(),
            currency: ctx.rounding_currency(),
            cost: breakdown.cost,
            cost_components: breakdown.cost_components,
            cost_subrecipes: breakdown.cost_subrecipes,
            price: recipe.price(ctx.company()),
            components: breakdown.components,
            sub_recipes: breakdown.sub_recipes,
        })
    }

    /// Total cost of a stored recipe (`cost_components + cost_subrecipes`).
    pub fn recipe_cost(&self, recipe_id: RecipeId, ctx: &CostContext) -> Result<Decimal, CostError> {
        Ok(self.evaluate(recipe_id, ctx)?.cost)
    }

    /// Rounded sum of the direct component totals.
    pub fn recipe_cost_components(&self, recipe: &Recipe, ctx: &CostContext) -> Result<Decimal, CostError> {
        let mut totals = Vec::with_capacity(recipe.components().len());
        for component in recipe.components() {
            totals.push(self.component_total_cost(component, ctx)?.total_cost);
        }
        Ok(ctx.rounding_currency().round(checked_sum(totals, "component costs")?))
    }

    /// Rounded sum of the direct sub-recipe totals.
    pub fn recipe_cost_subrecipes(&self, recipe: &Recipe, ctx: &CostContext) -> Result<Decimal, CostError> {
        let mut pass = Pass::new(self, ctx);
        pass.visiting.push(recipe.id_typed());
        let lines = pass.sub_recipe_lines(recipe)?;
        let total = checked_sum(lines.iter().map(|l| l.total_cost), "sub-recipe costs")?;
        Ok(ctx.rounding_currency().round(total))
    }

    /// Unit and total cost of one component line.
    pub fn component_total_cost(&self, component: &Component, ctx: &CostContext) -> Result<ComponentCost, CostError> {
        let unit_cost = component_unit_cost(component, ctx, self.catalog, self.purchases)?;
        let mut total_cost = unit_cost
            .checked_mul(component.quantity)
            .ok_or(CostError::Overflow("component cost"))?;
        if let Some(factor) = component.waste_factor() {
            total_cost = total_cost
                .checked_mul(factor)
                .ok_or(CostError::Overflow("component cost"))?;
        }
        Ok(ComponentCost {
            component_id: component.id,
            unit_cost,
            total_cost,
        })
    }

    /// Unit and total cost of one sub-recipe line.
    pub fn subrecipe_total_cost(&self, line: &SubRecipe, ctx: &CostContext) -> Result<SubRecipeCost, CostError> {
        Pass::new(self, ctx).sub_recipe_line(line)
    }

    /// Margin percentage of a stored recipe for the context's company.
    pub fn percentage(&self, recipe_id: RecipeId, ctx: &CostContext) -> Result<Option<Decimal>, CostError> {
        self.evaluate(recipe_id, ctx)?.percentage()
    }
}

struct Breakdown {
    cost_components: Decimal,
    cost_subrecipes: Decimal,
    cost: Decimal,
    components: Vec<ComponentCost>,
    sub_recipes: Vec<SubRecipeCost>,
}

/// State of one evaluation pass.
struct Pass<'e, 'a> {
    engine: &'e CostEngine<'a>,
    ctx: &'e CostContext,
    currency: Currency,
    /// Recipes on the current evaluation path, outermost first.
    visiting: Vec<RecipeId>,
    cache: HashMap<RecipeId, Decimal>,
}

impl<'e, 'a> Pass<'e, 'a> {
    fn new(engine: &'e CostEngine<'a>, ctx: &'e CostContext) -> Self {
        Self {
            engine,
            ctx,
            currency: ctx.rounding_currency(),
            visiting: Vec::new(),
            cache: HashMap::new(),
        }
    }

    fn breakdown(&mut self, recipe: &Recipe) -> Result<Breakdown, CostError> {
        self.visiting.push(recipe.id_typed());

        let mut components = Vec::with_capacity(recipe.components().len());
        for component in recipe.components() {
            components.push(self.engine.component_total_cost(component, self.ctx)?);
        }
        let sub_recipes = self.sub_recipe_lines(recipe)?;

        self.visiting.pop();

        let cost_components = self
            .currency
            .round(checked_sum(components.iter().map(|c| c.total_cost), "component costs")?);
        let cost_subrecipes = self
            .currency
            .round(checked_sum(sub_recipes.iter().map(|s| s.total_cost), "sub-recipe costs")?);
        Ok(Breakdown {
            cost_components,
            cost_subrecipes,
            cost: checked_sum([cost_components, cost_subrecipes], "recipe cost")?,
            components,
            sub_recipes,
        })
    }

    fn sub_recipe_lines(&mut self, recipe: &Recipe) -> Result<Vec<SubRecipeCost>, CostError> {
        recipe
            .sub_recipes()
            .iter()
            .map(|line| self.sub_recipe_line(line))
            .collect()
    }

    fn sub_recipe_line(&mut self, line: &SubRecipe) -> Result<SubRecipeCost, CostError> {
        let unit_cost = self.recipe_cost(line.recipe)?;
        let total_cost = unit_cost
            .checked_mul(line.quantity)
            .ok_or(CostError::Overflow("sub-recipe cost"))?;
        Ok(SubRecipeCost {
            line_id: line.id,
            recipe: line.recipe,
            unit_cost,
            total_cost,
        })
    }

    fn recipe_cost(&mut self, recipe_id: RecipeId) -> Result<Decimal, CostError> {
        if let Some(start) = self.visiting.iter().position(|id| *id == recipe_id) {
            let mut path = self.visiting[start..].to_vec();
            path.push(recipe_id);
            return Err(CostError::CycleDetected { path });
        }
        if let Some(cost) = self.cache.get(&recipe_id) {
            return Ok(*cost);
        }

        // A dangling reference contributes nothing, like an unset line.
        let Some(recipe) = self.engine.recipes.recipe(recipe_id) else {
            return Ok(Decimal::ZERO);
        };
        let cost = self.breakdown(&recipe)?.cost;
        self.cache.insert(recipe_id, cost);
        Ok(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dishcost_core::CompanyId;

    use crate::testing::{Kitchen, d};

    /// Rice at 1000/kg in company A and 2000/kg in company B, and a recipe
    /// using 250 g of it.
    fn paella() -> (Kitchen, CompanyId, CompanyId, RecipeId) {
        let (a, b) = (CompanyId::new(), CompanyId::new());
        let mut kitchen = Kitchen::new();
        let rice = kitchen.ingredient("Rice");
        kitchen.set_cost(rice, a, "1000");
        kitchen.set_cost(rice, b, "2000");

        let recipe = kitchen.new_recipe("Paella");
        let line = kitchen.grams(rice, "250");
        kitchen.add_component(recipe, line);
        (kitchen, a, b, recipe)
    }

    #[test]
    fn empty_recipe_costs_nothing() {
        let mut kitchen = Kitchen::new();
        let recipe = kitchen.new_recipe("Water");
        let engine = CostEngine::new(&kitchen, &kitchen);

        let cost = engine.evaluate(recipe, &CostContext::new(CompanyId::new())).unwrap();
        assert_eq!(cost.cost, Decimal::ZERO);
        assert!(cost.components.is_empty());
        assert!(cost.sub_recipes.is_empty());
    }

    #[test]
    fn unknown_recipe_is_reported() {
        let kitchen = Kitchen::new();
        let engine = CostEngine::new(&kitchen, &kitchen);
        let missing = RecipeId::generate();

        let err = engine.evaluate(missing, &CostContext::new(CompanyId::new())).unwrap_err();
        assert_eq!(err, CostError::RecipeNotFound(missing));
    }

    #[test]
    fn cost_follows_company_context() {
        let (kitchen, a, b, recipe) = paella();
        let engine = CostEngine::new(&kitchen, &kitchen);

        assert_eq!(engine.recipe_cost(recipe, &CostContext::new(a)).unwrap(), d("250"));
        assert_eq!(engine.recipe_cost(recipe, &CostContext::new(b)).unwrap(), d("500"));
    }

    #[test]
    fn percentage_uses_company_price() {
        let (mut kitchen, a, b, recipe) = paella();
        kitchen.set_price(recipe, a, "500");
        kitchen.set_price(recipe, b, "800");
        let engine = CostEngine::new(&kitchen, &kitchen);

        assert_eq!(engine.percentage(recipe, &CostContext::new(a)).unwrap(), Some(d("50")));
        assert_eq!(engine.percentage(recipe, &CostContext::new(b)).unwrap(), Some(d("62.5")));
    }

    #[test]
    fn percentage_without_price_is_undefined() {
        let (kitchen, a, _, recipe) = paella();
        let engine = CostEngine::new(&kitchen, &kitchen);

        let cost = engine.evaluate(recipe, &CostContext::new(a)).unwrap();
        assert_eq!(cost.price, None);
        assert_eq!(cost.percentage().unwrap(), None);
    }

    #[test]
    fn zero_price_is_an_error() {
        let (mut kitchen, a, _, recipe) = paella();
        kitchen.set_price(recipe, a, "0");
        let engine = CostEngine::new(&kitchen, &kitchen);

        // Evaluation itself succeeds; only the percentage is undefined.
        let cost = engine.evaluate(recipe, &CostContext::new(a)).unwrap();
        assert_eq!(cost.cost, d("250"));
        assert_eq!(cost.percentage(), Err(CostError::ZeroPrice(recipe)));
    }

    #[test]
    fn nested_recipe_scales_sub_recipe_cost() {
        let (mut kitchen, a, b, recipe_1) = paella();
        let recipe_2 = kitchen.new_recipe("Paella for a party");
        kitchen.add_sub_recipe(recipe_2, recipe_1, "2");
        kitchen.set_price(recipe_2, a, "1000");
        kitchen.set_price(recipe_2, b, "2500");
        let engine = CostEngine::new(&kitchen, &kitchen);

        let under_a = engine.evaluate(recipe_2, &CostContext::new(a)).unwrap();
        assert_eq!(under_a.cost, d("500"));
        assert_eq!(under_a.cost_components, Decimal::ZERO);
        assert_eq!(under_a.cost_subrecipes, d("500"));
        assert_eq!(under_a.sub_recipes[0].unit_cost, d("250"));
        assert_eq!(under_a.percentage().unwrap(), Some(d("50")));

        let under_b = engine.evaluate(recipe_2, &CostContext::new(b)).unwrap();
        assert_eq!(under_b.cost, d("1000"));
        assert_eq!(under_b.percentage().unwrap(), Some(d("40")));
    }

    #[test]
    fn waste_inflates_component_total() {
        let (mut kitchen, a, _, _) = paella();
        let rice = *kitchen.products.keys().next().unwrap();
        let engine_ctx = CostContext::new(a);

        let mut line = kitchen.grams(rice, "250");
        line.waste = Some(d("10"));
        let recipe = kitchen.new_recipe("Wasteful paella");
        kitchen.add_component(recipe, line.clone());
        let engine = CostEngine::new(&kitchen, &kitchen);

        assert_eq!(engine.component_total_cost(&line, &engine_ctx).unwrap().total_cost, d("275"));
        assert_eq!(engine.recipe_cost(recipe, &engine_ctx).unwrap(), d("275"));
    }

    #[test]
    fn waste_at_bounds_is_ignored() {
        let (kitchen, a, _, _) = paella();
        let rice = *kitchen.products.keys().next().unwrap();
        let engine = CostEngine::new(&kitchen, &kitchen);
        let ctx = CostContext::new(a);

        for waste in ["0", "100", "-5", "150"] {
            let mut line = kitchen.grams(rice, "250");
            line.waste = Some(d(waste));
            assert_eq!(engine.component_total_cost(&line, &ctx).unwrap().total_cost, d("250"), "waste {waste}");
        }
    }

    #[test]
    fn sub_recipe_line_total_is_cost_times_quantity() {
        let (mut kitchen, a, _, recipe_1) = paella();
        let recipe_2 = kitchen.new_recipe("Party");
        kitchen.add_sub_recipe(recipe_2, recipe_1, "2");
        let engine = CostEngine::new(&kitchen, &kitchen);

        let line = kitchen.recipes[&recipe_2].sub_recipes()[0].clone();
        let cost = engine.subrecipe_total_cost(&line, &CostContext::new(a)).unwrap();
        assert_eq!(cost.unit_cost, d("250"));
        assert_eq!(cost.total_cost, d("500"));
    }

    #[test]
    fn sums_are_rounded_to_currency() {
        let company = CompanyId::new();
        let mut kitchen = Kitchen::new();
        let saffron = kitchen.ingredient("Saffron");
        kitchen.set_cost(saffron, company, "3333.333");
        let recipe = kitchen.new_recipe("Saffron rice");
        let line = kitchen.grams(saffron, "1");
        kitchen.add_component(recipe, line);
        let engine = CostEngine::new(&kitchen, &kitchen);

        let cost = engine.evaluate(recipe, &CostContext::new(company)).unwrap();
        assert_eq!(cost.components[0].total_cost, d("3.333333"));
        assert_eq!(cost.cost_components, d("3.33"));

        let yen = CostContext::new(company).with_currency(Currency::new("JPY", 0));
        assert_eq!(engine.recipe_cost(recipe, &yen).unwrap(), d("3"));
    }

    #[test]
    fn indirect_cycle_is_detected() {
        let mut kitchen = Kitchen::new();
        let a = kitchen.new_recipe("A");
        let b = kitchen.new_recipe("B");
        let c = kitchen.new_recipe("C");
        kitchen.add_sub_recipe(a, b, "1");
        kitchen.add_sub_recipe(b, c, "1");
        kitchen.add_sub_recipe(c, a, "1");
        let engine = CostEngine::new(&kitchen, &kitchen);

        let err = engine.evaluate(a, &CostContext::new(CompanyId::new())).unwrap_err();
        assert_eq!(err, CostError::CycleDetected { path: vec![a, b, c, a] });
    }

    #[test]
    fn shared_sub_recipe_is_not_a_cycle() {
        let (mut kitchen, a, _, base) = paella();
        let left = kitchen.new_recipe("Left");
        let right = kitchen.new_recipe("Right");
        let top = kitchen.new_recipe("Top");
        kitchen.add_sub_recipe(left, base, "1");
        kitchen.add_sub_recipe(right, base, "1");
        kitchen.add_sub_recipe(top, left, "1");
        kitchen.add_sub_recipe(top, right, "1");
        let engine = CostEngine::new(&kitchen, &kitchen);

        assert_eq!(engine.recipe_cost(top, &CostContext::new(a)).unwrap(), d("500"));
    }

    #[test]
    fn dangling_sub_recipe_contributes_nothing() {
        let (mut kitchen, a, _, recipe) = paella();
        kitchen.add_sub_recipe(recipe, RecipeId::generate(), "3");
        let engine = CostEngine::new(&kitchen, &kitchen);

        assert_eq!(engine.recipe_cost(recipe, &CostContext::new(a)).unwrap(), d("250"));
    }

    #[test]
    fn unsaved_draft_can_be_evaluated() {
        let (kitchen, a, _, recipe) = paella();
        let draft = kitchen.recipes[&recipe].clone();
        let no_recipes: HashMap<RecipeId, Recipe> = HashMap::new();
        let engine = CostEngine::new(&kitchen, &no_recipes);

        assert_eq!(engine.evaluate_recipe(&draft, &CostContext::new(a)).unwrap().cost, d("250"));
    }

    #[test]
    fn direct_sums_match_evaluation() {
        let (mut kitchen, a, _, recipe_1) = paella();
        let rice = *kitchen.products.keys().next().unwrap();
        let recipe_2 = kitchen.new_recipe("Mixed");
        kitchen.add_sub_recipe(recipe_2, recipe_1, "3");
        let line = kitchen.grams(rice, "100");
        kitchen.add_component(recipe_2, line);
        let engine = CostEngine::new(&kitchen, &kitchen);
        let ctx = CostContext::new(a);

        let stored = kitchen.recipes[&recipe_2].clone();
        let components = engine.recipe_cost_components(&stored, &ctx).unwrap();
        let subrecipes = engine.recipe_cost_subrecipes(&stored, &ctx).unwrap();
        assert_eq!(components, d("100"));
        assert_eq!(subrecipes, d("750"));
        assert_eq!(engine.recipe_cost(recipe_2, &ctx).unwrap(), components + subrecipes);
    }

    #[test]
    fn last_purchase_basis_flows_through_engine() {
        use chrono::NaiveDate;
        use dishcost_products::{InvoiceState, PurchaseInvoiceLine};

        let (mut kitchen, a, _, recipe) = paella();
        let rice = *kitchen.products.keys().next().unwrap();
        let kg = kitchen.kg;
        kitchen.purchases.push(PurchaseInvoiceLine {
            company: a,
            product: rice,
            unit: kg,
            quantity: d("10"),
            unit_price: d("800"),
            state: InvoiceState::Paid,
            invoice_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        });
        let engine = CostEngine::new(&kitchen, &kitchen).with_purchase_history(&kitchen);

        let ctx = CostContext::new(a).with_basis(crate::CostBasis::LastPurchase);
        assert_eq!(engine.recipe_cost(recipe, &ctx).unwrap(), d("200"));
        assert_eq!(engine.recipe_cost(recipe, &CostContext::new(a)).unwrap(), d("250"));
    }

    #[test]
    fn free_percentage_is_undefined_without_cost() {
        let usd = Currency::default();
        let id = RecipeId::generate();
        assert_eq!(percentage(id, None, Some(d("10")), &usd), Ok(None));
        assert_eq!(percentage(id, Some(d("1")), Some(d("3")), &usd), Ok(Some(d("33.33"))));
    }

    #[test]
    fn component_total_beyond_decimal_range_is_an_error() {
        let company = CompanyId::new();
        let mut kitchen = Kitchen::new();
        let saffron = kitchen.ingredient("Saffron");
        kitchen.set_cost(saffron, company, "100000000000000000000");
        let recipe = kitchen.new_recipe("Saffron mountain");
        let line = kitchen.kilograms(saffron, "1000000000");
        kitchen.add_component(recipe, line.clone());
        let engine = CostEngine::new(&kitchen, &kitchen);
        let ctx = CostContext::new(company);

        let err = engine.component_total_cost(&line, &ctx).unwrap_err();
        assert_eq!(err, CostError::Overflow("component cost"));
        assert_eq!(engine.evaluate(recipe, &ctx).unwrap_err(), CostError::Overflow("component cost"));
    }

    #[test]
    fn sums_beyond_decimal_range_are_errors() {
        // Each line fits in a decimal; two of them do not.
        const HALF_MAX: &str = "50000000000000000000000000000";
        let company = CompanyId::new();
        let ctx = CostContext::new(company);
        let mut kitchen = Kitchen::new();
        let truffle = kitchen.ingredient("Truffle");
        kitchen.set_cost(truffle, company, HALF_MAX);

        let base = kitchen.new_recipe("Truffle base");
        let line = kitchen.kilograms(truffle, "1");
        kitchen.add_component(base, line.clone());

        let doubled = kitchen.new_recipe("Two truffles");
        let second = kitchen.kilograms(truffle, "1");
        kitchen.add_component(doubled, line.clone());
        kitchen.add_component(doubled, second);

        let scaled = kitchen.new_recipe("Scaled base");
        kitchen.add_sub_recipe(scaled, base, "2");

        let mixed = kitchen.new_recipe("Truffle and base");
        kitchen.add_component(mixed, line);
        kitchen.add_sub_recipe(mixed, base, "1");

        let engine = CostEngine::new(&kitchen, &kitchen);
        assert_eq!(engine.evaluate(base, &ctx).unwrap().cost, d(HALF_MAX));
        assert_eq!(engine.evaluate(doubled, &ctx).unwrap_err(), CostError::Overflow("component costs"));
        assert_eq!(
            engine.recipe_cost_components(&kitchen.recipes[&doubled], &ctx).unwrap_err(),
            CostError::Overflow("component costs")
        );
        assert_eq!(engine.evaluate(scaled, &ctx).unwrap_err(), CostError::Overflow("sub-recipe cost"));
        assert_eq!(engine.evaluate(mixed, &ctx).unwrap_err(), CostError::Overflow("recipe cost"));
    }

    #[test]
    fn percentage_beyond_decimal_range_is_an_error() {
        let usd = Currency::default();
        let tiny_price = Decimal::new(1, 19);
        assert_eq!(
            percentage(RecipeId::generate(), Some(d("10000000000")), Some(tiny_price), &usd),
            Err(CostError::Overflow("percentage"))
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn cost_is_sum_of_rounded_parts(
                costs in prop::collection::vec(1u32..100_000, 0..5),
                grams in prop::collection::vec(1u32..5_000, 0..5),
                nested in prop::collection::vec(1u32..10, 0..3),
            ) {
                let company = CompanyId::new();
                let mut kitchen = Kitchen::new();
                let base = kitchen.new_recipe("Base");
                let top = kitchen.new_recipe("Top");
                for (cost, qty) in costs.iter().zip(grams.iter()) {
                    let product = kitchen.ingredient("Ingredient");
                    kitchen.set_cost(product, company, &(Decimal::from(*cost) / Decimal::from(7)).to_string());
                    let line = kitchen.grams(product, &qty.to_string());
                    kitchen.add_component(base, line.clone());
                    kitchen.add_component(top, line);
                }
                for qty in &nested {
                    kitchen.add_sub_recipe(top, base, &qty.to_string());
                }
                let engine = CostEngine::new(&kitchen, &kitchen);
                let ctx = CostContext::new(company);

                let result = engine.evaluate(top, &ctx).unwrap();
                prop_assert_eq!(result.cost, result.cost_components + result.cost_subrecipes);
                prop_assert_eq!(result.cost_components, ctx.rounding_currency().round(result.cost_components));
                prop_assert_eq!(result.cost_subrecipes, ctx.rounding_currency().round(result.cost_subrecipes));

                let base_cost = engine.recipe_cost(base, &ctx).unwrap();
                let expected: Decimal = nested.iter().map(|q| base_cost * Decimal::from(*q)).sum();
                prop_assert_eq!(result.cost_subrecipes, ctx.rounding_currency().round(expected));
            }

            #[test]
            fn waste_outside_open_interval_never_changes_total(waste in prop_oneof![-50i64..=0, 100i64..300]) {
                let company = CompanyId::new();
                let mut kitchen = Kitchen::new();
                let product = kitchen.ingredient("Flour");
                kitchen.set_cost(product, company, "2");
                let mut line = kitchen.kilograms(product, "3");
                line.waste = Some(Decimal::from(waste));
                let engine = CostEngine::new(&kitchen, &kitchen);

                let total = engine.component_total_cost(&line, &CostContext::new(company)).unwrap().total_cost;
                prop_assert_eq!(total, d("6"));
            }
        }
    }
}
