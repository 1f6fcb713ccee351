//! Recipe lines: raw-material components and nested sub-recipes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dishcost_core::{Entity, typed_id};
use dishcost_products::{ProductId, UomId};

use crate::recipe::RecipeId;

typed_id!(
    /// Component line identifier.
    ComponentId
);

typed_id!(
    /// Sub-recipe line identifier.
    SubRecipeId
);

/// A leaf ingredient line: `quantity` of `product` measured in `unit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub product: ProductId,
    pub quantity: Decimal,
    pub unit: UomId,
    /// Material loss in percent; only values strictly between 0 and 100 apply.
    pub waste: Option<Decimal>,
    pub include_taxes: bool,
    pub sequence: u32,
}

impl Entity for Component {
    type Id = ComponentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Component {
    /// Multiplier applied to the line total for material loss.
    ///
    /// Waste outside the open interval (0, 100) is ignored rather than clamped.
    pub fn waste_factor(&self) -> Option<Decimal> {
        self.waste
            .filter(|w| *w > Decimal::ZERO && *w < Decimal::ONE_HUNDRED)
            .map(|w| Decimal::ONE + w / Decimal::ONE_HUNDRED)
    }
}

/// A reference to another recipe, contributing its cost times `quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRecipe {
    pub id: SubRecipeId,
    pub recipe: RecipeId,
    pub quantity: Decimal,
    pub sequence: u32,
}

impl Entity for SubRecipe {
    type Id = SubRecipeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
