//! Recipes domain module (dish recipes and their categories).
//!
//! A recipe is composed of raw-material components and nested sub-recipes,
//! carries per-company price and publish overlays and an optional dated
//! cost/price history. Costs are derived (see `dishcost-costing`), never stored
//! as authoritative state.

pub mod attachment;
pub mod category;
pub mod cost_price;
pub mod line;
pub mod recipe;

pub use attachment::{Attachment, AttachmentId};
pub use category::{Category, CategoryId, CategoryTree, DEFAULT_SEPARATOR};
pub use cost_price::{CostPriceEntry, CostPriceHistory};
pub use line::{Component, ComponentId, SubRecipe, SubRecipeId};
pub use recipe::{
    ActivateRecipe, AddAttachment, AddComponent, AddSubRecipe, ArchiveRecipe, AttachmentAdded,
    AttachmentRemoved, ComponentAdded, ComponentRemoved, ComponentUpdated, CostPriceRecorded,
    CreateRecipe, LinkProduct, PriceSet, ProductLinked, PublishSet, Recipe, RecipeActivated,
    RecipeArchived, RecipeCommand, RecipeCreated, RecipeDetailsUpdated, RecipeEvent, RecipeId,
    RecordCostPrice, RemoveAttachment, RemoveComponent, RemoveSubRecipe, SetPrice, SetPublish,
    SubRecipeAdded, SubRecipeRemoved, SubRecipeUpdated, UpdateComponent, UpdateRecipeDetails,
    UpdateSubRecipe,
};
