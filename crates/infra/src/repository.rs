//! Recipe persistence.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use dishcost_core::{AggregateRoot, DomainError, DomainResult, ExpectedVersion};
use dishcost_costing::RecipeLookup;
use dishcost_products::ProductId;
use dishcost_recipes::{CategoryId, Recipe, RecipeId};

/// Storage for recipe aggregates (current state, not event streams).
pub trait RecipeRepository: Send + Sync {
    fn get(&self, id: RecipeId) -> Option<Recipe>;

    /// Store `recipe`, failing with `Conflict` when the stored version does
    /// not match `expected` (a missing recipe is at version 0).
    fn save(&self, recipe: Recipe, expected: ExpectedVersion) -> DomainResult<()>;

    /// Remove a recipe, returning it when it existed.
    fn delete(&self, id: RecipeId) -> Option<Recipe>;

    /// All recipes ordered by `(sequence, name)`.
    fn list(&self) -> Vec<Recipe>;

    /// The recipe linked to `product`, if any.
    fn find_by_product(&self, product: ProductId) -> Option<Recipe>;

    /// Recipes with a sub-recipe line pointing at `id`.
    fn referencing(&self, id: RecipeId) -> Vec<Recipe>;

    fn in_category(&self, category: CategoryId) -> Vec<Recipe>;
}

impl<S> RecipeRepository for Arc<S>
where
    S: RecipeRepository + ?Sized,
{
    fn get(&self, id: RecipeId) -> Option<Recipe> {
        (**self).get(id)
    }

    fn save(&self, recipe: Recipe, expected: ExpectedVersion) -> DomainResult<()> {
        (**self).save(recipe, expected)
    }

    fn delete(&self, id: RecipeId) -> Option<Recipe> {
        (**self).delete(id)
    }

    fn list(&self) -> Vec<Recipe> {
        (**self).list()
    }

    fn find_by_product(&self, product: ProductId) -> Option<Recipe> {
        (**self).find_by_product(product)
    }

    fn referencing(&self, id: RecipeId) -> Vec<Recipe> {
        (**self).referencing(id)
    }

    fn in_category(&self, category: CategoryId) -> Vec<Recipe> {
        (**self).in_category(category)
    }
}

/// In-memory recipe store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRecipeRepository {
    inner: RwLock<HashMap<RecipeId, Recipe>>,
}

impl InMemoryRecipeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn filtered(&self, keep: impl Fn(&Recipe) -> bool) -> Vec<Recipe> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut out: Vec<Recipe> = map.values().filter(|r| keep(r)).cloned().collect();
        out.sort_by(|a, b| (a.sequence(), a.name()).cmp(&(b.sequence(), b.name())));
        out
    }
}

impl RecipeRepository for InMemoryRecipeRepository {
    fn get(&self, id: RecipeId) -> Option<Recipe> {
        let map = self.inner.read().ok()?;
        map.get(&id).cloned()
    }

    fn save(&self, recipe: Recipe, expected: ExpectedVersion) -> DomainResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::invariant("recipe store lock poisoned"))?;
        let current = map.get(&recipe.id_typed()).map(|r| r.version()).unwrap_or(0);
        expected.check(current)?;
        map.insert(recipe.id_typed(), recipe);
        Ok(())
    }

    fn delete(&self, id: RecipeId) -> Option<Recipe> {
        let mut map = self.inner.write().ok()?;
        map.remove(&id)
    }

    fn list(&self) -> Vec<Recipe> {
        self.filtered(|_| true)
    }

    fn find_by_product(&self, product: ProductId) -> Option<Recipe> {
        self.filtered(|r| r.product() == Some(product)).into_iter().next()
    }

    fn referencing(&self, id: RecipeId) -> Vec<Recipe> {
        self.filtered(|r| r.uses_sub_recipe(id))
    }

    fn in_category(&self, category: CategoryId) -> Vec<Recipe> {
        self.filtered(|r| r.category() == Some(category))
    }
}

/// Read-only view of a repository for the cost engine.
pub struct RepositoryLookup<'r, R: ?Sized>(pub &'r R);

impl<R> RecipeLookup for RepositoryLookup<'_, R>
where
    R: RecipeRepository + ?Sized,
{
    fn recipe(&self, id: RecipeId) -> Option<Recipe> {
        self.0.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dishcost_core::Aggregate;
    use dishcost_recipes::{CreateRecipe, RecipeCommand};

    fn recipe(name: &str, sequence: u32, product: Option<ProductId>) -> Recipe {
        let recipe_id = RecipeId::generate();
        let mut recipe = Recipe::empty(recipe_id);
        let command = RecipeCommand::CreateRecipe(CreateRecipe {
            recipe_id,
            name: name.to_string(),
            description: None,
            preparation: None,
            category: None,
            product,
            sequence,
            occurred_at: Utc::now(),
        });
        for event in recipe.handle(&command).unwrap() {
            recipe.apply(&event);
        }
        recipe
    }

    #[test]
    fn save_checks_expected_version() {
        let repo = InMemoryRecipeRepository::new();
        let r = recipe("Gazpacho", 0, None);

        assert!(matches!(
            repo.save(r.clone(), ExpectedVersion::Exact(1)),
            Err(DomainError::Conflict(_))
        ));
        repo.save(r.clone(), ExpectedVersion::Exact(0)).unwrap();
        assert_eq!(repo.get(r.id_typed()), Some(r.clone()));

        // Stored version is now 1.
        assert!(repo.save(r.clone(), ExpectedVersion::Exact(0)).is_err());
        repo.save(r, ExpectedVersion::Exact(1)).unwrap();
    }

    #[test]
    fn list_is_ordered_by_sequence_then_name() {
        let repo = InMemoryRecipeRepository::new();
        for (name, seq) in [("Tortilla", 2), ("Croquetas", 1), ("Albondigas", 2)] {
            repo.save(recipe(name, seq, None), ExpectedVersion::Any).unwrap();
        }

        let names: Vec<String> = repo.list().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, vec!["Croquetas", "Albondigas", "Tortilla"]);
    }

    #[test]
    fn finds_recipe_by_linked_product() {
        let repo = InMemoryRecipeRepository::new();
        let product = ProductId::generate();
        let linked = recipe("Menu", 0, Some(product));
        repo.save(linked.clone(), ExpectedVersion::Any).unwrap();
        repo.save(recipe("Other", 0, None), ExpectedVersion::Any).unwrap();

        assert_eq!(repo.find_by_product(product).map(|r| r.id_typed()), Some(linked.id_typed()));
        assert!(repo.find_by_product(ProductId::generate()).is_none());
    }

    #[test]
    fn delete_returns_removed_recipe() {
        let repo = InMemoryRecipeRepository::new();
        let r = recipe("Flan", 0, None);
        repo.save(r.clone(), ExpectedVersion::Any).unwrap();

        assert_eq!(repo.delete(r.id_typed()).map(|r| r.id_typed()), Some(r.id_typed()));
        assert!(repo.get(r.id_typed()).is_none());
        assert!(repo.delete(r.id_typed()).is_none());
    }
}
