//! Recipe command execution (application-level orchestration).
//!
//! ```text
//! Command
//!   ↓
//! 1. Load the recipe (or start from an empty aggregate)
//!   ↓
//! 2. Handle command (pure decision logic, produces events)
//!   ↓
//! 3. Save-time validation against other records (products, units,
//!    categories, sub-recipe cycles, linked-product uniqueness)
//!   ↓
//! 4. Apply events and save with an optimistic version check
//! ```
//!
//! Nothing is stored when any step fails. Cost evaluation goes through the
//! same service so that it reads the stored recipes, the catalog and the
//! configured cost basis.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use dishcost_core::{Aggregate, AggregateRoot, CompanyId, DomainError, ExpectedVersion};
use dishcost_costing::{CostContext, CostEngine, CostError, ProductCatalog, PurchaseHistory, RecipeCost};
use dishcost_products::{ProductId, ProductKind};
use dishcost_recipes::{
    AddAttachment, Attachment, AttachmentId, Category, CategoryId, CategoryTree, Component,
    CostPriceEntry, Recipe, RecipeCommand, RecipeEvent, RecipeId, RecordCostPrice, SubRecipe,
};

use crate::attachments::{AttachmentError, AttachmentStore, image_data_uri};
use crate::config::AppConfig;
use crate::repository::{RecipeRepository, RepositoryLookup};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The operation conflicts with existing records (duplicates, references).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Optimistic concurrency failure (stale recipe version).
    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    #[error("product {product} is already used by recipe \"{recipe_name}\"")]
    ProductAlreadyLinked {
        product: ProductId,
        recipe_id: RecipeId,
        recipe_name: String,
    },

    #[error(transparent)]
    Cost(#[from] CostError),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::InvariantViolation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::NotFound(what) => ServiceError::NotFound(what),
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Recipe service over a repository, a product catalog and an attachment store.
///
/// Recipe writes are serialized: checks that read other recipes (linked
/// product uniqueness, sub-recipe cycles, references before a delete) and the
/// save that follows them run under one lock. Lock order is `writes`, then
/// `categories`.
pub struct RecipeService<R, C, A> {
    recipes: R,
    catalog: C,
    attachments: A,
    purchases: Option<Arc<dyn PurchaseHistory + Send + Sync>>,
    categories: RwLock<CategoryTree>,
    writes: Mutex<()>,
    config: AppConfig,
}

impl<R, C, A> RecipeService<R, C, A>
where
    R: RecipeRepository,
    C: ProductCatalog,
    A: AttachmentStore,
{
    pub fn new(recipes: R, catalog: C, attachments: A, config: AppConfig) -> Self {
        Self {
            recipes,
            catalog,
            attachments,
            purchases: None,
            categories: RwLock::new(CategoryTree::new()),
            writes: Mutex::new(()),
            config,
        }
    }

    /// Supplier invoice history used by the last-purchase cost basis.
    pub fn with_purchase_history(mut self, purchases: Arc<dyn PurchaseHistory + Send + Sync>) -> Self {
        self.purchases = Some(purchases);
        self
    }

    pub fn repository(&self) -> &R {
        &self.recipes
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn attachment_store(&self) -> &A {
        &self.attachments
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn recipe(&self, id: RecipeId) -> ServiceResult<Recipe> {
        self.recipes
            .get(id)
            .ok_or_else(|| ServiceError::NotFound(format!("recipe {id}")))
    }

    /// Active recipes published for `company`.
    pub fn publishable(&self, company: CompanyId) -> Vec<Recipe> {
        self.recipes
            .list()
            .into_iter()
            .filter(|r| r.is_publishable(company))
            .collect()
    }

    /// Execute a recipe command and return the stored recipe.
    pub fn execute(&self, command: RecipeCommand) -> ServiceResult<Recipe> {
        let recipe_id = command.recipe_id();
        let result = self.execute_inner(command);
        match &result {
            Ok(recipe) => tracing::info!(
                recipe_id = %recipe_id,
                version = recipe.version(),
                "recipe command applied"
            ),
            Err(err) => tracing::warn!(recipe_id = %recipe_id, error = %err, "recipe command rejected"),
        }
        result
    }

    fn execute_inner(&self, command: RecipeCommand) -> ServiceResult<Recipe> {
        let recipe_id = command.recipe_id();
        let _writes = self.writes.lock().map_err(|_| poisoned("recipe writes"))?;

        // 1) Load
        let mut recipe = self
            .recipes
            .get(recipe_id)
            .unwrap_or_else(|| Recipe::empty(recipe_id));
        let expected = ExpectedVersion::Exact(recipe.version());

        // 2) Decide events (no mutation)
        let events = recipe.handle(&command)?;
        if events.is_empty() {
            return Ok(recipe);
        }

        // 3) Validate against the rest of the data
        for event in &events {
            self.validate_event(&recipe, event)?;
        }

        // 4) Apply + save
        for event in &events {
            recipe.apply(event);
        }
        self.recipes
            .save(recipe.clone(), expected)
            .map_err(|err| match err {
                DomainError::Conflict(msg) => ServiceError::Concurrency(msg),
                other => other.into(),
            })?;

        for event in &events {
            if let RecipeEvent::AttachmentRemoved(removed) = event {
                self.attachments.remove(&removed.doc_id);
            }
        }

        Ok(recipe)
    }

    fn validate_event(&self, recipe: &Recipe, event: &RecipeEvent) -> ServiceResult<()> {
        match event {
            RecipeEvent::RecipeCreated(e) => {
                self.ensure_category(e.category)?;
                if let Some(product) = e.product {
                    self.ensure_sellable_product(recipe.id_typed(), product)?;
                }
            }
            RecipeEvent::RecipeDetailsUpdated(e) => self.ensure_category(e.category)?,
            RecipeEvent::ProductLinked(e) => {
                if let Some(product) = e.product {
                    self.ensure_sellable_product(recipe.id_typed(), product)?;
                }
            }
            RecipeEvent::ComponentAdded(e) => self.ensure_component(&e.component)?,
            RecipeEvent::ComponentUpdated(e) => self.ensure_component(&e.component)?,
            RecipeEvent::SubRecipeAdded(e) => self.ensure_sub_recipe(recipe.id_typed(), &e.line)?,
            RecipeEvent::SubRecipeUpdated(e) => self.ensure_sub_recipe(recipe.id_typed(), &e.line)?,
            _ => {}
        }
        Ok(())
    }

    fn ensure_category(&self, category: Option<CategoryId>) -> ServiceResult<()> {
        let Some(category) = category else {
            return Ok(());
        };
        let tree = self.categories.read().map_err(|_| poisoned("category tree"))?;
        if !tree.contains(category) {
            return Err(ServiceError::NotFound(format!("category {category}")));
        }
        Ok(())
    }

    /// The linked product must be a service and not claimed by another recipe.
    fn ensure_sellable_product(&self, recipe_id: RecipeId, product_id: ProductId) -> ServiceResult<()> {
        let product = self
            .catalog
            .product(product_id)
            .ok_or_else(|| ServiceError::NotFound(format!("product {product_id}")))?;
        if product.kind() != ProductKind::Service {
            return Err(ServiceError::Validation(format!(
                "product {} must be a service to be linked to a recipe",
                product.name()
            )));
        }
        match self.recipes.find_by_product(product_id) {
            Some(other) if other.id_typed() != recipe_id => Err(ServiceError::ProductAlreadyLinked {
                product: product_id,
                recipe_id: other.id_typed(),
                recipe_name: other.name().to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// The component's unit must belong to its product's unit category.
    fn ensure_component(&self, component: &Component) -> ServiceResult<()> {
        let product = self
            .catalog
            .product(component.product)
            .ok_or_else(|| ServiceError::NotFound(format!("product {}", component.product)))?;
        let unit = self
            .catalog
            .uom(component.unit)
            .ok_or_else(|| ServiceError::NotFound(format!("unit {}", component.unit)))?;
        if product.uom_category() != Some(unit.category) {
            return Err(ServiceError::Validation(format!(
                "unit {} is not in the unit category of product {}",
                unit.symbol,
                product.name()
            )));
        }
        Ok(())
    }

    /// The target must exist and must not (transitively) use `owner`.
    fn ensure_sub_recipe(&self, owner: RecipeId, line: &SubRecipe) -> ServiceResult<()> {
        if self.recipes.get(line.recipe).is_none() {
            return Err(ServiceError::NotFound(format!("recipe {}", line.recipe)));
        }

        let mut stack = vec![line.recipe];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == owner {
                return Err(ServiceError::InvariantViolation(format!(
                    "recipe {} already contains recipe {owner}; adding it would create a cycle",
                    line.recipe
                )));
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(recipe) = self.recipes.get(current) {
                stack.extend(recipe.sub_recipes().iter().map(|s| s.recipe));
            }
        }
        Ok(())
    }

    /// Store `data` and attach it to the recipe under `name`.
    pub fn add_attachment(
        &self,
        recipe_id: RecipeId,
        name: impl Into<String>,
        description: Option<String>,
        data: Vec<u8>,
        occurred_at: DateTime<Utc>,
    ) -> ServiceResult<AttachmentId> {
        let doc_id = uuid::Uuid::now_v7().to_string();
        let attachment = Attachment {
            id: AttachmentId::generate(),
            name: name.into(),
            description,
            doc_id: doc_id.clone(),
        };
        let attachment_id = attachment.id;

        self.attachments.put(&doc_id, data);
        let result = self.execute(RecipeCommand::AddAttachment(AddAttachment {
            recipe_id,
            attachment,
            occurred_at,
        }));
        if let Err(err) = result {
            self.attachments.remove(&doc_id);
            return Err(err);
        }
        Ok(attachment_id)
    }

    /// `data:` URI of an image attached to `recipe_id` (or to the recipe named
    /// by a `[[<recipe-id>]].<name>` reference).
    pub fn image_data_uri(&self, recipe_id: RecipeId, reference: &str) -> ServiceResult<String> {
        Ok(image_data_uri(&self.recipes, &self.attachments, recipe_id, reference)?)
    }

    /// Delete a recipe with its lines, attachment metadata and payloads.
    ///
    /// Rejected while another recipe still uses it as a sub-recipe.
    pub fn delete_recipe(&self, recipe_id: RecipeId) -> ServiceResult<Recipe> {
        let _writes = self.writes.lock().map_err(|_| poisoned("recipe writes"))?;
        let recipe = self.recipe(recipe_id)?;

        let users = self.recipes.referencing(recipe_id);
        if !users.is_empty() {
            let names: Vec<&str> = users.iter().map(|r| r.name()).collect();
            tracing::warn!(recipe_id = %recipe_id, used_by = users.len(), "recipe deletion rejected");
            return Err(ServiceError::Conflict(format!(
                "recipe \"{}\" is used as a sub-recipe by: {}",
                recipe.name(),
                names.join(", ")
            )));
        }

        self.recipes
            .delete(recipe_id)
            .ok_or_else(|| ServiceError::NotFound(format!("recipe {recipe_id}")))?;
        for attachment in recipe.attachments() {
            self.attachments.remove(&attachment.doc_id);
        }

        tracing::info!(
            recipe_id = %recipe_id,
            components = recipe.components().len(),
            sub_recipes = recipe.sub_recipes().len(),
            attachments = recipe.attachments().len(),
            "recipe deleted"
        );
        Ok(recipe)
    }

    /// Costing context for `company`: its registered currency (or the
    /// configured default) and the configured cost basis.
    pub fn context(&self, company: CompanyId) -> CostContext {
        let currency = self
            .catalog
            .company_currency(company)
            .unwrap_or_else(|| self.config.default_currency());
        CostContext::new(company)
            .with_currency(currency)
            .with_basis(self.config.cost_basis)
    }

    fn with_engine<T>(&self, f: impl FnOnce(&CostEngine<'_>) -> T) -> T {
        let lookup = RepositoryLookup(&self.recipes);
        let mut engine = CostEngine::new(&self.catalog, &lookup);
        if let Some(purchases) = self.purchases.as_deref() {
            engine = engine.with_purchase_history(purchases);
        }
        f(&engine)
    }

    /// Derived cost fields of a stored recipe.
    pub fn evaluate(&self, recipe_id: RecipeId, ctx: &CostContext) -> ServiceResult<RecipeCost> {
        Ok(self.with_engine(|engine| engine.evaluate(recipe_id, ctx))?)
    }

    /// Derived cost fields of an unsaved recipe (editing preview).
    pub fn evaluate_draft(&self, draft: &Recipe, ctx: &CostContext) -> ServiceResult<RecipeCost> {
        Ok(self.with_engine(|engine| engine.evaluate_recipe(draft, ctx))?)
    }

    /// Record the recipe's current cost and company price as a dated entry.
    pub fn snapshot_cost_price(
        &self,
        recipe_id: RecipeId,
        ctx: &CostContext,
        date: NaiveDate,
        occurred_at: DateTime<Utc>,
    ) -> ServiceResult<CostPriceEntry> {
        let cost = self.evaluate(recipe_id, ctx)?;
        let entry = CostPriceEntry {
            company: ctx.company(),
            date,
            cost: cost.cost,
            price: cost.price.unwrap_or_default(),
        };
        self.execute(RecipeCommand::RecordCostPrice(RecordCostPrice {
            recipe_id,
            entry: entry.clone(),
            occurred_at,
        }))?;
        Ok(entry)
    }

    pub fn add_category(&self, category: Category) -> ServiceResult<()> {
        let mut tree = self.categories.write().map_err(|_| poisoned("category tree"))?;
        Ok(tree.insert(category)?)
    }

    pub fn rename_category(&self, id: CategoryId, name: &str) -> ServiceResult<()> {
        let mut tree = self.categories.write().map_err(|_| poisoned("category tree"))?;
        Ok(tree.rename(id, name)?)
    }

    pub fn move_category(&self, id: CategoryId, parent: Option<CategoryId>) -> ServiceResult<()> {
        let mut tree = self.categories.write().map_err(|_| poisoned("category tree"))?;
        Ok(tree.reparent(id, parent)?)
    }

    /// Remove a leaf category that no recipe belongs to.
    pub fn remove_category(&self, id: CategoryId) -> ServiceResult<Category> {
        let _writes = self.writes.lock().map_err(|_| poisoned("recipe writes"))?;
        let recipes = self.recipes.in_category(id);
        if !recipes.is_empty() {
            return Err(ServiceError::Conflict(format!(
                "category {id} still holds {} recipe(s)",
                recipes.len()
            )));
        }
        let mut tree = self.categories.write().map_err(|_| poisoned("category tree"))?;
        Ok(tree.remove(id)?)
    }

    /// `Parent / Child` path of a category, joined with the configured separator.
    pub fn category_full_name(&self, id: CategoryId) -> ServiceResult<String> {
        let tree = self.categories.read().map_err(|_| poisoned("category tree"))?;
        tree.full_name(id, &self.config.category_separator)
            .ok_or_else(|| ServiceError::NotFound(format!("category {id}")))
    }

    pub fn categories(&self) -> ServiceResult<CategoryTree> {
        let tree = self.categories.read().map_err(|_| poisoned("category tree"))?;
        Ok(tree.clone())
    }
}

fn poisoned(what: &str) -> ServiceError {
    ServiceError::InvariantViolation(format!("{what} lock poisoned"))
}
