use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dishcost_core::{
    Aggregate, AggregateRoot, CompanyId, CompanyValues, DomainError, Event, typed_id,
};
use dishcost_products::ProductId;

use crate::attachment::{Attachment, AttachmentId};
use crate::category::CategoryId;
use crate::cost_price::{CostPriceEntry, CostPriceHistory};
use crate::line::{Component, ComponentId, SubRecipe, SubRecipeId};

typed_id!(
    /// Recipe identifier.
    RecipeId
);

/// Aggregate root: Recipe.
///
/// Owns its components, sub-recipe lines and attachment metadata; deleting the
/// recipe deletes them with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    id: RecipeId,
    name: String,
    description: Option<String>,
    preparation: Option<String>,
    category: Option<CategoryId>,
    product: Option<ProductId>,
    sequence: u32,
    active: bool,
    components: Vec<Component>,
    sub_recipes: Vec<SubRecipe>,
    attachments: Vec<Attachment>,
    price: CompanyValues<Decimal>,
    publish: CompanyValues<bool>,
    cost_history: CostPriceHistory,
    version: u64,
    created: bool,
}

impl Recipe {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: RecipeId) -> Self {
        Self {
            id,
            name: String::new(),
            description: None,
            preparation: None,
            category: None,
            product: None,
            sequence: 0,
            active: true,
            components: Vec::new(),
            sub_recipes: Vec::new(),
            attachments: Vec::new(),
            price: CompanyValues::new(),
            publish: CompanyValues::new(),
            cost_history: CostPriceHistory::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> RecipeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn preparation(&self) -> Option<&str> {
        self.preparation.as_deref()
    }

    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }

    pub fn product(&self) -> Option<ProductId> {
        self.product
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Components ordered by sequence.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    /// Sub-recipe lines ordered by sequence.
    pub fn sub_recipes(&self) -> &[SubRecipe] {
        &self.sub_recipes
    }

    pub fn sub_recipe(&self, id: SubRecipeId) -> Option<&SubRecipe> {
        self.sub_recipes.iter().find(|s| s.id == id)
    }

    /// Whether any sub-recipe line points at `recipe`.
    pub fn uses_sub_recipe(&self, recipe: RecipeId) -> bool {
        self.sub_recipes.iter().any(|s| s.recipe == recipe)
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn attachment_named(&self, name: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.name == name)
    }

    /// Sale price for `company`; `None` when never set there.
    pub fn price(&self, company: CompanyId) -> Option<Decimal> {
        self.price.get(company).copied()
    }

    pub fn price_or_default(&self, company: CompanyId) -> Decimal {
        self.price.get_or(company, Decimal::ZERO)
    }

    pub fn prices(&self) -> &CompanyValues<Decimal> {
        &self.price
    }

    /// Stored publish flag for `company`.
    pub fn publish(&self, company: CompanyId) -> Option<bool> {
        self.publish.get(company).copied()
    }

    /// Whether the recipe may be published for `company`.
    ///
    /// Archived recipes are never publishable, whatever the stored flag says.
    pub fn is_publishable(&self, company: CompanyId) -> bool {
        self.active && self.publish.get_or(company, false)
    }

    pub fn cost_history(&self) -> &CostPriceHistory {
        &self.cost_history
    }
}

impl AggregateRoot for Recipe {
    type Id = RecipeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateRecipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRecipe {
    pub recipe_id: RecipeId,
    pub name: String,
    pub description: Option<String>,
    pub preparation: Option<String>,
    pub category: Option<CategoryId>,
    pub product: Option<ProductId>,
    pub sequence: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateRecipeDetails (descriptive fields only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecipeDetails {
    pub recipe_id: RecipeId,
    pub name: String,
    pub description: Option<String>,
    pub preparation: Option<String>,
    pub category: Option<CategoryId>,
    pub sequence: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: LinkProduct (`None` unlinks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkProduct {
    pub recipe_id: RecipeId,
    pub product: Option<ProductId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddComponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddComponent {
    pub recipe_id: RecipeId,
    pub component: Component,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateComponent (replaces the line with the same id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateComponent {
    pub recipe_id: RecipeId,
    pub component: Component,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveComponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveComponent {
    pub recipe_id: RecipeId,
    pub component_id: ComponentId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddSubRecipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddSubRecipe {
    pub recipe_id: RecipeId,
    pub line: SubRecipe,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateSubRecipe (replaces the line with the same id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSubRecipe {
    pub recipe_id: RecipeId,
    pub line: SubRecipe,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveSubRecipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveSubRecipe {
    pub recipe_id: RecipeId,
    pub line_id: SubRecipeId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddAttachment (metadata; the payload is stored by the caller).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddAttachment {
    pub recipe_id: RecipeId,
    pub attachment: Attachment,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveAttachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveAttachment {
    pub recipe_id: RecipeId,
    pub attachment_id: AttachmentId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetPrice (company-scoped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPrice {
    pub recipe_id: RecipeId,
    pub company_id: CompanyId,
    pub price: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetPublish (company-scoped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPublish {
    pub recipe_id: RecipeId,
    pub company_id: CompanyId,
    pub publish: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordCostPrice (append a dated snapshot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCostPrice {
    pub recipe_id: RecipeId,
    pub entry: CostPriceEntry,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ArchiveRecipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecipe {
    pub recipe_id: RecipeId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ActivateRecipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateRecipe {
    pub recipe_id: RecipeId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipeCommand {
    CreateRecipe(CreateRecipe),
    UpdateRecipeDetails(UpdateRecipeDetails),
    LinkProduct(LinkProduct),
    AddComponent(AddComponent),
    UpdateComponent(UpdateComponent),
    RemoveComponent(RemoveComponent),
    AddSubRecipe(AddSubRecipe),
    UpdateSubRecipe(UpdateSubRecipe),
    RemoveSubRecipe(RemoveSubRecipe),
    AddAttachment(AddAttachment),
    RemoveAttachment(RemoveAttachment),
    SetPrice(SetPrice),
    SetPublish(SetPublish),
    RecordCostPrice(RecordCostPrice),
    ArchiveRecipe(ArchiveRecipe),
    ActivateRecipe(ActivateRecipe),
}

impl RecipeCommand {
    /// The recipe the command targets.
    pub fn recipe_id(&self) -> RecipeId {
        match self {
            RecipeCommand::CreateRecipe(c) => c.recipe_id,
            RecipeCommand::UpdateRecipeDetails(c) => c.recipe_id,
            RecipeCommand::LinkProduct(c) => c.recipe_id,
            RecipeCommand::AddComponent(c) => c.recipe_id,
            RecipeCommand::UpdateComponent(c) => c.recipe_id,
            RecipeCommand::RemoveComponent(c) => c.recipe_id,
            RecipeCommand::AddSubRecipe(c) => c.recipe_id,
            RecipeCommand::UpdateSubRecipe(c) => c.recipe_id,
            RecipeCommand::RemoveSubRecipe(c) => c.recipe_id,
            RecipeCommand::AddAttachment(c) => c.recipe_id,
            RecipeCommand::RemoveAttachment(c) => c.recipe_id,
            RecipeCommand::SetPrice(c) => c.recipe_id,
            RecipeCommand::SetPublish(c) => c.recipe_id,
            RecipeCommand::RecordCostPrice(c) => c.recipe_id,
            RecipeCommand::ArchiveRecipe(c) => c.recipe_id,
            RecipeCommand::ActivateRecipe(c) => c.recipe_id,
        }
    }
}

/// Event: RecipeCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeCreated {
    pub recipe_id: RecipeId,
    pub name: String,
    pub description: Option<String>,
    pub preparation: Option<String>,
    pub category: Option<CategoryId>,
    pub product: Option<ProductId>,
    pub sequence: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RecipeDetailsUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDetailsUpdated {
    pub recipe_id: RecipeId,
    pub name: String,
    pub description: Option<String>,
    pub preparation: Option<String>,
    pub category: Option<CategoryId>,
    pub sequence: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductLinked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLinked {
    pub recipe_id: RecipeId,
    pub product: Option<ProductId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ComponentAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentAdded {
    pub recipe_id: RecipeId,
    pub component: Component,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ComponentUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentUpdated {
    pub recipe_id: RecipeId,
    pub component: Component,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ComponentRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRemoved {
    pub recipe_id: RecipeId,
    pub component_id: ComponentId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SubRecipeAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRecipeAdded {
    pub recipe_id: RecipeId,
    pub line: SubRecipe,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SubRecipeUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRecipeUpdated {
    pub recipe_id: RecipeId,
    pub line: SubRecipe,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SubRecipeRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRecipeRemoved {
    pub recipe_id: RecipeId,
    pub line_id: SubRecipeId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AttachmentAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentAdded {
    pub recipe_id: RecipeId,
    pub attachment: Attachment,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AttachmentRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRemoved {
    pub recipe_id: RecipeId,
    pub attachment_id: AttachmentId,
    pub doc_id: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PriceSet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSet {
    pub recipe_id: RecipeId,
    pub company_id: CompanyId,
    pub price: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PublishSet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishSet {
    pub recipe_id: RecipeId,
    pub company_id: CompanyId,
    pub publish: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CostPriceRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostPriceRecorded {
    pub recipe_id: RecipeId,
    pub entry: CostPriceEntry,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RecipeArchived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeArchived {
    pub recipe_id: RecipeId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RecipeActivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeActivated {
    pub recipe_id: RecipeId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipeEvent {
    RecipeCreated(RecipeCreated),
    RecipeDetailsUpdated(RecipeDetailsUpdated),
    ProductLinked(ProductLinked),
    ComponentAdded(ComponentAdded),
    ComponentUpdated(ComponentUpdated),
    ComponentRemoved(ComponentRemoved),
    SubRecipeAdded(SubRecipeAdded),
    SubRecipeUpdated(SubRecipeUpdated),
    SubRecipeRemoved(SubRecipeRemoved),
    AttachmentAdded(AttachmentAdded),
    AttachmentRemoved(AttachmentRemoved),
    PriceSet(PriceSet),
    PublishSet(PublishSet),
    CostPriceRecorded(CostPriceRecorded),
    RecipeArchived(RecipeArchived),
    RecipeActivated(RecipeActivated),
}

impl Event for RecipeEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RecipeEvent::RecipeCreated(_) => "recipes.recipe.created",
            RecipeEvent::RecipeDetailsUpdated(_) => "recipes.recipe.details_updated",
            RecipeEvent::ProductLinked(_) => "recipes.recipe.product_linked",
            RecipeEvent::ComponentAdded(_) => "recipes.recipe.component_added",
            RecipeEvent::ComponentUpdated(_) => "recipes.recipe.component_updated",
            RecipeEvent::ComponentRemoved(_) => "recipes.recipe.component_removed",
            RecipeEvent::SubRecipeAdded(_) => "recipes.recipe.sub_recipe_added",
            RecipeEvent::SubRecipeUpdated(_) => "recipes.recipe.sub_recipe_updated",
            RecipeEvent::SubRecipeRemoved(_) => "recipes.recipe.sub_recipe_removed",
            RecipeEvent::AttachmentAdded(_) => "recipes.recipe.attachment_added",
            RecipeEvent::AttachmentRemoved(_) => "recipes.recipe.attachment_removed",
            RecipeEvent::PriceSet(_) => "recipes.recipe.price_set",
            RecipeEvent::PublishSet(_) => "recipes.recipe.publish_set",
            RecipeEvent::CostPriceRecorded(_) => "recipes.recipe.cost_price_recorded",
            RecipeEvent::RecipeArchived(_) => "recipes.recipe.archived",
            RecipeEvent::RecipeActivated(_) => "recipes.recipe.activated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            RecipeEvent::RecipeCreated(e) => e.occurred_at,
            RecipeEvent::RecipeDetailsUpdated(e) => e.occurred_at,
            RecipeEvent::ProductLinked(e) => e.occurred_at,
            RecipeEvent::ComponentAdded(e) => e.occurred_at,
            RecipeEvent::ComponentUpdated(e) => e.occurred_at,
            RecipeEvent::ComponentRemoved(e) => e.occurred_at,
            RecipeEvent::SubRecipeAdded(e) => e.occurred_at,
            RecipeEvent::SubRecipeUpdated(e) => e.occurred_at,
            RecipeEvent::SubRecipeRemoved(e) => e.occurred_at,
            RecipeEvent::AttachmentAdded(e) => e.occurred_at,
            RecipeEvent::AttachmentRemoved(e) => e.occurred_at,
            RecipeEvent::PriceSet(e) => e.occurred_at,
            RecipeEvent::PublishSet(e) => e.occurred_at,
            RecipeEvent::CostPriceRecorded(e) => e.occurred_at,
            RecipeEvent::RecipeArchived(e) => e.occurred_at,
            RecipeEvent::RecipeActivated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Recipe {
    type Command = RecipeCommand;
    type Event = RecipeEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            RecipeEvent::RecipeCreated(e) => {
                self.id = e.recipe_id;
                self.name = e.name.clone();
                self.description = e.description.clone();
                self.preparation = e.preparation.clone();
                self.category = e.category;
                self.product = e.product;
                self.sequence = e.sequence;
                self.active = true;
                self.created = true;
            }
            RecipeEvent::RecipeDetailsUpdated(e) => {
                self.name = e.name.clone();
                self.description = e.description.clone();
                self.preparation = e.preparation.clone();
                self.category = e.category;
                self.sequence = e.sequence;
            }
            RecipeEvent::ProductLinked(e) => {
                self.product = e.product;
            }
            RecipeEvent::ComponentAdded(e) => {
                self.components.push(e.component.clone());
                self.components.sort_by_key(|c| c.sequence);
            }
            RecipeEvent::ComponentUpdated(e) => {
                if let Some(line) = self.components.iter_mut().find(|c| c.id == e.component.id) {
                    *line = e.component.clone();
                }
                self.components.sort_by_key(|c| c.sequence);
            }
            RecipeEvent::ComponentRemoved(e) => {
                self.components.retain(|c| c.id != e.component_id);
            }
            RecipeEvent::SubRecipeAdded(e) => {
                self.sub_recipes.push(e.line.clone());
                self.sub_recipes.sort_by_key(|s| s.sequence);
            }
            RecipeEvent::SubRecipeUpdated(e) => {
                if let Some(line) = self.sub_recipes.iter_mut().find(|s| s.id == e.line.id) {
                    *line = e.line.clone();
                }
                self.sub_recipes.sort_by_key(|s| s.sequence);
            }
            RecipeEvent::SubRecipeRemoved(e) => {
                self.sub_recipes.retain(|s| s.id != e.line_id);
            }
            RecipeEvent::AttachmentAdded(e) => {
                self.attachments.push(e.attachment.clone());
            }
            RecipeEvent::AttachmentRemoved(e) => {
                self.attachments.retain(|a| a.id != e.attachment_id);
            }
            RecipeEvent::PriceSet(e) => {
                self.price.set(e.company_id, e.price);
            }
            RecipeEvent::PublishSet(e) => {
                self.publish.set(e.company_id, e.publish);
            }
            RecipeEvent::CostPriceRecorded(e) => {
                self.cost_history.record(e.entry.clone());
            }
            RecipeEvent::RecipeArchived(_) => {
                self.active = false;
            }
            RecipeEvent::RecipeActivated(_) => {
                self.active = true;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        if !matches!(command, RecipeCommand::CreateRecipe(_)) {
            self.ensure_created(command.recipe_id())?;
        }

        match command {
            RecipeCommand::CreateRecipe(cmd) => self.handle_create(cmd),
            RecipeCommand::UpdateRecipeDetails(cmd) => self.handle_update_details(cmd),
            RecipeCommand::LinkProduct(cmd) => self.handle_link_product(cmd),
            RecipeCommand::AddComponent(cmd) => self.handle_add_component(cmd),
            RecipeCommand::UpdateComponent(cmd) => self.handle_update_component(cmd),
            RecipeCommand::RemoveComponent(cmd) => self.handle_remove_component(cmd),
            RecipeCommand::AddSubRecipe(cmd) => self.handle_add_sub_recipe(cmd),
            RecipeCommand::UpdateSubRecipe(cmd) => self.handle_update_sub_recipe(cmd),
            RecipeCommand::RemoveSubRecipe(cmd) => self.handle_remove_sub_recipe(cmd),
            RecipeCommand::AddAttachment(cmd) => self.handle_add_attachment(cmd),
            RecipeCommand::RemoveAttachment(cmd) => self.handle_remove_attachment(cmd),
            RecipeCommand::SetPrice(cmd) => self.handle_set_price(cmd),
            RecipeCommand::SetPublish(cmd) => Ok(vec![RecipeEvent::PublishSet(PublishSet {
                recipe_id: cmd.recipe_id,
                company_id: cmd.company_id,
                publish: cmd.publish,
                occurred_at: cmd.occurred_at,
            })]),
            RecipeCommand::RecordCostPrice(cmd) => self.handle_record_cost_price(cmd),
            RecipeCommand::ArchiveRecipe(cmd) => self.handle_archive(cmd),
            RecipeCommand::ActivateRecipe(cmd) => self.handle_activate(cmd),
        }
    }
}

impl Recipe {
    fn ensure_created(&self, recipe_id: RecipeId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found("recipe"));
        }
        if self.id != recipe_id {
            return Err(DomainError::invariant("recipe_id mismatch"));
        }
        Ok(())
    }

    fn ensure_name(name: &str) -> Result<(), DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(())
    }

    fn ensure_quantity(quantity: Decimal) -> Result<(), DomainError> {
        if quantity < Decimal::ZERO {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        Ok(())
    }

    fn ensure_component(&self, component: &Component) -> Result<(), DomainError> {
        Self::ensure_quantity(component.quantity)?;
        if self.product == Some(component.product) {
            return Err(DomainError::invariant(
                "a component cannot use the recipe's own product",
            ));
        }
        Ok(())
    }

    fn ensure_sub_recipe(&self, line: &SubRecipe) -> Result<(), DomainError> {
        Self::ensure_quantity(line.quantity)?;
        if line.recipe == self.id {
            return Err(DomainError::invariant("a recipe cannot contain itself"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateRecipe) -> Result<Vec<RecipeEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("recipe already exists"));
        }
        Self::ensure_name(&cmd.name)?;

        // Uniqueness of the linked product across recipes is checked by the
        // service, which can see the other recipes.
        Ok(vec![RecipeEvent::RecipeCreated(RecipeCreated {
            recipe_id: cmd.recipe_id,
            name: cmd.name.clone(),
            description: cmd.description.clone(),
            preparation: cmd.preparation.clone(),
            category: cmd.category,
            product: cmd.product,
            sequence: cmd.sequence,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_details(
        &self,
        cmd: &UpdateRecipeDetails,
    ) -> Result<Vec<RecipeEvent>, DomainError> {
        Self::ensure_name(&cmd.name)?;

        Ok(vec![RecipeEvent::RecipeDetailsUpdated(RecipeDetailsUpdated {
            recipe_id: cmd.recipe_id,
            name: cmd.name.clone(),
            description: cmd.description.clone(),
            preparation: cmd.preparation.clone(),
            category: cmd.category,
            sequence: cmd.sequence,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_link_product(&self, cmd: &LinkProduct) -> Result<Vec<RecipeEvent>, DomainError> {
        if let Some(product) = cmd.product {
            if self.components.iter().any(|c| c.product == product) {
                return Err(DomainError::invariant(
                    "the recipe's product is already used as one of its components",
                ));
            }
        }

        Ok(vec![RecipeEvent::ProductLinked(ProductLinked {
            recipe_id: cmd.recipe_id,
            product: cmd.product,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_component(&self, cmd: &AddComponent) -> Result<Vec<RecipeEvent>, DomainError> {
        if self.component(cmd.component.id).is_some() {
            return Err(DomainError::conflict("component line already exists"));
        }
        self.ensure_component(&cmd.component)?;

        Ok(vec![RecipeEvent::ComponentAdded(ComponentAdded {
            recipe_id: cmd.recipe_id,
            component: cmd.component.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_component(
        &self,
        cmd: &UpdateComponent,
    ) -> Result<Vec<RecipeEvent>, DomainError> {
        if self.component(cmd.component.id).is_none() {
            return Err(DomainError::not_found("component"));
        }
        self.ensure_component(&cmd.component)?;

        Ok(vec![RecipeEvent::ComponentUpdated(ComponentUpdated {
            recipe_id: cmd.recipe_id,
            component: cmd.component.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_component(
        &self,
        cmd: &RemoveComponent,
    ) -> Result<Vec<RecipeEvent>, DomainError> {
        if self.component(cmd.component_id).is_none() {
            return Err(DomainError::not_found("component"));
        }

        Ok(vec![RecipeEvent::ComponentRemoved(ComponentRemoved {
            recipe_id: cmd.recipe_id,
            component_id: cmd.component_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_sub_recipe(&self, cmd: &AddSubRecipe) -> Result<Vec<RecipeEvent>, DomainError> {
        if self.sub_recipe(cmd.line.id).is_some() {
            return Err(DomainError::conflict("sub-recipe line already exists"));
        }
        self.ensure_sub_recipe(&cmd.line)?;

        Ok(vec![RecipeEvent::SubRecipeAdded(SubRecipeAdded {
            recipe_id: cmd.recipe_id,
            line: cmd.line.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_sub_recipe(
        &self,
        cmd: &UpdateSubRecipe,
    ) -> Result<Vec<RecipeEvent>, DomainError> {
        if self.sub_recipe(cmd.line.id).is_none() {
            return Err(DomainError::not_found("sub-recipe line"));
        }
        self.ensure_sub_recipe(&cmd.line)?;

        Ok(vec![RecipeEvent::SubRecipeUpdated(SubRecipeUpdated {
            recipe_id: cmd.recipe_id,
            line: cmd.line.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_sub_recipe(
        &self,
        cmd: &RemoveSubRecipe,
    ) -> Result<Vec<RecipeEvent>, DomainError> {
        if self.sub_recipe(cmd.line_id).is_none() {
            return Err(DomainError::not_found("sub-recipe line"));
        }

        Ok(vec![RecipeEvent::SubRecipeRemoved(SubRecipeRemoved {
            recipe_id: cmd.recipe_id,
            line_id: cmd.line_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_attachment(&self, cmd: &AddAttachment) -> Result<Vec<RecipeEvent>, DomainError> {
        Self::ensure_name(&cmd.attachment.name)?;
        if cmd.attachment.doc_id.trim().is_empty() {
            return Err(DomainError::validation("attachment payload is required"));
        }
        if self.attachments.iter().any(|a| a.id == cmd.attachment.id) {
            return Err(DomainError::conflict("attachment already exists"));
        }
        if self.attachment_named(&cmd.attachment.name).is_some() {
            return Err(DomainError::conflict(format!(
                "an attachment named '{}' already exists",
                cmd.attachment.name
            )));
        }

        Ok(vec![RecipeEvent::AttachmentAdded(AttachmentAdded {
            recipe_id: cmd.recipe_id,
            attachment: cmd.attachment.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_attachment(
        &self,
        cmd: &RemoveAttachment,
    ) -> Result<Vec<RecipeEvent>, DomainError> {
        let attachment = self
            .attachments
            .iter()
            .find(|a| a.id == cmd.attachment_id)
            .ok_or_else(|| DomainError::not_found("attachment"))?;

        Ok(vec![RecipeEvent::AttachmentRemoved(AttachmentRemoved {
            recipe_id: cmd.recipe_id,
            attachment_id: cmd.attachment_id,
            doc_id: attachment.doc_id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_price(&self, cmd: &SetPrice) -> Result<Vec<RecipeEvent>, DomainError> {
        if cmd.price < Decimal::ZERO {
            return Err(DomainError::validation("price cannot be negative"));
        }

        Ok(vec![RecipeEvent::PriceSet(PriceSet {
            recipe_id: cmd.recipe_id,
            company_id: cmd.company_id,
            price: cmd.price,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record_cost_price(
        &self,
        cmd: &RecordCostPrice,
    ) -> Result<Vec<RecipeEvent>, DomainError> {
        if cmd.entry.cost < Decimal::ZERO || cmd.entry.price < Decimal::ZERO {
            return Err(DomainError::validation("cost and price cannot be negative"));
        }

        Ok(vec![RecipeEvent::CostPriceRecorded(CostPriceRecorded {
            recipe_id: cmd.recipe_id,
            entry: cmd.entry.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_archive(&self, cmd: &ArchiveRecipe) -> Result<Vec<RecipeEvent>, DomainError> {
        if !self.active {
            return Err(DomainError::conflict("recipe is already archived"));
        }

        Ok(vec![RecipeEvent::RecipeArchived(RecipeArchived {
            recipe_id: cmd.recipe_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_activate(&self, cmd: &ActivateRecipe) -> Result<Vec<RecipeEvent>, DomainError> {
        if self.active {
            return Err(DomainError::conflict("recipe is already active"));
        }

        Ok(vec![RecipeEvent::RecipeActivated(RecipeActivated {
            recipe_id: cmd.recipe_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
