//! Localized text overrides for recipe fields.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use dishcost_costing::CostContext;
use dishcost_recipes::Recipe;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranslationKey {
    pub model: String,
    pub field: String,
    pub res_id: String,
    pub lang: String,
}

/// Translations keyed by `(model, field, record, language)`.
#[derive(Debug, Default)]
pub struct TranslationStore {
    inner: RwLock<HashMap<TranslationKey, String>>,
}

impl TranslationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, model: &str, field: &str, res_id: &str, lang: &str, value: impl Into<String>) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(key(model, field, res_id, lang), value.into());
        }
    }

    pub fn get(&self, model: &str, field: &str, res_id: &str, lang: &str) -> Option<String> {
        self.inner
            .read()
            .ok()?
            .get(&key(model, field, res_id, lang))
            .cloned()
    }
}

fn key(model: &str, field: &str, res_id: &str, lang: &str) -> TranslationKey {
    TranslationKey {
        model: model.to_string(),
        field: field.to_string(),
        res_id: res_id.to_string(),
        lang: lang.to_string(),
    }
}

/// Text of a field for HTML display, in `lang` when a translation exists.
///
/// Newlines become `<br/>`. No language (or an empty one) skips the lookup.
pub fn html_field_text(
    store: &TranslationStore,
    model: &str,
    field: &str,
    res_id: &str,
    text: &str,
    lang: Option<&str>,
) -> String {
    let translated = lang
        .filter(|l| !l.is_empty())
        .and_then(|l| store.get(model, field, res_id, l));
    translated.as_deref().unwrap_or(text).replace('\n', "<br/>")
}

/// Model name recipe translations are stored under.
pub const RECIPE_MODEL: &str = "dish_recipe.recipe";

/// Translatable text fields of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeText {
    Name,
    Description,
    Preparation,
}

impl RecipeText {
    pub fn field(self) -> &'static str {
        match self {
            RecipeText::Name => "name",
            RecipeText::Description => "description",
            RecipeText::Preparation => "preparation",
        }
    }
}

/// A recipe text field for HTML display in the context's language.
pub fn recipe_html_text(store: &TranslationStore, recipe: &Recipe, field: RecipeText, ctx: &CostContext) -> String {
    let text = match field {
        RecipeText::Name => recipe.name(),
        RecipeText::Description => recipe.description().unwrap_or_default(),
        RecipeText::Preparation => recipe.preparation().unwrap_or_default(),
    };
    html_field_text(
        store,
        RECIPE_MODEL,
        field.field(),
        &recipe.id_typed().to_string(),
        text,
        ctx.language(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dishcost_core::{Aggregate, CompanyId};
    use dishcost_recipes::{CreateRecipe, RecipeCommand, RecipeId};

    const MODEL: &str = RECIPE_MODEL;

    #[test]
    fn without_language_returns_stored_text() {
        let store = TranslationStore::new();
        store.set(MODEL, "preparation", "1", "es", "Hervir.\nServir.");

        assert_eq!(
            html_field_text(&store, MODEL, "preparation", "1", "Boil.\nServe.", None),
            "Boil.<br/>Serve."
        );
        assert_eq!(
            html_field_text(&store, MODEL, "preparation", "1", "Boil.\nServe.", Some("")),
            "Boil.<br/>Serve."
        );
    }

    #[test]
    fn uses_translation_when_present() {
        let store = TranslationStore::new();
        store.set(MODEL, "preparation", "1", "es", "Hervir.\nServir.");

        assert_eq!(
            html_field_text(&store, MODEL, "preparation", "1", "Boil.", Some("es")),
            "Hervir.<br/>Servir."
        );
    }

    #[test]
    fn falls_back_to_stored_text() {
        let store = TranslationStore::new();
        store.set(MODEL, "preparation", "1", "es", "Hervir.");

        assert_eq!(
            html_field_text(&store, MODEL, "preparation", "2", "Boil.\n", Some("es")),
            "Boil.<br/>"
        );
        assert_eq!(
            html_field_text(&store, MODEL, "preparation", "1", "Boil.", Some("ca")),
            "Boil."
        );
    }

    #[test]
    fn recipe_text_follows_context_language() {
        let recipe_id = RecipeId::generate();
        let mut recipe = Recipe::empty(recipe_id);
        let events = recipe
            .handle(&RecipeCommand::CreateRecipe(CreateRecipe {
                recipe_id,
                name: "Paella".to_string(),
                description: None,
                preparation: Some("Fry.\nSimmer.".to_string()),
                category: None,
                product: None,
                sequence: 0,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        for event in &events {
            recipe.apply(event);
        }

        let store = TranslationStore::new();
        store.set(RECIPE_MODEL, "preparation", &recipe_id.to_string(), "es", "Sofreír.\nCocer.");
        let ctx = CostContext::new(CompanyId::new());

        assert_eq!(
            recipe_html_text(&store, &recipe, RecipeText::Preparation, &ctx),
            "Fry.<br/>Simmer."
        );
        assert_eq!(
            recipe_html_text(&store, &recipe, RecipeText::Preparation, &ctx.clone().with_language("es")),
            "Sofreír.<br/>Cocer."
        );
        assert_eq!(recipe_html_text(&store, &recipe, RecipeText::Description, &ctx), "");
        assert_eq!(recipe_html_text(&store, &recipe, RecipeText::Name, &ctx.with_language("es")), "Paella");
    }
}
