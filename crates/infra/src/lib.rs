//! Infrastructure layer: in-memory storage, recipe service, translations,
//! attachments and configuration.

pub mod attachments;
pub mod catalog;
pub mod config;
pub mod repository;
pub mod service;
pub mod translation;


pub use attachments::{AttachmentError, AttachmentStore, InMemoryAttachmentStore, image_data_uri};
pub use catalog::{InMemoryCatalog, InMemoryPurchaseHistory};
pub use config::AppConfig;
pub use repository::{InMemoryRecipeRepository, RecipeRepository, RepositoryLookup};
pub use service::{RecipeService, ServiceError, ServiceResult};
pub use translation::{RECIPE_MODEL, RecipeText, TranslationStore, html_field_text, recipe_html_text};
