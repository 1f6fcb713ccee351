//! Attachment payload storage and rendering as data URIs.
//!
//! Recipe templates reference images by attachment name. A bare `name` points
//! at the rendering recipe's own attachments; `[[<recipe-id>]].<name>` points
//! at another recipe's.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use dishcost_recipes::RecipeId;

use crate::repository::RecipeRepository;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("invalid image reference: {0}")]
    InvalidReference(String),

    #[error("recipe not found: {0}")]
    RecipeNotFound(RecipeId),

    #[error("recipe {recipe} has no attachment named {name:?}")]
    MissingAttachment { recipe: RecipeId, name: String },

    #[error("attachment payload {0} is missing")]
    MissingPayload(String),
}

/// Binary payloads addressed by an opaque document id.
pub trait AttachmentStore: Send + Sync {
    fn put(&self, doc_id: &str, data: Vec<u8>);
    fn get(&self, doc_id: &str) -> Option<Vec<u8>>;
    /// Remove a payload; returns whether it existed.
    fn remove(&self, doc_id: &str) -> bool;
}

impl<S> AttachmentStore for Arc<S>
where
    S: AttachmentStore + ?Sized,
{
    fn put(&self, doc_id: &str, data: Vec<u8>) {
        (**self).put(doc_id, data)
    }

    fn get(&self, doc_id: &str) -> Option<Vec<u8>> {
        (**self).get(doc_id)
    }

    fn remove(&self, doc_id: &str) -> bool {
        (**self).remove(doc_id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAttachmentStore {
    inner: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AttachmentStore for InMemoryAttachmentStore {
    fn put(&self, doc_id: &str, data: Vec<u8>) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(doc_id.to_string(), data);
        }
    }

    fn get(&self, doc_id: &str) -> Option<Vec<u8>> {
        self.inner.read().ok()?.get(doc_id).cloned()
    }

    fn remove(&self, doc_id: &str) -> bool {
        match self.inner.write() {
            Ok(mut map) => map.remove(doc_id).is_some(),
            Err(_) => false,
        }
    }
}

/// Split an image reference into the owning recipe and attachment name.
pub fn parse_image_reference(current: RecipeId, reference: &str) -> Result<(RecipeId, &str), AttachmentError> {
    let Some(rest) = reference.strip_prefix("[[") else {
        return Ok((current, reference));
    };
    let (id, name) = rest
        .split_once("]].")
        .ok_or_else(|| AttachmentError::InvalidReference(reference.to_string()))?;
    let recipe = id
        .trim()
        .parse::<RecipeId>()
        .map_err(|_| AttachmentError::InvalidReference(reference.to_string()))?;
    if name.is_empty() {
        return Err(AttachmentError::InvalidReference(reference.to_string()));
    }
    Ok((recipe, name))
}

/// Mime type guessed from the file extension.
pub fn mime_type(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Render the referenced attachment as `data:<mime>;base64,<payload>`.
pub fn image_data_uri(
    recipes: &dyn RecipeRepository,
    store: &dyn AttachmentStore,
    current: RecipeId,
    reference: &str,
) -> Result<String, AttachmentError> {
    let (recipe_id, name) = parse_image_reference(current, reference)?;
    let recipe = recipes
        .get(recipe_id)
        .ok_or(AttachmentError::RecipeNotFound(recipe_id))?;
    let attachment = recipe
        .attachment_named(name)
        .ok_or_else(|| AttachmentError::MissingAttachment {
            recipe: recipe_id,
            name: name.to_string(),
        })?;
    let data = store
        .get(&attachment.doc_id)
        .ok_or_else(|| AttachmentError::MissingPayload(attachment.doc_id.clone()))?;

    let encoded = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, data);
    Ok(format!("data:{};base64,{}", mime_type(&attachment.name), encoded))
}
