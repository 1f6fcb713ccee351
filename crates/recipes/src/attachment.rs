//! Recipe attachments (images, technical sheets).

use serde::{Deserialize, Serialize};

use dishcost_core::{Entity, typed_id};

typed_id!(
    /// Attachment identifier.
    AttachmentId
);

/// Attachment metadata. The binary payload lives in the attachment store,
/// addressed by `doc_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub name: String,
    pub description: Option<String>,
    pub doc_id: String,
}

impl Entity for Attachment {
    type Id = AttachmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
