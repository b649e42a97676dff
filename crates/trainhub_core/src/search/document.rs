//! Search document shape and mirror contract.

use super::SearchResult;
use crate::model::{EntityId, EntityKind};
use serde::Serialize;
use serde_json::Value;

/// One mirrored catalog record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchDocument {
    pub kind: EntityKind,
    pub entity_id: EntityId,
    /// Denormalized JSON body (trains embed station/company/hall fields).
    pub body: Value,
    /// Free text fed to the keyword index.
    pub search_text: String,
}

impl SearchDocument {
    pub fn new(kind: EntityKind, entity_id: EntityId, body: Value, search_text: String) -> Self {
        Self {
            kind,
            entity_id,
            body,
            search_text,
        }
    }
}

/// Read index kept eventually consistent with the entity store.
pub trait SearchMirror {
    /// Inserts or replaces the document for `(document.kind, document.entity_id)`.
    fn upsert(&self, document: &SearchDocument) -> SearchResult<()>;
    /// Removes the document; removing an absent document is not an error.
    fn remove(&self, kind: EntityKind, entity_id: EntityId) -> SearchResult<()>;
}
