//! Persisted selection records and their key format.

use crate::error::StorageError;
use crate::persistence::PersistenceAdapter;
use crate::types::{DocumentRef, ParentId, VersionId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Key under which a document's selection is stored:
/// `"{parentId}_{documentKind}_selectedVersion"`.
pub fn selection_key(document: &DocumentRef) -> String {
    format!(
        "{}_{}_selectedVersion",
        document.parent_id,
        document.kind_segment()
    )
}

/// Selected version remembered across reloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSelection {
    pub parent_id: ParentId,
    pub document_kind: String,
    pub selected_version_id: VersionId,
}

impl PersistedSelection {
    pub fn new(document: &DocumentRef, selected_version_id: VersionId) -> Self {
        Self {
            parent_id: document.parent_id.clone(),
            document_kind: document.kind_segment(),
            selected_version_id,
        }
    }

    /// Decode a stored value.
    ///
    /// Accepts the JSON record as well as a bare version id, which is what
    /// older clients wrote under the same key. A record naming a different
    /// document is treated as absent.
    pub fn decode(document: &DocumentRef, raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('{') {
            return match serde_json::from_str::<PersistedSelection>(trimmed) {
                Ok(record) if record.belongs_to(document) => Some(record),
                Ok(record) => {
                    debug!(
                        document = %document,
                        parent_id = %record.parent_id,
                        document_kind = %record.document_kind,
                        "Persisted selection belongs to another document"
                    );
                    None
                }
                Err(e) => {
                    debug!(document = %document, error = %e, "Unreadable persisted selection");
                    None
                }
            };
        }
        Some(Self::new(document, VersionId::new(trimmed)))
    }

    fn belongs_to(&self, document: &DocumentRef) -> bool {
        self.parent_id == document.parent_id && self.document_kind == document.kind_segment()
    }

    pub fn encode(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(|e| {
            StorageError::Serialization(format!("Failed to serialize selection: {}", e))
        })
    }

    pub fn load(
        adapter: &dyn PersistenceAdapter,
        document: &DocumentRef,
    ) -> Result<Option<Self>, StorageError> {
        Ok(adapter
            .get(&selection_key(document))?
            .and_then(|raw| Self::decode(document, &raw)))
    }

    pub fn store(
        &self,
        adapter: &dyn PersistenceAdapter,
        document: &DocumentRef,
    ) -> Result<(), StorageError> {
        adapter.set(&selection_key(document), &self.encode()?)
    }
}
