//! Content Versions
//!
//! Immutable, numbered snapshots of a document's content. Edits and generations
//! always produce a new version; an existing version never changes.

use crate::types::VersionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One immutable snapshot of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    id: VersionId,
    version_number: u64,
    #[serde(default)]
    version_label: Option<String>,
    #[serde(default)]
    text_seed: Option<String>,
    #[serde(default)]
    text_content: Option<String>,
    #[serde(default)]
    text_notes: Option<String>,
    #[serde(default)]
    character_count: u64,
    created_at: DateTime<Utc>,
    #[serde(default)]
    created_by: Option<String>,
    #[serde(default)]
    llm_model: Option<String>,
}

impl Version {
    /// Create a version with the given content.
    ///
    /// `character_count` is derived from the content when not supplied by the server.
    pub fn new(id: impl Into<VersionId>, version_number: u64, text_content: impl Into<String>) -> Self {
        let text_content = text_content.into();
        Self {
            id: id.into(),
            version_number,
            version_label: None,
            text_seed: None,
            character_count: text_content.chars().count() as u64,
            text_content: Some(text_content),
            text_notes: None,
            created_at: Utc::now(),
            created_by: None,
            llm_model: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.version_label = Some(label.into());
        self
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.text_seed = Some(seed.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.text_notes = Some(notes.into());
        self
    }

    pub fn with_author(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    pub fn with_model(mut self, llm_model: impl Into<String>) -> Self {
        self.llm_model = Some(llm_model.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> &VersionId {
        &self.id
    }

    pub fn version_number(&self) -> u64 {
        self.version_number
    }

    pub fn version_label(&self) -> Option<&str> {
        self.version_label.as_deref()
    }

    pub fn text_seed(&self) -> Option<&str> {
        self.text_seed.as_deref()
    }

    pub fn text_content(&self) -> Option<&str> {
        self.text_content.as_deref()
    }

    pub fn text_notes(&self) -> Option<&str> {
        self.text_notes.as_deref()
    }

    pub fn character_count(&self) -> u64 {
        self.character_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn llm_model(&self) -> Option<&str> {
        self.llm_model.as_deref()
    }

    /// Label for display: the human label if present, otherwise `v{number}`.
    pub fn display_label(&self) -> String {
        match &self.version_label {
            Some(label) if !label.trim().is_empty() => label.clone(),
            _ => format!("v{}", self.version_number),
        }
    }
}

/// Input of a generation request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_seed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    /// Number of documents the job is expected to produce (bulk scene generation).
    #[serde(default = "default_requested_count")]
    pub requested_count: usize,
}

fn default_requested_count() -> usize {
    1
}

impl GenerationPayload {
    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            text_seed: Some(seed.into()),
            requested_count: 1,
            ..Default::default()
        }
    }

    pub fn from_notes(notes: impl Into<String>) -> Self {
        Self {
            text_notes: Some(notes.into()),
            requested_count: 1,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, llm_model: impl Into<String>) -> Self {
        self.llm_model = Some(llm_model.into());
        self
    }

    pub fn with_requested_count(mut self, count: usize) -> Self {
        self.requested_count = count.max(1);
        self
    }
}
