//! Content Backend Abstraction
//!
//! The remote collaborator that runs generation jobs and serves version
//! history. Only the shape of the contract matters to the coordinator; the
//! wire protocol lives in the implementations.

use crate::error::BackendError;
use crate::types::{DocumentRef, TaskId, VersionId};
use crate::version::{GenerationPayload, Version};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod http;
pub mod scripted;

pub use http::HttpBackend;
pub use scripted::ScriptedBackend;

/// Server acknowledgement of a generation job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAck {
    pub task_id: TaskId,
}

/// Content backend client trait
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Start a background generation job for the document.
    async fn submit_generation(
        &self,
        document: &DocumentRef,
        payload: &GenerationPayload,
    ) -> Result<TaskAck, BackendError>;

    /// Fetch the document's full version list.
    async fn fetch_versions(&self, document: &DocumentRef) -> Result<Vec<Version>, BackendError>;

    /// Fetch the server's "latest version" pointer for the document.
    async fn fetch_latest_pointer(
        &self,
        document: &DocumentRef,
    ) -> Result<Option<VersionId>, BackendError>;
}
