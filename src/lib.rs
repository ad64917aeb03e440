//! Scriptsync: Version & Generation Coordination
//!
//! Submits long-running content generation jobs, polls until a new version of
//! the document appears, reconciles which version the user is looking at, and
//! remembers that choice across reloads.

pub mod backend;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod generation;
pub mod logging;
pub mod persistence;
pub mod selection;
pub mod store;
pub mod types;
pub mod version;

pub use context::{ContentContext, ContextEvent, ContextSettings, ProjectContexts};
pub use error::{BackendError, CoordinatorError, FailureKind, StorageError};
pub use types::{DocumentKind, DocumentRef, ParentId, SceneKey, TaskId, VersionId};
pub use version::{GenerationPayload, Version};
