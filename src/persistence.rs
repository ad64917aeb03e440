//! Selection Persistence
//!
//! Key/value storage used to remember the user's last selected version per
//! document across reloads. Shared by all documents of a parent and
//! partitioned by key; each key has exactly one writer (its reconciler).

pub mod memory;
pub mod selection;
pub mod sled_store;

pub use memory::MemoryPersistence;
pub use selection::{selection_key, PersistedSelection};
pub use sled_store::SledPersistence;

use crate::error::StorageError;

/// Key/value store scoped to a parent entity
pub trait PersistenceAdapter: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
