//! Sled-backed persistence adapter

use crate::error::StorageError;
use crate::persistence::PersistenceAdapter;
use std::path::Path;

const SELECTION_TREE: &str = "selections";

/// Sled-based implementation of PersistenceAdapter
pub struct SledPersistence {
    db: sled::Db,
    selections: sled::Tree,
}

impl SledPersistence {
    /// Open (or create) a sled database at the given directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path.as_ref()).map_err(|e| {
            StorageError::Database(format!(
                "Failed to open sled database at {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;
        Self::from_db(db)
    }

    /// Use an already opened database (shared with other trees).
    pub fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        let selections = db.open_tree(SELECTION_TREE)?;
        Ok(Self { db, selections })
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    /// List all stored keys
    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for item in self.selections.iter() {
            let (key, _) = item?;
            keys.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(keys)
    }
}

impl PersistenceAdapter for SledPersistence {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.selections.get(key.as_bytes())? {
            Some(value) => {
                let text = String::from_utf8(value.to_vec()).map_err(|e| {
                    StorageError::Serialization(format!(
                        "Stored value for {} is not UTF-8: {}",
                        key, e
                    ))
                })?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.selections.insert(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.selections.remove(key.as_bytes())?;
        Ok(())
    }
}
