//! Version Store
//!
//! In-memory version history of one document plus the server-authoritative
//! latest pointer. The store is the only writer of version history.

use crate::types::VersionId;
use crate::version::Version;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Result of [`VersionStore::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The version list was replaced.
    Replaced,
    /// Empty input; prior state kept to avoid flicker on transient empty responses.
    IgnoredEmpty,
    /// Input was an older snapshot than the one already loaded (late response).
    IgnoredStale,
}

/// Version history for one document
#[derive(Debug, Default, Clone)]
pub struct VersionStore {
    /// Sorted by `version_number` ascending.
    versions: Vec<Version>,
    index: HashMap<VersionId, usize>,
    latest_pointer: Option<VersionId>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the known version list.
    ///
    /// Responses can arrive out of order, so a snapshot whose ids are all
    /// already known and whose highest version number is below the current
    /// highest is treated as late and ignored.
    pub fn load(&mut self, versions: Vec<Version>) -> LoadOutcome {
        if versions.is_empty() {
            debug!(known = self.versions.len(), "Ignoring empty version list");
            return LoadOutcome::IgnoredEmpty;
        }

        let mut seen = HashSet::new();
        let mut incoming: Vec<Version> = versions
            .into_iter()
            .filter(|v| seen.insert(v.id().clone()))
            .collect();
        incoming.sort_by_key(|v| v.version_number());

        if self.is_stale_snapshot(&incoming) {
            debug!(
                incoming = incoming.len(),
                known = self.versions.len(),
                "Ignoring stale version snapshot"
            );
            return LoadOutcome::IgnoredStale;
        }

        self.index = incoming
            .iter()
            .enumerate()
            .map(|(pos, v)| (v.id().clone(), pos))
            .collect();
        self.versions = incoming;
        LoadOutcome::Replaced
    }

    fn is_stale_snapshot(&self, incoming: &[Version]) -> bool {
        let (Some(current_max), Some(incoming_max)) = (
            self.versions.last().map(Version::version_number),
            incoming.last().map(Version::version_number),
        ) else {
            return false;
        };
        incoming_max < current_max && incoming.iter().all(|v| self.index.contains_key(v.id()))
    }

    /// Id of the version with the highest version number.
    pub fn latest_version_id(&self) -> Option<&VersionId> {
        self.versions.last().map(Version::id)
    }

    pub fn latest_version(&self) -> Option<&Version> {
        self.versions.last()
    }

    pub fn get_version(&self, id: &VersionId) -> Option<&Version> {
        self.index.get(id).map(|&pos| &self.versions[pos])
    }

    pub fn contains(&self, id: &VersionId) -> bool {
        self.index.contains_key(id)
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn version_ids(&self) -> HashSet<VersionId> {
        self.index.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Record the server's latest pointer (independent of the version list).
    pub fn set_latest_pointer(&mut self, pointer: Option<VersionId>) {
        self.latest_pointer = pointer;
    }

    pub fn latest_pointer(&self) -> Option<&VersionId> {
        self.latest_pointer.as_ref()
    }

    /// True when the server pointer names a version this store has not loaded.
    pub fn pointer_is_ahead(&self) -> bool {
        self.latest_pointer
            .as_ref()
            .is_some_and(|id| !self.index.contains_key(id))
    }
}
