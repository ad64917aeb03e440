//! Selection Reconciliation
//!
//! Decides which version a document view displays as new data arrives.
//! Driven by explicit events: mount, generation settled, user selection, and
//! unrelated refreshes. The reconciler is the only writer of the persisted
//! selection for its document.

use crate::error::CoordinatorError;
use crate::persistence::{PersistedSelection, PersistenceAdapter};
use crate::store::VersionStore;
use crate::types::{DocumentRef, VersionId};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// The version a document view currently displays
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPointer {
    pub selected: Option<VersionId>,
    /// Set while the user views something other than latest; suppresses
    /// automatic advancement.
    pub user_override: bool,
}

/// How a user selection should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Look at a version without remembering the choice.
    Preview,
    /// Look at a version and remember it across reloads.
    Pin,
}

/// Effect of a reconciliation step on the pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    Unchanged,
    Moved {
        from: Option<VersionId>,
        to: Option<VersionId>,
    },
}

impl SelectionChange {
    pub fn is_moved(&self) -> bool {
        matches!(self, SelectionChange::Moved { .. })
    }
}

/// Recoverable anomalies reported to the caller
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileWarning {
    #[error("generation settled without producing a new version (latest: {latest:?})")]
    NoNewVersion { latest: Option<VersionId> },
}

pub struct SelectionReconciler {
    document: DocumentRef,
    persistence: Arc<dyn PersistenceAdapter>,
    pointer: SelectionPointer,
    /// `Some(latest)` between `record_pre_generation` and settlement.
    pre_generation_latest: Option<Option<VersionId>>,
    /// Persisted id read before any versions were loaded.
    pending_restore: Option<VersionId>,
}

impl SelectionReconciler {
    pub fn new(document: DocumentRef, persistence: Arc<dyn PersistenceAdapter>) -> Self {
        Self {
            document,
            persistence,
            pointer: SelectionPointer::default(),
            pre_generation_latest: None,
            pending_restore: None,
        }
    }

    pub fn pointer(&self) -> &SelectionPointer {
        &self.pointer
    }

    pub fn selected(&self) -> Option<&VersionId> {
        self.pointer.selected.as_ref()
    }

    pub fn is_user_override(&self) -> bool {
        self.pointer.user_override
    }

    /// Seed the pointer from the persisted selection, falling back to latest.
    pub fn mount(&mut self, store: &VersionStore) -> SelectionChange {
        let persisted = match PersistedSelection::load(self.persistence.as_ref(), &self.document) {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!(document = %self.document, error = %e, "Failed to read persisted selection");
                None
            }
        };

        match persisted {
            Some(record) if store.is_empty() => {
                debug!(
                    document = %self.document,
                    version_id = %record.selected_version_id,
                    "Deferring selection restore until versions load"
                );
                self.pending_restore = Some(record.selected_version_id);
                SelectionChange::Unchanged
            }
            Some(record) => self.restore(record.selected_version_id, store),
            None => {
                let latest = store.latest_version_id().cloned();
                self.set_pointer(latest, false)
            }
        }
    }

    fn restore(&mut self, version_id: VersionId, store: &VersionStore) -> SelectionChange {
        let latest = store.latest_version_id().cloned();
        if store.contains(&version_id) {
            let user_override = latest.as_ref() != Some(&version_id);
            info!(
                document = %self.document,
                version_id = %version_id,
                user_override,
                "Restored persisted selection"
            );
            self.set_pointer(Some(version_id), user_override)
        } else {
            let stale = CoordinatorError::StaleSelection {
                document: self.document.clone(),
                version_id,
            };
            warn!(error = %stale, "Falling back to latest version");
            self.set_pointer(latest, false)
        }
    }

    /// Remember the latest id right before a generation is submitted.
    pub fn record_pre_generation(&mut self, store: &VersionStore) {
        self.pre_generation_latest = Some(store.latest_version_id().cloned());
    }

    /// Forget a recorded baseline (submission failed or was cancelled).
    pub fn clear_pre_generation(&mut self) {
        self.pre_generation_latest = None;
    }

    /// Move to the newly generated version, or report that none appeared.
    pub fn on_generation_settled(
        &mut self,
        store: &VersionStore,
    ) -> Result<SelectionChange, ReconcileWarning> {
        let before = self.pre_generation_latest.take().flatten();
        self.pending_restore = None;
        let latest = store.latest_version_id().cloned();

        match latest {
            Some(new_latest) if Some(&new_latest) != before.as_ref() => {
                let change = self.set_pointer(Some(new_latest.clone()), false);
                self.persist_logged(&new_latest);
                Ok(change)
            }
            latest => {
                warn!(
                    document = %self.document,
                    latest = ?latest,
                    "Generation settled without a new version"
                );
                Err(ReconcileWarning::NoNewVersion { latest })
            }
        }
    }

    /// Explicit navigation to an existing version.
    pub fn on_user_selected(
        &mut self,
        version_id: &VersionId,
        store: &VersionStore,
        mode: SelectMode,
    ) -> Result<SelectionChange, CoordinatorError> {
        if !store.contains(version_id) {
            return Err(CoordinatorError::UnknownVersion(version_id.clone()));
        }
        self.pending_restore = None;
        let user_override = store.latest_version_id() != Some(version_id);
        let change = self.set_pointer(Some(version_id.clone()), user_override);
        if mode == SelectMode::Pin {
            PersistedSelection::new(&self.document, version_id.clone())
                .store(self.persistence.as_ref(), &self.document)?;
        }
        Ok(change)
    }

    /// Reconcile after a refresh that was not caused by this document's generation.
    pub fn on_external_refresh(&mut self, store: &VersionStore) -> SelectionChange {
        if let Some(pending) = self.pending_restore.take() {
            if store.is_empty() {
                self.pending_restore = Some(pending);
                return SelectionChange::Unchanged;
            }
            return self.restore(pending, store);
        }

        if self.pointer.user_override {
            return SelectionChange::Unchanged;
        }

        let Some(latest) = store.latest_version() else {
            return SelectionChange::Unchanged;
        };
        let latest_id = latest.id().clone();

        match self.pointer.selected.as_ref().map(|id| store.get_version(id)) {
            None | Some(None) => self.set_pointer(Some(latest_id), false),
            Some(Some(current)) if latest.version_number() > current.version_number() => {
                let change = self.set_pointer(Some(latest_id.clone()), false);
                self.persist_logged(&latest_id);
                change
            }
            Some(Some(_)) => SelectionChange::Unchanged,
        }
    }

    fn set_pointer(&mut self, to: Option<VersionId>, user_override: bool) -> SelectionChange {
        self.pointer.user_override = user_override && to.is_some();
        if self.pointer.selected == to {
            return SelectionChange::Unchanged;
        }
        let from = std::mem::replace(&mut self.pointer.selected, to.clone());
        debug!(document = %self.document, from = ?from, to = ?to, "Selection moved");
        SelectionChange::Moved { from, to }
    }

    fn persist_logged(&self, version_id: &VersionId) {
        let record = PersistedSelection::new(&self.document, version_id.clone());
        if let Err(e) = record.store(self.persistence.as_ref(), &self.document) {
            warn!(
                document = %self.document,
                version_id = %version_id,
                error = %e,
                "Failed to persist selection"
            );
        }
    }
}
