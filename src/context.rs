//! Content Context
//!
//! Per-document façade composing the version store, generation coordinator
//! and selection reconciler. One context exists per mounted document view;
//! dropping it cancels any polling it started.

pub mod project;

pub use project::ProjectContexts;

use crate::backend::ContentBackend;
use crate::error::{CoordinatorError, FailureKind};
use crate::generation::{
    Baseline, ComparatorKind, CoordinatorState, GenerationCoordinator, GenerationObserver,
    GenerationTask, PollSettings, TaskHandle,
};
use crate::persistence::PersistenceAdapter;
use crate::selection::{
    ReconcileWarning, SelectMode, SelectionChange, SelectionPointer, SelectionReconciler,
};
use crate::store::{LoadOutcome, VersionStore};
use crate::types::{DocumentRef, TaskId, VersionId};
use crate::version::{GenerationPayload, Version};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 64;

/// Generation behaviour for one document kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextSettings {
    pub poll: PollSettings,
    pub comparator: ComparatorKind,
}

/// Notifications published to subscribers of a context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextEvent {
    Settled {
        document: DocumentRef,
        task_id: TaskId,
        selected: Option<VersionId>,
    },
    Failed {
        document: DocumentRef,
        task_id: TaskId,
        failure: FailureKind,
    },
    Warning {
        document: DocumentRef,
        warning: ReconcileWarning,
    },
    SelectionChanged {
        document: DocumentRef,
        from: Option<VersionId>,
        to: Option<VersionId>,
    },
}

struct ContextState {
    store: VersionStore,
    reconciler: SelectionReconciler,
    /// Set at submission, cleared only after the outcome has been reconciled.
    generating: bool,
    /// Bumped on every submission; a failed start only rolls back its own.
    submission: u64,
}

struct ContextShared {
    document: DocumentRef,
    state: Mutex<ContextState>,
    events: broadcast::Sender<ContextEvent>,
}

impl ContextShared {
    fn publish(&self, event: ContextEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn publish_change(&self, change: SelectionChange) {
        if let SelectionChange::Moved { from, to } = change {
            self.publish(ContextEvent::SelectionChanged {
                document: self.document.clone(),
                from,
                to,
            });
        }
    }
}

impl GenerationObserver for ContextShared {
    fn on_poll(&self, task: &GenerationTask, versions: &[Version]) {
        let outcome = self.state.lock().store.load(versions.to_vec());
        debug!(
            document = %self.document,
            task_id = %task.task_id,
            observed = versions.len(),
            outcome = ?outcome,
            "Poll result loaded"
        );
    }

    fn on_settled(&self, task: &GenerationTask, versions: Vec<Version>) {
        let (result, selected) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            state.store.load(versions);
            let result = state.reconciler.on_generation_settled(&state.store);
            state.generating = false;
            (result, state.reconciler.selected().cloned())
        };

        match result {
            Ok(change) => self.publish_change(change),
            Err(warning) => self.publish(ContextEvent::Warning {
                document: self.document.clone(),
                warning,
            }),
        }
        self.publish(ContextEvent::Settled {
            document: self.document.clone(),
            task_id: task.task_id.clone(),
            selected,
        });
    }

    fn on_failed(&self, task: &GenerationTask, failure: &FailureKind) {
        {
            let mut state = self.state.lock();
            state.reconciler.clear_pre_generation();
            state.generating = false;
        }
        self.publish(ContextEvent::Failed {
            document: self.document.clone(),
            task_id: task.task_id.clone(),
            failure: failure.clone(),
        });
    }
}

/// Version state and generation control for one document
pub struct ContentContext {
    shared: Arc<ContextShared>,
    backend: Arc<dyn ContentBackend>,
    coordinator: GenerationCoordinator,
}

impl ContentContext {
    /// Load versions and restore the persisted selection.
    ///
    /// A failed initial fetch leaves the store empty; the persisted selection
    /// is then restored on the first successful refresh.
    pub async fn mount(
        document: DocumentRef,
        backend: Arc<dyn ContentBackend>,
        persistence: Arc<dyn PersistenceAdapter>,
        settings: ContextSettings,
    ) -> Self {
        let mut store = VersionStore::new();
        match backend.fetch_versions(&document).await {
            Ok(versions) => {
                store.load(versions);
            }
            Err(e) => warn!(document = %document, error = %e, "Initial version fetch failed"),
        }
        match backend.fetch_latest_pointer(&document).await {
            Ok(pointer) => store.set_latest_pointer(pointer),
            Err(e) => debug!(document = %document, error = %e, "Latest pointer unavailable"),
        }

        let mut reconciler = SelectionReconciler::new(document.clone(), persistence);
        reconciler.mount(&store);
        info!(
            document = %document,
            versions = store.len(),
            selected = ?reconciler.selected(),
            "Content context mounted"
        );

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let coordinator = GenerationCoordinator::new(
            document.clone(),
            Arc::clone(&backend),
            settings.poll,
            settings.comparator,
        );
        Self {
            shared: Arc::new(ContextShared {
                document,
                state: Mutex::new(ContextState {
                    store,
                    reconciler,
                    generating: false,
                    submission: 0,
                }),
                events,
            }),
            backend,
            coordinator,
        }
    }

    pub fn document(&self) -> &DocumentRef {
        &self.shared.document
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContextEvent> {
        self.shared.events.subscribe()
    }

    /// The selected version, or None when there is nothing to display.
    pub fn current_version(&self) -> Option<Version> {
        let state = self.shared.state.lock();
        state
            .reconciler
            .selected()
            .and_then(|id| state.store.get_version(id))
            .cloned()
    }

    pub fn selected_version_id(&self) -> Option<VersionId> {
        self.shared.state.lock().reconciler.selected().cloned()
    }

    pub fn selection(&self) -> SelectionPointer {
        self.shared.state.lock().reconciler.pointer().clone()
    }

    pub fn versions(&self) -> Vec<Version> {
        self.shared.state.lock().store.versions().to_vec()
    }

    pub fn latest_version_id(&self) -> Option<VersionId> {
        self.shared.state.lock().store.latest_version_id().cloned()
    }

    pub fn latest_pointer(&self) -> Option<VersionId> {
        self.shared.state.lock().store.latest_pointer().cloned()
    }

    pub fn generating(&self) -> bool {
        self.shared.state.lock().generating
    }

    pub fn coordinator_state(&self) -> CoordinatorState {
        self.coordinator.state()
    }

    /// Start a generation job for this document.
    ///
    /// Returns once the server acknowledges the job. Fails with `Conflict`
    /// while a previous job is still generating.
    pub async fn submit(&self, payload: GenerationPayload) -> Result<TaskHandle, CoordinatorError> {
        let (baseline, ticket) = {
            let mut guard = self.shared.state.lock();
            let state = &mut *guard;
            if state.generating || self.coordinator.is_active() {
                warn!(document = %self.shared.document, "Generation already running");
                return Err(CoordinatorError::Conflict(self.shared.document.clone()));
            }
            state.generating = true;
            state.submission += 1;
            state.reconciler.record_pre_generation(&state.store);
            (Baseline::from_versions(state.store.versions()), state.submission)
        };

        let observer: Arc<dyn GenerationObserver> = self.shared.clone();
        match self.coordinator.start(payload, baseline, observer).await {
            Ok(handle) => Ok(handle),
            Err(e) => {
                let mut state = self.shared.state.lock();
                // A conflict means another job owns this state; a newer
                // ticket means a later submission does.
                if !e.is_conflict() && state.submission == ticket {
                    state.reconciler.clear_pre_generation();
                    state.generating = false;
                } else {
                    debug!(
                        document = %self.shared.document,
                        error = %e,
                        "Failed start left newer generation state in place"
                    );
                }
                Err(e)
            }
        }
    }

    /// Preview a version without persisting the choice.
    pub fn select_version(&self, id: &VersionId) -> Result<SelectionChange, CoordinatorError> {
        self.user_select(id, SelectMode::Preview)
    }

    /// Select a version and remember it across reloads.
    pub fn pin_version(&self, id: &VersionId) -> Result<SelectionChange, CoordinatorError> {
        self.user_select(id, SelectMode::Pin)
    }

    /// Return to following the latest version.
    pub fn select_latest(&self) -> Result<SelectionChange, CoordinatorError> {
        match self.latest_version_id() {
            Some(latest) => self.user_select(&latest, SelectMode::Preview),
            None => Ok(SelectionChange::Unchanged),
        }
    }

    fn user_select(&self, id: &VersionId, mode: SelectMode) -> Result<SelectionChange, CoordinatorError> {
        let change = {
            let mut guard = self.shared.state.lock();
            let state = &mut *guard;
            state.reconciler.on_user_selected(id, &state.store, mode)?
        };
        self.shared.publish_change(change.clone());
        Ok(change)
    }

    /// Re-fetch versions and reconcile as an unrelated refresh.
    pub async fn refresh(&self) -> Result<SelectionChange, CoordinatorError> {
        let versions = self
            .backend
            .fetch_versions(&self.shared.document)
            .await
            .map_err(|source| CoordinatorError::Poll {
                document: self.shared.document.clone(),
                source,
            })?;

        let change = {
            let mut guard = self.shared.state.lock();
            let state = &mut *guard;
            match state.store.load(versions) {
                LoadOutcome::Replaced => state.reconciler.on_external_refresh(&state.store),
                outcome => {
                    debug!(document = %self.shared.document, outcome = ?outcome, "Refresh ignored");
                    SelectionChange::Unchanged
                }
            }
        };
        self.shared.publish_change(change.clone());
        Ok(change)
    }

    /// Fetch the server's latest pointer; refreshes versions when it names
    /// one not yet loaded.
    pub async fn refresh_latest_pointer(&self) -> Result<Option<VersionId>, CoordinatorError> {
        let pointer = self
            .backend
            .fetch_latest_pointer(&self.shared.document)
            .await
            .map_err(|source| CoordinatorError::Poll {
                document: self.shared.document.clone(),
                source,
            })?;

        let ahead = {
            let mut state = self.shared.state.lock();
            state.store.set_latest_pointer(pointer.clone());
            state.store.pointer_is_ahead()
        };
        if ahead {
            debug!(document = %self.shared.document, pointer = ?pointer, "Latest pointer ahead of loaded versions");
            self.refresh().await?;
        }
        Ok(pointer)
    }

    /// Stop polling. Selection is left unchanged.
    pub fn cancel_generation(&self) {
        self.coordinator.cancel();
        let mut state = self.shared.state.lock();
        if state.generating {
            state.reconciler.clear_pre_generation();
            state.generating = false;
        }
    }

    /// Tear down the view; polling stops immediately.
    pub fn unmount(self) {
        self.cancel_generation();
        info!(document = %self.shared.document, "Content context unmounted");
    }
}
