//! Generation Coordinator
//!
//! Drives one generation job at a time for a single document:
//! `Idle → Submitting → Polling → Settled`, with `Failed` reachable from
//! `Submitting` (rejected) and `Polling` (retries exhausted, timeout, cancel).
//! The coordinator never mutates version history; poll results are handed to
//! the observer, which owns the version store.

use crate::backend::ContentBackend;
use crate::error::{CoordinatorError, FailureKind};
use crate::generation::comparator::{Baseline, ComparatorKind, CompletionComparator};
use crate::generation::task::{GenerationTask, TaskHandle, TaskStatus};
use crate::types::DocumentRef;
use crate::version::{GenerationPayload, Version};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, timeout_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Poll loop timing and retry budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub poll_interval: Duration,
    /// Polling longer than this fails the task with `Timeout`.
    pub max_poll_duration: Duration,
    /// Consecutive failed polls tolerated before the task fails.
    pub max_poll_retries: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1500),
            max_poll_duration: Duration::from_secs(300),
            max_poll_retries: 3,
        }
    }
}

/// Coordinator lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Submitting,
    Polling,
    Settled,
    Failed(FailureKind),
}

impl CoordinatorState {
    /// A job is in flight (new submissions conflict).
    pub fn is_active(&self) -> bool {
        matches!(self, CoordinatorState::Submitting | CoordinatorState::Polling)
    }
}

/// Receives poll results and terminal outcomes.
///
/// Called from the poll task, never while the coordinator's lock is held.
pub trait GenerationObserver: Send + Sync {
    /// Every successful poll, before completion is evaluated.
    fn on_poll(&self, task: &GenerationTask, versions: &[Version]);

    /// Exactly once per task, when the comparator reports completion.
    fn on_settled(&self, task: &GenerationTask, versions: Vec<Version>);

    /// Exactly once per task that fails on its own (not on `cancel`).
    fn on_failed(&self, task: &GenerationTask, failure: &FailureKind);
}

struct ActiveTask {
    task: GenerationTask,
    status_tx: Arc<watch::Sender<TaskStatus>>,
    poller: Option<JoinHandle<()>>,
}

struct Shared {
    state: CoordinatorState,
    /// Bumped on every start and cancel; stale poll loops compare against it.
    epoch: u64,
    active: Option<ActiveTask>,
}

impl Shared {
    fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch && self.state == CoordinatorState::Polling
    }

    /// Move the active task to a terminal status. Returns the finished task
    /// and its status channel, or None when the loop that asked is no longer
    /// current. Handles are signalled by the caller once the observer ran.
    fn finish(
        &mut self,
        epoch: u64,
        status: TaskStatus,
    ) -> Option<(GenerationTask, Arc<watch::Sender<TaskStatus>>)> {
        if !self.is_current(epoch) {
            return None;
        }
        self.state = match &status {
            TaskStatus::Failed { failure } => CoordinatorState::Failed(failure.clone()),
            _ => CoordinatorState::Settled,
        };
        let active = self.active.as_mut()?;
        active.poller = None;
        active.task.status = status;
        Some((active.task.clone(), Arc::clone(&active.status_tx)))
    }
}

/// Per-document generation state machine
pub struct GenerationCoordinator {
    document: DocumentRef,
    backend: Arc<dyn ContentBackend>,
    settings: PollSettings,
    comparator: ComparatorKind,
    shared: Arc<Mutex<Shared>>,
}

impl GenerationCoordinator {
    pub fn new(
        document: DocumentRef,
        backend: Arc<dyn ContentBackend>,
        settings: PollSettings,
        comparator: ComparatorKind,
    ) -> Self {
        Self {
            document,
            backend,
            settings,
            comparator,
            shared: Arc::new(Mutex::new(Shared {
                state: CoordinatorState::Idle,
                epoch: 0,
                active: None,
            })),
        }
    }

    pub fn document(&self) -> &DocumentRef {
        &self.document
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    pub fn state(&self) -> CoordinatorState {
        self.shared.lock().state.clone()
    }

    pub fn is_active(&self) -> bool {
        self.shared.lock().state.is_active()
    }

    /// Snapshot of the current (or most recent) task.
    pub fn active_task(&self) -> Option<GenerationTask> {
        self.shared.lock().active.as_ref().map(|a| a.task.clone())
    }

    /// Submit a generation job and start polling once the server acknowledges it.
    ///
    /// Returns after acknowledgement; completion is reported through the
    /// observer and the returned handle. Fails with `Conflict` while another
    /// job for this document is submitting or polling.
    pub async fn start(
        &self,
        payload: GenerationPayload,
        baseline: Baseline,
        observer: Arc<dyn GenerationObserver>,
    ) -> Result<TaskHandle, CoordinatorError> {
        let epoch = {
            let mut shared = self.shared.lock();
            if shared.state.is_active() {
                warn!(document = %self.document, "Rejecting duplicate generation request");
                return Err(CoordinatorError::Conflict(self.document.clone()));
            }
            shared.state = CoordinatorState::Submitting;
            shared.epoch += 1;
            shared.epoch
        };

        info!(
            document = %self.document,
            baseline_versions = baseline.count(),
            "Submitting generation request"
        );

        let ack = match self.backend.submit_generation(&self.document, &payload).await {
            Ok(ack) => ack,
            Err(source) => {
                let mut shared = self.shared.lock();
                if shared.epoch == epoch && shared.state == CoordinatorState::Submitting {
                    shared.state = CoordinatorState::Failed(FailureKind::SubmitRejected {
                        message: source.to_string(),
                    });
                }
                warn!(document = %self.document, error = %source, "Generation request rejected");
                return Err(CoordinatorError::GenerationSubmit {
                    document: self.document.clone(),
                    source,
                });
            }
        };

        let comparator = CompletionComparator::for_request(self.comparator, &baseline, &payload);
        let task = GenerationTask::new(ack.task_id, self.document.clone());
        let (status_tx, status_rx) = watch::channel(TaskStatus::Pending);

        let mut shared = self.shared.lock();
        if shared.epoch != epoch || shared.state != CoordinatorState::Submitting {
            warn!(
                document = %self.document,
                task_id = %task.task_id,
                "Generation cancelled before acknowledgement; server job left running"
            );
            return Err(CoordinatorError::Cancelled(self.document.clone()));
        }
        shared.state = CoordinatorState::Polling;

        let poll_loop = PollLoop {
            shared: Arc::clone(&self.shared),
            epoch,
            backend: Arc::clone(&self.backend),
            settings: self.settings.clone(),
            comparator,
            baseline,
            task: task.clone(),
            observer,
        };
        let poller = tokio::spawn(poll_loop.run());
        shared.active = Some(ActiveTask {
            task: task.clone(),
            status_tx: Arc::new(status_tx),
            poller: Some(poller),
        });
        drop(shared);

        info!(
            document = %self.document,
            task_id = %task.task_id,
            poll_interval_ms = self.settings.poll_interval.as_millis() as u64,
            "Generation acknowledged, polling for result"
        );
        Ok(TaskHandle::new(task, status_rx))
    }

    /// Stop polling immediately. Idempotent and safe in any state.
    ///
    /// An in-flight task ends as `Failed(Cancelled)`; the observer is not
    /// notified because the owner initiated it.
    pub fn cancel(&self) {
        let mut shared = self.shared.lock();
        match shared.state {
            CoordinatorState::Submitting => {
                shared.epoch += 1;
                shared.state = CoordinatorState::Failed(FailureKind::Cancelled);
                info!(document = %self.document, "Generation cancelled during submission");
            }
            CoordinatorState::Polling => {
                shared.epoch += 1;
                shared.state = CoordinatorState::Failed(FailureKind::Cancelled);
                if let Some(active) = shared.active.as_mut() {
                    if let Some(poller) = active.poller.take() {
                        poller.abort();
                    }
                    let status = TaskStatus::Failed {
                        failure: FailureKind::Cancelled,
                    };
                    active.task.status = status.clone();
                    let _ = active.status_tx.send(status);
                    info!(
                        document = %self.document,
                        task_id = %active.task.task_id,
                        "Generation polling cancelled"
                    );
                }
            }
            _ => {}
        }
    }
}

impl Drop for GenerationCoordinator {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct PollLoop {
    shared: Arc<Mutex<Shared>>,
    epoch: u64,
    backend: Arc<dyn ContentBackend>,
    settings: PollSettings,
    comparator: CompletionComparator,
    baseline: Baseline,
    task: GenerationTask,
    observer: Arc<dyn GenerationObserver>,
}

impl PollLoop {
    async fn run(self) {
        let started = Instant::now();
        let deadline = started + self.settings.max_poll_duration;
        let mut ticker = interval_at(started + self.settings.poll_interval, self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_failures: u32 = 0;
        let mut polls: u64 = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = sleep_until(deadline) => {
                    self.fail(FailureKind::Timeout { elapsed_ms: elapsed_ms(started) });
                    return;
                }
            }
            polls += 1;

            let fetched = match timeout_at(deadline, self.backend.fetch_versions(&self.task.document)).await {
                Ok(result) => result,
                Err(_) => {
                    self.fail(FailureKind::Timeout { elapsed_ms: elapsed_ms(started) });
                    return;
                }
            };

            match fetched {
                Ok(versions) => {
                    consecutive_failures = 0;
                    if !self.shared.lock().is_current(self.epoch) {
                        return;
                    }
                    self.observer.on_poll(&self.task, &versions);

                    if self.comparator.is_complete(&self.baseline, &versions) {
                        self.settle(versions, polls);
                        return;
                    }
                    debug!(
                        document = %self.task.document,
                        task_id = %self.task.task_id,
                        poll = polls,
                        observed = versions.len(),
                        "Generation still running"
                    );
                }
                Err(err) => {
                    consecutive_failures += 1;
                    if consecutive_failures > self.settings.max_poll_retries {
                        self.fail(FailureKind::PollRetriesExhausted {
                            attempts: consecutive_failures,
                            last_error: err.to_string(),
                        });
                        return;
                    }
                    warn!(
                        document = %self.task.document,
                        task_id = %self.task.task_id,
                        attempt = consecutive_failures,
                        max_retries = self.settings.max_poll_retries,
                        transient = err.is_transient(),
                        error = %err,
                        "Poll failed, retrying"
                    );
                }
            }
        }
    }

    fn settle(&self, versions: Vec<Version>, polls: u64) {
        let latest = versions
            .iter()
            .max_by_key(|v| v.version_number())
            .map(|v| v.id().clone());
        let finished = self
            .shared
            .lock()
            .finish(self.epoch, TaskStatus::Settled { latest: latest.clone() });
        if let Some((task, status_tx)) = finished {
            info!(
                document = %task.document,
                task_id = %task.task_id,
                polls,
                latest = ?latest,
                "Generation settled"
            );
            self.observer.on_settled(&task, versions);
            let _ = status_tx.send(task.status);
        }
    }

    fn fail(&self, failure: FailureKind) {
        let finished = self.shared.lock().finish(
            self.epoch,
            TaskStatus::Failed {
                failure: failure.clone(),
            },
        );
        if let Some((task, status_tx)) = finished {
            warn!(
                document = %task.document,
                task_id = %task.task_id,
                failure = %failure,
                "Generation failed"
            );
            self.observer.on_failed(&task, &failure);
            let _ = status_tx.send(task.status);
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
