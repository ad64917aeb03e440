//! Generation tasks and the handles returned to callers.

use crate::error::FailureKind;
use crate::types::{DocumentRef, TaskId, VersionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Status of one generation task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Settled { latest: Option<VersionId> },
    Failed { failure: FailureKind },
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }

    pub fn failure(&self) -> Option<&FailureKind> {
        match self {
            TaskStatus::Failed { failure } => Some(failure),
            _ => None,
        }
    }
}

/// One in-flight (or finished) generation job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationTask {
    pub task_id: TaskId,
    pub document: DocumentRef,
    pub submitted_at: DateTime<Utc>,
    pub status: TaskStatus,
}

impl GenerationTask {
    pub fn new(task_id: TaskId, document: DocumentRef) -> Self {
        Self {
            task_id,
            document,
            submitted_at: Utc::now(),
            status: TaskStatus::Pending,
        }
    }
}

/// Handle to an acknowledged task; completion is observed asynchronously.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    task: GenerationTask,
    status: watch::Receiver<TaskStatus>,
}

impl TaskHandle {
    pub(crate) fn new(task: GenerationTask, status: watch::Receiver<TaskStatus>) -> Self {
        Self { task, status }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task.task_id
    }

    pub fn document(&self) -> &DocumentRef {
        &self.task.document
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.task.submitted_at
    }

    /// Current status without waiting.
    pub fn status(&self) -> TaskStatus {
        self.status.borrow().clone()
    }

    /// Wait until the task reaches a terminal status.
    ///
    /// If the owning coordinator goes away first the task reports `Cancelled`.
    pub async fn wait(&mut self) -> TaskStatus {
        loop {
            let current = self.status.borrow_and_update().clone();
            if current.is_terminal() {
                return current;
            }
            if self.status.changed().await.is_err() {
                let last = self.status.borrow().clone();
                return if last.is_terminal() {
                    last
                } else {
                    TaskStatus::Failed {
                        failure: FailureKind::Cancelled,
                    }
                };
            }
        }
    }
}
