//! In-process content backend driven by scripted responses.
//!
//! Used by tests and offline runs. Each document has a server-side version
//! list; `fetch_versions` first drains any scripted poll responses and then
//! falls back to the server-side list.

use crate::backend::{ContentBackend, TaskAck};
use crate::error::BackendError;
use crate::types::{DocumentRef, TaskId, VersionId};
use crate::version::{GenerationPayload, Version};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
struct DocumentScript {
    versions: Vec<Version>,
    latest_pointer: Option<VersionId>,
    poll_responses: VecDeque<Result<Vec<Version>, BackendError>>,
    submit_responses: VecDeque<Result<TaskAck, BackendError>>,
}

#[derive(Debug, Default)]
pub struct ScriptedBackend {
    documents: Mutex<HashMap<DocumentRef, DocumentScript>>,
    submissions: Mutex<Vec<(DocumentRef, GenerationPayload)>>,
    fetch_delay: Mutex<Option<Duration>>,
    submit_delay: Mutex<Option<Duration>>,
    fetch_count: AtomicUsize,
    task_counter: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server-side version list of a document.
    pub fn set_versions(&self, document: &DocumentRef, versions: Vec<Version>) {
        let mut docs = self.documents.lock();
        let script = docs.entry(document.clone()).or_default();
        script.latest_pointer = versions
            .iter()
            .max_by_key(|v| v.version_number())
            .map(|v| v.id().clone());
        script.versions = versions;
    }

    /// Append a version to the server-side list (a job finishing).
    pub fn append_version(&self, document: &DocumentRef, version: Version) {
        let mut docs = self.documents.lock();
        let script = docs.entry(document.clone()).or_default();
        script.latest_pointer = Some(version.id().clone());
        script.versions.push(version);
    }

    pub fn set_latest_pointer(&self, document: &DocumentRef, pointer: Option<VersionId>) {
        self.documents
            .lock()
            .entry(document.clone())
            .or_default()
            .latest_pointer = pointer;
    }

    /// Queue a response for the next `fetch_versions` call.
    pub fn push_poll(&self, document: &DocumentRef, response: Result<Vec<Version>, BackendError>) {
        self.documents
            .lock()
            .entry(document.clone())
            .or_default()
            .poll_responses
            .push_back(response);
    }

    /// Queue a response for the next `submit_generation` call.
    pub fn push_submit(&self, document: &DocumentRef, response: Result<TaskAck, BackendError>) {
        self.documents
            .lock()
            .entry(document.clone())
            .or_default()
            .submit_responses
            .push_back(response);
    }

    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        *self.fetch_delay.lock() = delay;
    }

    pub fn set_submit_delay(&self, delay: Option<Duration>) {
        *self.submit_delay.lock() = delay;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<(DocumentRef, GenerationPayload)> {
        self.submissions.lock().clone()
    }

    pub fn submit_count(&self) -> usize {
        self.submissions.lock().len()
    }
}

#[async_trait]
impl ContentBackend for ScriptedBackend {
    async fn submit_generation(
        &self,
        document: &DocumentRef,
        payload: &GenerationPayload,
    ) -> Result<TaskAck, BackendError> {
        let delay = *self.submit_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.submissions
            .lock()
            .push((document.clone(), payload.clone()));
        let scripted = self
            .documents
            .lock()
            .get_mut(document)
            .and_then(|s| s.submit_responses.pop_front());
        match scripted {
            Some(response) => response,
            None => {
                let n = self.task_counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(TaskAck {
                    task_id: TaskId::new(format!("task-{}", n)),
                })
            }
        }
    }

    async fn fetch_versions(&self, document: &DocumentRef) -> Result<Vec<Version>, BackendError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut docs = self.documents.lock();
        let script = docs.entry(document.clone()).or_default();
        match script.poll_responses.pop_front() {
            Some(response) => response,
            None => Ok(script.versions.clone()),
        }
    }

    async fn fetch_latest_pointer(
        &self,
        document: &DocumentRef,
    ) -> Result<Option<VersionId>, BackendError> {
        Ok(self
            .documents
            .lock()
            .get(document)
            .and_then(|s| s.latest_pointer.clone()))
    }
}
