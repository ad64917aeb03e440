//! Error types for the version and generation coordinator.

use crate::types::{DocumentRef, VersionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage-related errors (persistence adapters)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

/// Errors reported by a content backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Network or server availability problem; pollers retry these.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server understood the request and refused it.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Whether a poller may retry after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Transport(_))
    }
}

/// Why a generation task ended in the `Failed` state.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    #[error("polling failed {attempts} consecutive times: {last_error}")]
    PollRetriesExhausted { attempts: u32, last_error: String },

    #[error("polling exceeded the maximum duration after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    #[error("generation task was cancelled")]
    Cancelled,

    #[error("generation request was rejected: {message}")]
    SubmitRejected { message: String },
}

impl FailureKind {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FailureKind::Timeout { .. })
    }
}

/// Coordinator errors surfaced to callers of the content context
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("A generation is already running for {0}")]
    Conflict(DocumentRef),

    #[error("Generation request for {document} was rejected: {source}")]
    GenerationSubmit {
        document: DocumentRef,
        #[source]
        source: BackendError,
    },

    #[error("Polling {document} failed: {source}")]
    Poll {
        document: DocumentRef,
        #[source]
        source: BackendError,
    },

    #[error("Generation for {document} timed out after {elapsed_ms} ms")]
    Timeout {
        document: DocumentRef,
        elapsed_ms: u64,
    },

    #[error("Persisted selection {version_id} for {document} no longer exists")]
    StaleSelection {
        document: DocumentRef,
        version_id: VersionId,
    },

    #[error("Generation for {0} was cancelled")]
    Cancelled(DocumentRef),

    #[error("Version not found: {0}")]
    UnknownVersion(VersionId),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoordinatorError {
    /// Maps a terminal task failure to the error reported to the caller.
    pub fn from_failure(document: DocumentRef, failure: FailureKind) -> Self {
        match failure {
            FailureKind::PollRetriesExhausted { last_error, .. } => CoordinatorError::Poll {
                document,
                source: BackendError::Transport(last_error),
            },
            FailureKind::Timeout { elapsed_ms } => CoordinatorError::Timeout {
                document,
                elapsed_ms,
            },
            FailureKind::Cancelled => CoordinatorError::Cancelled(document),
            FailureKind::SubmitRejected { message } => CoordinatorError::GenerationSubmit {
                document,
                source: BackendError::Rejected(message),
            },
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CoordinatorError::Conflict(_))
    }
}

impl From<config::ConfigError> for CoordinatorError {
    fn from(err: config::ConfigError) -> Self {
        CoordinatorError::Config(err.to_string())
    }
}
