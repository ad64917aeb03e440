//! Configuration System
//!
//! Layered configuration: built-in defaults, the user-level file, workspace
//! files, then `SCRIPTSYNC_*` environment variables. Loaded values are checked
//! with [`ScriptsyncConfig::validate`] before use.

use crate::context::ContextSettings;
use crate::generation::{ComparatorKind, PollSettings};
use crate::logging::LoggingConfig;
use crate::types::DocumentKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

mod loader;
mod merge;
mod sources;

pub use loader::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptsyncConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Content backend connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// GraphQL endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_endpoint() -> String {
    "http://localhost:8080/graphql".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(format!(
                "Endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            ));
        }
        if self.connect_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err("Timeouts must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Completion comparator per document kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparatorConfig {
    #[serde(default)]
    pub story: ComparatorKind,
    #[serde(default)]
    pub scene: ComparatorKind,
    #[serde(default)]
    pub script: ComparatorKind,
}

impl ComparatorConfig {
    pub fn for_kind(&self, kind: DocumentKind) -> ComparatorKind {
        match kind {
            DocumentKind::Story => self.story,
            DocumentKind::Scene => self.scene,
            DocumentKind::Script => self.script,
        }
    }
}

/// Polling behaviour of generation jobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Polling stops with a timeout failure after this long
    #[serde(default = "default_max_poll_duration_secs")]
    pub max_poll_duration_secs: u64,

    /// Consecutive failed polls tolerated before giving up
    #[serde(default = "default_max_poll_retries")]
    pub max_poll_retries: u32,

    #[serde(default)]
    pub comparators: ComparatorConfig,
}

fn default_poll_interval_ms() -> u64 {
    1_500
}

fn default_max_poll_duration_secs() -> u64 {
    300
}

fn default_max_poll_retries() -> u32 {
    3
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_duration_secs: default_max_poll_duration_secs(),
            max_poll_retries: default_max_poll_retries(),
            comparators: ComparatorConfig::default(),
        }
    }
}

impl GenerationConfig {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_poll_duration: Duration::from_secs(self.max_poll_duration_secs),
            max_poll_retries: self.max_poll_retries,
        }
    }

    pub fn settings_for(&self, kind: DocumentKind) -> ContextSettings {
        ContextSettings {
            poll: self.poll_settings(),
            comparator: self.comparators.for_kind(kind),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than zero".to_string());
        }
        if self.max_poll_duration_secs.saturating_mul(1000) < self.poll_interval_ms {
            return Err(format!(
                "max_poll_duration_secs ({}s) is shorter than one poll interval ({}ms)",
                self.max_poll_duration_secs, self.poll_interval_ms
            ));
        }
        Ok(())
    }
}

/// Where selections are persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceBackend {
    /// Process-local; selections are lost on exit
    Memory,
    #[default]
    Sled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub backend: PersistenceBackend,

    /// Database directory (defaults to the platform data dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl PersistenceConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_data_path)
    }

    pub fn validate(&self) -> Result<(), String> {
        match &self.path {
            Some(path) if path.as_os_str().is_empty() => {
                Err("Persistence path cannot be empty".to_string())
            }
            _ => Ok(()),
        }
    }
}

fn default_data_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "scriptsync")
        .map(|dirs| dirs.data_dir().join("selections"))
        .unwrap_or_else(|| PathBuf::from(".scriptsync/selections"))
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Backend(String),
    Generation(String),
    Persistence(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Backend(msg) => write!(f, "Backend: {}", msg),
            ValidationError::Generation(msg) => write!(f, "Generation: {}", msg),
            ValidationError::Persistence(msg) => write!(f, "Persistence: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ScriptsyncConfig {
    /// Validate the entire configuration, reporting every problem found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.backend.validate() {
            errors.push(ValidationError::Backend(e));
        }
        if let Err(e) = self.generation.validate() {
            errors.push(ValidationError::Generation(e));
        }
        if let Err(e) = self.persistence.validate() {
            errors.push(ValidationError::Persistence(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
