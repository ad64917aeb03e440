//! CLI route: run context and command dispatch.

use crate::backend::{ContentBackend, HttpBackend};
use crate::cli::parse::{Commands, DocumentArgs};
use crate::cli::presentation::{
    format_generation_outcome, format_status_json, format_status_text, format_versions_json,
    format_versions_table, DocumentStatus,
};
use crate::config::{ConfigLoader, PersistenceBackend, ScriptsyncConfig};
use crate::context::ContentContext;
use crate::error::{CoordinatorError, StorageError};
use crate::persistence::{MemoryPersistence, PersistenceAdapter, SledPersistence};
use crate::types::VersionId;
use crate::version::GenerationPayload;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::info;

/// Runtime context for CLI execution: configuration, backend and persistence.
pub struct RunContext {
    config: ScriptsyncConfig,
    runtime: Runtime,
    backend: Arc<dyn ContentBackend>,
    persistence: Arc<dyn PersistenceAdapter>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, CoordinatorError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        config.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            CoordinatorError::Config(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })?;

        let runtime = Runtime::new()
            .map_err(|e| CoordinatorError::Config(format!("Failed to start async runtime: {}", e)))?;
        let backend: Arc<dyn ContentBackend> = Arc::new(
            HttpBackend::new(&config.backend)
                .map_err(|e| CoordinatorError::Config(e.to_string()))?,
        );
        let persistence = open_persistence(&config)?;

        Ok(Self {
            config,
            runtime,
            backend,
            persistence,
        })
    }

    pub fn config(&self) -> &ScriptsyncConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> Result<String, CoordinatorError> {
        match command {
            Commands::Versions { document, format } => {
                self.runtime.block_on(self.versions(document, format))
            }
            Commands::Status { document, format } => {
                self.runtime.block_on(self.status(document, format))
            }
            Commands::Generate {
                document,
                seed,
                notes,
                model,
                count,
            } => {
                let mut payload = match (seed, notes) {
                    (Some(seed), _) => GenerationPayload::from_seed(seed.as_str()),
                    (None, Some(notes)) => GenerationPayload::from_notes(notes.as_str()),
                    (None, None) => {
                        return Err(CoordinatorError::Config(
                            "generate needs --seed or --notes".to_string(),
                        ))
                    }
                };
                if let Some(model) = model {
                    payload = payload.with_model(model.as_str());
                }
                payload = payload.with_requested_count(*count);
                self.runtime.block_on(self.generate(document, payload))
            }
            Commands::Select {
                document,
                id,
                pin,
                latest,
            } => {
                let target = if *latest {
                    None
                } else {
                    id.as_deref().map(VersionId::new)
                };
                self.runtime.block_on(self.select(document, target, *pin))
            }
            Commands::Config => toml::to_string_pretty(&self.config).map_err(|e| {
                CoordinatorError::Config(format!("Failed to render configuration: {}", e))
            }),
        }
    }

    async fn versions(&self, args: &DocumentArgs, format: &str) -> Result<String, CoordinatorError> {
        let ctx = self.mount(args).await;
        let versions = ctx.versions();
        let selected = ctx.selected_version_id();
        if format == "json" {
            format_versions_json(&versions, selected.as_ref())
        } else {
            Ok(format_versions_table(&versions, selected.as_ref()))
        }
    }

    async fn status(&self, args: &DocumentArgs, format: &str) -> Result<String, CoordinatorError> {
        let ctx = self.mount(args).await;
        let selection = ctx.selection();
        let status = DocumentStatus {
            document: ctx.document().clone(),
            version_count: ctx.versions().len(),
            selected_version_id: selection.selected,
            latest_version_id: ctx.latest_version_id(),
            server_latest_pointer: ctx.latest_pointer(),
            user_override: selection.user_override,
        };
        if format == "json" {
            format_status_json(&status)
        } else {
            Ok(format_status_text(&status))
        }
    }

    /// Polling lives in this process, so the job is followed until it
    /// settles or fails; the settled selection is persisted before returning.
    async fn generate(
        &self,
        args: &DocumentArgs,
        payload: GenerationPayload,
    ) -> Result<String, CoordinatorError> {
        let ctx = self.mount(args).await;
        let mut handle = ctx.submit(payload).await?;
        let status = handle.wait().await;
        let current = ctx.current_version();
        Ok(format_generation_outcome(handle.task_id(), &status, current.as_ref()))
    }

    /// `target = None` returns to following the latest version.
    async fn select(
        &self,
        args: &DocumentArgs,
        target: Option<VersionId>,
        pin: bool,
    ) -> Result<String, CoordinatorError> {
        let ctx = self.mount(args).await;
        match &target {
            Some(id) if pin => ctx.pin_version(id)?,
            Some(id) => ctx.select_version(id)?,
            None => ctx.select_latest()?,
        };
        Ok(match ctx.current_version() {
            Some(version) => format!(
                "Selected {} ({}){}",
                version.display_label(),
                version.id(),
                if pin { ", pinned" } else { "" }
            ),
            None => "No versions to select.".to_string(),
        })
    }

    async fn mount(&self, args: &DocumentArgs) -> ContentContext {
        let document = args.document();
        let settings = self.config.generation.settings_for(document.kind);
        ContentContext::mount(
            document,
            Arc::clone(&self.backend),
            Arc::clone(&self.persistence),
            settings,
        )
        .await
    }
}

fn open_persistence(config: &ScriptsyncConfig) -> Result<Arc<dyn PersistenceAdapter>, CoordinatorError> {
    match config.persistence.backend {
        PersistenceBackend::Memory => Ok(Arc::new(MemoryPersistence::new())),
        PersistenceBackend::Sled => {
            let path = config.persistence.resolved_path();
            std::fs::create_dir_all(&path).map_err(StorageError::Io)?;
            info!(path = %path.display(), "Opening selection store");
            Ok(Arc::new(SledPersistence::open(&path)?))
        }
    }
}
