//! Loads [`ScriptsyncConfig`] from the layered sources.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::ScriptsyncConfig;
use config::{ConfigError, File};
use std::path::Path;
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, user-level file,
    /// `config/config.toml`, `config/{SCRIPTSYNC_ENV}.toml`, environment.
    pub fn load(workspace_root: &Path) -> Result<ScriptsyncConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: ScriptsyncConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            endpoint = %config.backend.endpoint,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load an explicit file (plus defaults and environment), skipping the
    /// user-level and workspace files.
    pub fn load_from_file(path: &Path) -> Result<ScriptsyncConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true));
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }
}
