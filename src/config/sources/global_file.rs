//! User-level config file: $XDG_CONFIG_HOME/scriptsync/config.toml or ~/.config/scriptsync/config.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::PathBuf;
use tracing::debug;

/// Path to the user-level config file.
pub fn global_config_path() -> Option<PathBuf> {
    let base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(std::env::var_os("HOME")?).join(".config"),
    };
    Some(base.join("scriptsync").join("config.toml"))
}

/// Add the user-level config file to the builder if it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match global_config_path() {
        Some(path) if path.exists() => {
            let path = path.canonicalize().unwrap_or(path);
            Ok(builder.add_source(File::from(path.as_path()).required(false)))
        }
        Some(path) => {
            debug!(config_path = %path.display(), "No user-level configuration file");
            Ok(builder)
        }
        None => Ok(builder),
    }
}
