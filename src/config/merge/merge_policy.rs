//! Merge rules: defaults and override order.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with the built-in defaults applied.
///
/// Later sources override these key by key; tables are merged, not replaced.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("backend.endpoint", "http://localhost:8080/graphql")?
        .set_default("generation.poll_interval_ms", 1_500i64)?
        .set_default("generation.max_poll_duration_secs", 300i64)?
        .set_default("generation.max_poll_retries", 3i64)?
        .set_default("persistence.backend", "sled")?
        .set_default("logging.level", "info")
}
