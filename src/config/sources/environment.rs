//! Environment overrides: `SCRIPTSYNC_<SECTION>__<KEY>`, e.g.
//! `SCRIPTSYNC_GENERATION__POLL_INTERVAL_MS=500`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("SCRIPTSYNC")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
