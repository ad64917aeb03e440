//! Shared test utilities for integration tests
//!
//! Scripted-backend fixtures plus serialized access to process environment
//! variables for configuration tests.

use scriptsync::backend::ScriptedBackend;
use scriptsync::context::{ContentContext, ContextSettings};
use scriptsync::persistence::PersistenceAdapter;
use scriptsync::{DocumentRef, Version};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Global mutex serializing environment variable access across tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Environment variable state to restore after test
struct EnvState {
    vars: Vec<(&'static str, Option<String>)>,
}

const ISOLATED_VARS: &[&str] = &[
    "HOME",
    "XDG_CONFIG_HOME",
    "SCRIPTSYNC_ENV",
    "SCRIPTSYNC_BACKEND__ENDPOINT",
    "SCRIPTSYNC_GENERATION__POLL_INTERVAL_MS",
];

impl EnvState {
    fn capture() -> Self {
        Self {
            vars: ISOLATED_VARS
                .iter()
                .map(|name| (*name, std::env::var(name).ok()))
                .collect(),
        }
    }

    fn restore(self) {
        for (name, value) in self.vars {
            match value {
                Some(orig) => std::env::set_var(name, orig),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with HOME and XDG_CONFIG_HOME pointed into `test_dir` and all
/// SCRIPTSYNC_* overrides cleared; the original environment is restored after.
pub fn with_config_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_home = test_dir.path().join("home");
    let test_config_home = test_dir.path().join("xdg");
    std::fs::create_dir_all(&test_home).unwrap();
    std::fs::create_dir_all(&test_config_home).unwrap();

    for name in ISOLATED_VARS {
        std::env::remove_var(name);
    }
    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", &test_config_home);

    let result = f();

    env_state.restore();
    result
}

pub fn version(id: &str, number: u64) -> Version {
    Version::new(id, number, format!("draft {}", number))
}

pub fn versions(ids: &[&str]) -> Vec<Version> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| version(id, i as u64 + 1))
        .collect()
}

/// Backend whose server state already holds `initial` for `document`.
pub fn backend_with(document: &DocumentRef, initial: Vec<Version>) -> Arc<ScriptedBackend> {
    let backend = Arc::new(ScriptedBackend::new());
    backend.set_versions(document, initial);
    backend
}

pub async fn mount(
    document: &DocumentRef,
    backend: &Arc<ScriptedBackend>,
    persistence: Arc<dyn PersistenceAdapter>,
    settings: ContextSettings,
) -> ContentContext {
    ContentContext::mount(document.clone(), backend.clone(), persistence, settings).await
}
