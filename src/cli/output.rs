//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::CoordinatorError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &CoordinatorError) -> String {
    match e {
        CoordinatorError::Conflict(document) => format!(
            "A generation is already running for {}; wait for it to finish",
            document
        ),
        CoordinatorError::UnknownVersion(id) => {
            format!("Version not found: {} (run `scriptsync versions` to list ids)", id)
        }
        other => other.to_string(),
    }
}
