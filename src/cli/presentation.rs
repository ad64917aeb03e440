//! CLI presentation: version tables, status summaries and generation outcomes.

use crate::error::CoordinatorError;
use crate::generation::TaskStatus;
use crate::types::{DocumentRef, TaskId, VersionId};
use crate::version::Version;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Snapshot of one document for `status`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatus {
    pub document: DocumentRef,
    pub version_count: usize,
    pub selected_version_id: Option<VersionId>,
    pub latest_version_id: Option<VersionId>,
    pub server_latest_pointer: Option<VersionId>,
    pub user_override: bool,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CoordinatorError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CoordinatorError::Storage(crate::error::StorageError::Serialization(e.to_string())))
}

pub fn format_versions_table(versions: &[Version], selected: Option<&VersionId>) -> String {
    if versions.is_empty() {
        return "No versions yet.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["", "#", "Id", "Label", "Chars", "Model", "Created"]);
    for version in versions.iter().rev() {
        let marker = if selected == Some(version.id()) { "*" } else { "" };
        table.add_row(vec![
            marker.to_string(),
            version.version_number().to_string(),
            version.id().to_string(),
            version.display_label(),
            version.character_count().to_string(),
            version.llm_model().unwrap_or("-").to_string(),
            version.created_at().format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    table.to_string()
}

pub fn format_versions_json(versions: &[Version], selected: Option<&VersionId>) -> Result<String, CoordinatorError> {
    to_json(&serde_json::json!({
        "selectedVersionId": selected,
        "versions": versions,
    }))
}

pub fn format_status_text(status: &DocumentStatus) -> String {
    let show = |id: &Option<VersionId>| {
        id.as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    let mut lines = vec![
        format!("{}", status.document.to_string().bold().underline()),
        format!("  Versions:        {}", status.version_count),
        format!("  Selected:        {}", show(&status.selected_version_id)),
        format!("  Latest:          {}", show(&status.latest_version_id)),
        format!("  Server pointer:  {}", show(&status.server_latest_pointer)),
    ];
    if status.user_override {
        lines.push(format!("  {}", "Pinned to an older version".yellow()));
    }
    if status.server_latest_pointer.is_some() && status.server_latest_pointer != status.latest_version_id {
        lines.push(format!("  {}", "Server reports a newer version than listed".yellow()));
    }
    lines.join("\n")
}

pub fn format_status_json(status: &DocumentStatus) -> Result<String, CoordinatorError> {
    to_json(status)
}

pub fn format_generation_outcome(
    task_id: &TaskId,
    status: &TaskStatus,
    selected: Option<&Version>,
) -> String {
    match status {
        TaskStatus::Pending => format!("Submitted generation task {}", task_id),
        TaskStatus::Settled { .. } => match selected {
            Some(version) => format!(
                "{} task {}: now showing {} ({})",
                "Generated".green(),
                task_id,
                version.display_label(),
                version.id()
            ),
            None => format!("{} task {}", "Generated".green(), task_id),
        },
        TaskStatus::Failed { failure } => {
            format!("{} task {}: {}", "Failed".red(), task_id, failure)
        }
    }
}
