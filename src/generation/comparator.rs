//! Completion comparators.
//!
//! A job is complete when the observed version list differs from the baseline
//! recorded at submission time in the way the comparator expects. Which
//! comparator applies is configured per document kind.

use crate::types::VersionId;
use crate::version::{GenerationPayload, Version};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Configured comparator for a document kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparatorKind {
    /// Complete once any version id unknown at submission appears.
    #[default]
    NewVersionId,
    /// Complete once the list holds `baseline + requested_count` versions (bulk generation).
    CountReached,
}

/// Version set observed when the job was submitted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baseline {
    ids: HashSet<VersionId>,
    latest: Option<VersionId>,
}

impl Baseline {
    pub fn from_versions(versions: &[Version]) -> Self {
        Self {
            ids: versions.iter().map(|v| v.id().clone()).collect(),
            latest: versions
                .iter()
                .max_by_key(|v| v.version_number())
                .map(|v| v.id().clone()),
        }
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, id: &VersionId) -> bool {
        self.ids.contains(id)
    }

    pub fn latest(&self) -> Option<&VersionId> {
        self.latest.as_ref()
    }
}

/// Completion check for one running job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionComparator {
    NewVersionId,
    CountReached { expected: usize },
}

impl CompletionComparator {
    pub fn for_request(kind: ComparatorKind, baseline: &Baseline, payload: &GenerationPayload) -> Self {
        match kind {
            ComparatorKind::NewVersionId => CompletionComparator::NewVersionId,
            ComparatorKind::CountReached => CompletionComparator::CountReached {
                expected: baseline.count() + payload.requested_count.max(1),
            },
        }
    }

    pub fn is_complete(&self, baseline: &Baseline, observed: &[Version]) -> bool {
        match self {
            // Compare by id, not count: a concurrent deletion plus a new
            // version leaves the count unchanged.
            CompletionComparator::NewVersionId => {
                observed.iter().any(|v| !baseline.contains(v.id()))
            }
            CompletionComparator::CountReached { expected } => {
                let distinct: HashSet<&VersionId> = observed.iter().map(Version::id).collect();
                distinct.len() >= *expected
            }
        }
    }
}
