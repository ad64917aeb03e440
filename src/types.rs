//! Identifier types shared across the crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Server-issued id of one immutable version.
    VersionId
);
string_id!(
    /// Opaque id of a server-side generation job.
    TaskId
);
string_id!(
    /// Id of the owning entity (a project).
    ParentId
);
string_id!(
    /// Key of a scene inside a project.
    SceneKey
);

/// Kind of content document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Story,
    Scene,
    Script,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [DocumentKind::Story, DocumentKind::Scene, DocumentKind::Script];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Story => "story",
            DocumentKind::Scene => "scene",
            DocumentKind::Script => "script",
        }
    }

    /// Scene and script documents are addressed by a scene key.
    pub fn is_scene_scoped(self) -> bool {
        matches!(self, DocumentKind::Scene | DocumentKind::Script)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "story" => Ok(DocumentKind::Story),
            "scene" => Ok(DocumentKind::Scene),
            "script" => Ok(DocumentKind::Script),
            other => Err(format!(
                "Unknown document kind: {} (must be 'story', 'scene', or 'script')",
                other
            )),
        }
    }
}

/// Reference to one content document of a parent project
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub parent_id: ParentId,
    pub kind: DocumentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_key: Option<SceneKey>,
}

impl DocumentRef {
    pub fn new(parent_id: impl Into<ParentId>, kind: DocumentKind) -> Self {
        Self {
            parent_id: parent_id.into(),
            kind,
            scene_key: None,
        }
    }

    pub fn with_scene(
        parent_id: impl Into<ParentId>,
        kind: DocumentKind,
        scene_key: impl Into<SceneKey>,
    ) -> Self {
        Self {
            parent_id: parent_id.into(),
            kind,
            scene_key: Some(scene_key.into()),
        }
    }

    /// The `documentKind` segment used in persistence keys.
    ///
    /// Scene-scoped documents append their scene key so that two scenes of one
    /// project never share a persisted selection.
    pub fn kind_segment(&self) -> String {
        match &self.scene_key {
            Some(key) => format!("{}.{}", self.kind.as_str(), key),
            None => self.kind.as_str().to_string(),
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.parent_id, self.kind_segment())
    }
}
