//! Project domain model.

use serde::{Deserialize, Serialize};

/// Top-level workspace grouping wizard sessions and artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique project identifier (UUID format)
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Epoch milliseconds when the project was created
    pub created_at: i64,
    /// Epoch milliseconds when the project was last updated
    pub updated_at: i64,
    /// The active wizard session, if any
    #[serde(default)]
    pub current_session_id: Option<String>,
}

/// Payload for creating a project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
}

impl NewProject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// Partial update for a project. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    /// Replaces the description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
}
