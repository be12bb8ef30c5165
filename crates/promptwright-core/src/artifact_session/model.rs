//! Artifact session domain model.

use crate::session::HistoryItem;
use crate::summary::{SessionSummary, summarize_history};
use serde::{Deserialize, Serialize};

/// One conversation instance that exercises an artifact's template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSession {
    /// Unique artifact session identifier (UUID format)
    pub id: String,
    /// Project owning the artifact
    pub project_id: String,
    /// Owning artifact
    pub artifact_id: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub history: Vec<HistoryItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
}

impl ArtifactSession {
    /// Recomputes `last_message` from the current history.
    pub fn refresh_last_message(&mut self) {
        self.last_message = summarize_history(&self.history);
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            last_message: self.last_message.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Payload for creating an artifact session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewArtifactSession {
    pub title: Option<String>,
    pub history: Vec<HistoryItem>,
}

/// Partial update for an artifact session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactSessionPatch {
    /// Replaces the whole history.
    pub history: Option<Vec<HistoryItem>>,
    /// Replaces the title; `Some(None)` clears it.
    pub title: Option<Option<String>>,
}
