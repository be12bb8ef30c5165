//! Session domain model.
//!
//! A wizard session is one free-form prompt-negotiation conversation
//! within a project.

use super::message::HistoryItem;
use super::state::SessionState;
use crate::summary::{SessionSummary, summarize_history};
use serde::{Deserialize, Serialize};

/// Represents a wizard session.
///
/// `last_message` is a derived cache of the newest history entry and is
/// recomputed by the store on every write; callers never set it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Owning project
    pub project_id: String,
    /// Epoch milliseconds when the session was created
    pub created_at: i64,
    /// Epoch milliseconds when the session was last updated
    pub updated_at: i64,
    /// Conversation history in conversation order
    #[serde(default)]
    pub history: Vec<HistoryItem>,
    /// Conversation-state snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SessionState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
}

impl Session {
    /// Recomputes `last_message` from the current history.
    pub fn refresh_last_message(&mut self) {
        self.last_message = summarize_history(&self.history);
    }

    /// The list-view projection of this session.
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

/// Payload for creating a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSession {
    pub title: Option<String>,
    pub history: Vec<HistoryItem>,
    pub state: Option<SessionState>,
}

/// Partial update for a session. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch {
    /// Replaces the whole history.
    pub history: Option<Vec<HistoryItem>>,
    /// Replaces the state; `Some(None)` clears it.
    pub state: Option<Option<SessionState>>,
    /// Replaces the title; `Some(None)` clears it.
    pub title: Option<Option<String>>,
}

impl SessionPatch {
    pub fn history(history: Vec<HistoryItem>) -> Self {
        Self {
            history: Some(history),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: Option<SessionState>) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = Some(title);
        self
    }
}
