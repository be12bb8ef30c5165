//! Conversation history types.
//!
//! Shared by wizard sessions and artifact sessions.

use serde::{Deserialize, Serialize};

/// Represents the role of a history entry in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
    /// System-generated message.
    System,
}

impl HistoryRole {
    /// Parses a role name case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for HistoryRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in a conversation history.
///
/// History arrays are append-ordered: position in the array is the order of
/// the conversation, and entries are never edited once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    /// The role of the message sender.
    pub role: HistoryRole,
    /// The content of the message.
    pub content: String,
    /// Epoch milliseconds when the message was written.
    pub timestamp: i64,
}

impl HistoryItem {
    /// Creates a history entry stamped with the current time.
    pub fn new(role: HistoryRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: crate::time::now_millis(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(HistoryRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(HistoryRole::Assistant, content)
    }
}
