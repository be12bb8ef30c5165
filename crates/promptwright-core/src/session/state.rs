//! Wizard conversation state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A question the assistant is waiting on the user to answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingQuestion {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// One contribution produced during a deliberation round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deliberation {
    /// Who produced the contribution (e.g. "critic", "drafter").
    pub role: String,
    pub content: String,
}

/// Snapshot of where a wizard session stands in negotiating its prompt.
///
/// The store treats this as an opaque value owned by the session: it is
/// replaced wholesale on update and never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Questions awaiting an answer.
    #[serde(default)]
    pub questions: Vec<PendingQuestion>,
    /// Draft answers keyed by question id.
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    /// Results of the latest deliberation round.
    #[serde(default)]
    pub deliberations: Vec<Deliberation>,
    /// The negotiated prompt, once one has been produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_prompt: Option<String>,
    /// Whether the negotiation has concluded.
    #[serde(default)]
    pub finished: bool,
    /// Title suggested by the backend for this conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}
