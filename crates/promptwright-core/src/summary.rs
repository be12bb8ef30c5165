//! List-view summaries.
//!
//! The session lists shown next to a conversation only need a title and a
//! one-line preview. The preview is cached on each record as `last_message`
//! so rendering a list never has to walk full histories.

use crate::session::HistoryItem;
use serde::{Deserialize, Serialize};

/// Maximum displayable characters in a `last_message` preview.
pub const LAST_MESSAGE_MAX_CHARS: usize = 60;

/// Prefix marking a history entry that carries a submitted answer form.
pub const FORM_SUBMISSION_MARKER: &str = "[[form-submission]]";

/// Prefix marking a history entry that carries deliberation output.
pub const DELIBERATION_MARKER: &str = "[[deliberation]]";

const FORM_SUBMISSION_LABEL: &str = "Submitted answers";
const DELIBERATION_LABEL: &str = "Deliberation results";
const ELLIPSIS: char = '…';

/// List-view projection of a session or artifact session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub title: Option<String>,
    pub last_message: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Derives the `last_message` preview from a history.
///
/// Returns `None` for an empty history or blank newest entry.
pub fn summarize_history(history: &[HistoryItem]) -> Option<String> {
    history.last().and_then(|item| summarize_content(&item.content))
}

/// Derives a preview from a single message body.
pub fn summarize_content(content: &str) -> Option<String> {
    let trimmed = content.trim_start();
    if trimmed.starts_with(FORM_SUBMISSION_MARKER) {
        return Some(FORM_SUBMISSION_LABEL.to_string());
    }
    if trimmed.starts_with(DELIBERATION_MARKER) {
        return Some(DELIBERATION_LABEL.to_string());
    }

    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    Some(truncate_chars(&collapsed, LAST_MESSAGE_MAX_CHARS))
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max - 1).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push(ELLIPSIS);
    truncated
}
