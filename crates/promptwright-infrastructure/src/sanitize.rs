//! Record sanitizers.
//!
//! Everything read back from storage or received in an import payload is
//! untrusted JSON. These functions coerce it into the canonical record
//! shapes with a lenient policy: an invalid element of a nested collection
//! is dropped on its own, and only a record missing a required top-level
//! field is rejected as a whole. One corrupt history entry never costs the
//! rest of a conversation.
//!
//! Sanitizing an already-valid value returns it unchanged.

use promptwright_core::artifact::{Artifact, ArtifactVariable, VariableKind};
use promptwright_core::artifact_session::ArtifactSession;
use promptwright_core::project::Project;
use promptwright_core::session::{
    Deliberation, HistoryItem, HistoryRole, PendingQuestion, Session, SessionState,
};
use promptwright_core::summary::summarize_history;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

type Object = Map<String, Value>;

// ============================================================================
// Nested collections
// ============================================================================

/// Sanitizes a history array. Entries need a known role and string content;
/// a missing or unreadable timestamp becomes `0`.
pub fn sanitize_history(value: Option<&Value>) -> Vec<HistoryItem> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut history = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        match history_item(item) {
            Some(entry) => history.push(entry),
            None => tracing::debug!(position, "Dropping malformed history entry"),
        }
    }
    history
}

fn history_item(value: &Value) -> Option<HistoryItem> {
    let obj = value.as_object()?;
    let role = obj.get("role").and_then(Value::as_str).and_then(HistoryRole::parse)?;
    let content = obj.get("content").and_then(Value::as_str)?.to_string();
    Some(HistoryItem {
        role,
        content,
        timestamp: millis(obj.get("timestamp")),
    })
}

/// Sanitizes an artifact's variable schema.
///
/// Entries need a non-blank key. Unknown type tags fall back to `text`;
/// later entries reusing an earlier key are dropped.
pub fn sanitize_variables(value: Option<&Value>) -> Vec<ArtifactVariable> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut variables = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let Some(variable) = variable(item) else {
            tracing::debug!(position, "Dropping malformed variable");
            continue;
        };
        if !seen.insert(variable.key.clone()) {
            tracing::debug!(key = %variable.key, "Dropping duplicate variable key");
            continue;
        }
        variables.push(variable);
    }
    variables
}

fn variable(value: &Value) -> Option<ArtifactVariable> {
    let obj = value.as_object()?;
    let key = non_blank(obj, "key")?;
    let label = non_blank(obj, "label").unwrap_or_else(|| key.clone());
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(VariableKind::parse)
        .unwrap_or_default();
    let options = obj
        .get("options")
        .and_then(Value::as_array)
        .map(|options| {
            options
                .iter()
                .filter_map(scalar_string)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Some(ArtifactVariable {
        key,
        label,
        kind,
        required: obj.get("required").and_then(Value::as_bool).unwrap_or(false),
        default: obj.get("default").and_then(scalar_string),
        options,
        placeholder: opt_string(obj, "placeholder"),
    })
}

/// Re-validates variables supplied by a caller through the same rules as
/// stored ones.
pub fn normalize_variables(variables: Vec<ArtifactVariable>) -> Vec<ArtifactVariable> {
    match serde_json::to_value(&variables) {
        Ok(value) => sanitize_variables(Some(&value)),
        Err(e) => {
            tracing::warn!("Failed to encode variables for validation: {}", e);
            Vec::new()
        }
    }
}

/// Sanitizes a conversation-state snapshot.
///
/// Anything that isn't an object yields `None`; inside an object each
/// field degrades independently.
pub fn sanitize_state(value: Option<&Value>) -> Option<SessionState> {
    let obj = value?.as_object()?;

    let questions = obj
        .get("questions")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(question).collect())
        .unwrap_or_default();

    let answers = obj
        .get("answers")
        .and_then(Value::as_object)
        .map(|answers| {
            answers
                .iter()
                .filter_map(|(id, answer)| scalar_string(answer).map(|a| (id.clone(), a)))
                .collect::<BTreeMap<_, _>>()
        })
        .unwrap_or_default();

    let deliberations = obj
        .get("deliberations")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(deliberation).collect())
        .unwrap_or_default();

    Some(SessionState {
        questions,
        answers,
        deliberations,
        final_prompt: opt_string(obj, "final_prompt"),
        finished: obj.get("finished").and_then(Value::as_bool).unwrap_or(false),
        title: opt_string(obj, "title"),
    })
}

fn question(value: &Value) -> Option<PendingQuestion> {
    let obj = value.as_object()?;
    Some(PendingQuestion {
        id: non_blank(obj, "id")?,
        text: obj.get("text").and_then(Value::as_str)?.to_string(),
        hint: opt_string(obj, "hint"),
    })
}

fn deliberation(value: &Value) -> Option<Deliberation> {
    let obj = value.as_object()?;
    Some(Deliberation {
        role: non_blank(obj, "role")?,
        content: obj.get("content").and_then(Value::as_str)?.to_string(),
    })
}

// ============================================================================
// Records
// ============================================================================

/// Requires `id` and `name`.
pub fn sanitize_project(value: &Value) -> Option<Project> {
    let obj = value.as_object()?;
    Some(Project {
        id: non_blank(obj, "id")?,
        name: obj.get("name").and_then(Value::as_str)?.to_string(),
        description: opt_string(obj, "description"),
        created_at: millis(obj.get("created_at")),
        updated_at: millis(obj.get("updated_at")),
        current_session_id: non_blank(obj, "current_session_id"),
    })
}

/// Requires `id` and `project_id`. `last_message` is recomputed.
pub fn sanitize_session(value: &Value) -> Option<Session> {
    let obj = value.as_object()?;
    let history = sanitize_history(obj.get("history"));
    let last_message = summarize_history(&history);
    Some(Session {
        id: non_blank(obj, "id")?,
        project_id: non_blank(obj, "project_id")?,
        created_at: millis(obj.get("created_at")),
        updated_at: millis(obj.get("updated_at")),
        history,
        state: sanitize_state(obj.get("state")),
        title: opt_string(obj, "title"),
        last_message,
    })
}

/// Requires `id`, `project_id`, a non-blank `title` and `prompt_content`.
pub fn sanitize_artifact(value: &Value) -> Option<Artifact> {
    let obj = value.as_object()?;
    let title = obj.get("title").and_then(Value::as_str)?;
    let prompt_content = obj.get("prompt_content").and_then(Value::as_str)?;
    if title.trim().is_empty() || prompt_content.trim().is_empty() {
        return None;
    }
    Some(Artifact {
        id: non_blank(obj, "id")?,
        project_id: non_blank(obj, "project_id")?,
        title: title.to_string(),
        problem: obj
            .get("problem")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        prompt_content: prompt_content.to_string(),
        variables: sanitize_variables(obj.get("variables")),
        created_at: millis(obj.get("created_at")),
        updated_at: millis(obj.get("updated_at")),
        current_session_id: non_blank(obj, "current_session_id"),
    })
}

/// Requires `id`, `project_id` and `artifact_id`. `last_message` is
/// recomputed.
pub fn sanitize_artifact_session(value: &Value) -> Option<ArtifactSession> {
    let obj = value.as_object()?;
    let history = sanitize_history(obj.get("history"));
    let last_message = summarize_history(&history);
    Some(ArtifactSession {
        id: non_blank(obj, "id")?,
        project_id: non_blank(obj, "project_id")?,
        artifact_id: non_blank(obj, "artifact_id")?,
        created_at: millis(obj.get("created_at")),
        updated_at: millis(obj.get("updated_at")),
        history,
        title: opt_string(obj, "title"),
        last_message,
    })
}

// ============================================================================
// Field helpers
// ============================================================================

fn non_blank(obj: &Object, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn opt_string(obj: &Object, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads epoch milliseconds from a number or an RFC 3339 string.
fn millis(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => chrono::DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_history() -> Vec<HistoryItem> {
        vec![
            HistoryItem {
                role: HistoryRole::User,
                content: "Write a haiku prompt".to_string(),
                timestamp: 1_700_000_000_000,
            },
            HistoryItem {
                role: HistoryRole::Assistant,
                content: "What season?".to_string(),
                timestamp: 1_700_000_000_500,
            },
        ]
    }

    #[test]
    fn test_valid_history_is_unchanged() {
        let history = valid_history();
        let value = serde_json::to_value(&history).unwrap();
        assert_eq!(sanitize_history(Some(&value)), history);
    }

    #[test]
    fn test_one_corrupt_history_entry_is_dropped() {
        let value = json!([
            {"role": "user", "content": "Write a haiku prompt", "timestamp": 1_700_000_000_000i64},
            {"role": "wizard", "content": "unknown role"},
            {"role": "assistant", "content": "What season?", "timestamp": 1_700_000_000_500i64},
        ]);
        assert_eq!(sanitize_history(Some(&value)), valid_history());
    }

    #[test]
    fn test_non_array_history_degrades_to_empty() {
        assert!(sanitize_history(Some(&json!({"role": "user"}))).is_empty());
        assert!(sanitize_history(None).is_empty());
    }

    #[test]
    fn test_history_timestamp_coercion() {
        let value = json!([
            {"role": "user", "content": "a", "timestamp": "2024-01-01T00:00:00Z"},
            {"role": "user", "content": "b"},
        ]);
        let history = sanitize_history(Some(&value));
        assert_eq!(history[0].timestamp, 1_704_067_200_000);
        assert_eq!(history[1].timestamp, 0);
    }

    #[test]
    fn test_valid_variables_are_unchanged() {
        let variables = vec![
            ArtifactVariable::text("topic", "Topic").required(),
            ArtifactVariable {
                key: "tone".to_string(),
                label: "Tone".to_string(),
                kind: VariableKind::Select,
                required: false,
                default: Some("formal".to_string()),
                options: vec!["formal".to_string(), "casual".to_string()],
                placeholder: None,
            },
        ];
        let value = serde_json::to_value(&variables).unwrap();
        assert_eq!(sanitize_variables(Some(&value)), variables);
        assert_eq!(normalize_variables(variables.clone()), variables);
    }

    #[test]
    fn test_variable_leniency() {
        let value = json!([
            {"key": "topic", "type": "text"},
            {"label": "no key"},
            {"key": "topic", "label": "duplicate"},
            {"key": "count", "type": "slider", "default": 3, "options": ["a", 1, null]},
        ]);
        let variables = sanitize_variables(Some(&value));
        assert_eq!(variables.len(), 2);
        assert_eq!(variables[0].label, "topic");
        assert_eq!(variables[1].kind, VariableKind::Text);
        assert_eq!(variables[1].default.as_deref(), Some("3"));
        assert_eq!(variables[1].options, vec!["a", "1"]);
    }

    #[test]
    fn test_state_sanitization() {
        let value = json!({
            "questions": [{"id": "q1", "text": "Audience?"}, {"text": "no id"}],
            "answers": {"q1": "engineers", "q2": {"nested": true}},
            "deliberations": [{"role": "critic", "content": "too vague"}, 42],
            "final_prompt": "You are...",
            "finished": "yes",
        });
        let state = sanitize_state(Some(&value)).unwrap();
        assert_eq!(state.questions.len(), 1);
        assert_eq!(state.answers.len(), 1);
        assert_eq!(state.deliberations.len(), 1);
        assert_eq!(state.final_prompt.as_deref(), Some("You are..."));
        assert!(!state.finished);

        assert_eq!(sanitize_state(Some(&json!("broken"))), None);
        assert_eq!(sanitize_state(Some(&Value::Null)), None);
    }

    #[test]
    fn test_valid_state_is_unchanged() {
        let mut state = SessionState::default();
        state.questions.push(PendingQuestion {
            id: "q1".to_string(),
            text: "Audience?".to_string(),
            hint: Some("be specific".to_string()),
        });
        state.answers.insert("q1".to_string(), "engineers".to_string());
        state.finished = true;
        state.title = Some("Haiku".to_string());

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(sanitize_state(Some(&value)), Some(state));
    }

    #[test]
    fn test_session_record_requires_keys() {
        assert!(sanitize_session(&json!({"id": "s1"})).is_none());
        assert!(sanitize_session(&json!({"id": "", "project_id": "p1"})).is_none());

        let session = sanitize_session(&json!({
            "id": "s1",
            "project_id": "p1",
            "history": [{"role": "user", "content": "hello"}],
            "last_message": "stale",
        }))
        .unwrap();
        assert_eq!(session.last_message.as_deref(), Some("hello"));
        assert_eq!(session.state, None);
    }

    #[test]
    fn test_artifact_record_requires_title_and_prompt() {
        let base = json!({"id": "a1", "project_id": "p1", "title": "T", "prompt_content": "P"});
        assert!(sanitize_artifact(&base).is_some());
        assert!(
            sanitize_artifact(&json!({"id": "a1", "project_id": "p1", "title": " ", "prompt_content": "P"}))
                .is_none()
        );
        assert!(sanitize_artifact(&json!({"id": "a1", "project_id": "p1", "title": "T"})).is_none());
    }
}
