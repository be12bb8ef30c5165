//! Artifact domain model.
//!
//! An artifact is a saved prompt template together with the schema of the
//! variables a user fills in each time the template is exercised.

use serde::{Deserialize, Serialize};

/// Input widget type of a template variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    #[default]
    Text,
    Textarea,
    Number,
    Select,
    Boolean,
}

impl VariableKind {
    /// Parses a type tag case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "string" => Some(Self::Text),
            "textarea" | "multiline" => Some(Self::Textarea),
            "number" => Some(Self::Number),
            "select" => Some(Self::Select),
            "boolean" | "bool" | "checkbox" => Some(Self::Boolean),
            _ => None,
        }
    }
}

/// One variable in an artifact's template schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactVariable {
    /// Placeholder key referenced by the template
    pub key: String,
    /// Human-readable label
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: VariableKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Allowed values for `select` variables
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl ArtifactVariable {
    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: VariableKind::Text,
            required: false,
            default: None,
            options: Vec::new(),
            placeholder: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A saved, variable-parameterized prompt template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Unique artifact identifier (UUID format)
    pub id: String,
    /// Owning project
    pub project_id: String,
    pub title: String,
    /// The problem statement the template addresses
    #[serde(default)]
    pub problem: String,
    /// The template body
    pub prompt_content: String,
    #[serde(default)]
    pub variables: Vec<ArtifactVariable>,
    pub created_at: i64,
    pub updated_at: i64,
    /// The active artifact session, if any
    #[serde(default)]
    pub current_session_id: Option<String>,
}

/// Payload for creating an artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewArtifact {
    pub title: String,
    pub problem: String,
    pub prompt_content: String,
    pub variables: Vec<ArtifactVariable>,
}

/// Partial update for an artifact. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactPatch {
    pub title: Option<String>,
    pub problem: Option<String>,
    pub prompt_content: Option<String>,
    pub variables: Option<Vec<ArtifactVariable>>,
}
