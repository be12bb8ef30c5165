//! Project export and import.
//!
//! Export reads a project's whole record graph in one read-only transaction.
//! Import treats its payload as untrusted: the top-level shape must hold, but
//! individual entries are re-keyed, run through the record sanitizers and
//! dropped one at a time when they fail. The surviving graph is written in a
//! single transaction over all four stores.

use crate::repository_support::{
    PROJECT_INDEX, decode_records, read_project, sessions_of_artifact, sessions_of_project,
};
use crate::sanitize::{sanitize_artifact, sanitize_artifact_session, sanitize_session};
use crate::storage::{Database, StoreName, TxMode};
use async_trait::async_trait;
use promptwright_core::artifact::Artifact;
use promptwright_core::artifact_session::ArtifactSession;
use promptwright_core::error::{Result, StoreError};
use promptwright_core::id::create_id;
use promptwright_core::project::Project;
use promptwright_core::session::Session;
use promptwright_core::time::now_millis;
use promptwright_core::transfer::{
    EXPORT_FORMAT_VERSION, ImportReport, ProjectExport, ProjectTransfer,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Export/import engine over the shared [`Database`].
#[derive(Debug, Clone)]
pub struct DbProjectTransfer {
    db: Database,
}

impl DbProjectTransfer {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Exports a project as pretty-printed JSON.
    pub async fn export_project_json(&self, project_id: &str) -> Result<String> {
        let export = self.export_project(project_id).await?;
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Parses `json` and imports it as a new project.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidInput` if `json` is not valid JSON.
    pub async fn import_project_json(&self, json: &str) -> Result<ImportReport> {
        let payload: Value = serde_json::from_str(json)
            .map_err(|e| StoreError::invalid_input(format!("import payload is not JSON: {}", e)))?;
        self.import_project(payload).await
    }
}

#[async_trait]
impl ProjectTransfer for DbProjectTransfer {
    async fn export_project(&self, project_id: &str) -> Result<ProjectExport> {
        let export = self
            .db
            .with_stores(&StoreName::ALL, TxMode::ReadOnly, |tx| {
                let project = read_project(tx, project_id)?
                    .ok_or_else(|| StoreError::not_found("project", project_id))?;
                let sessions = sessions_of_project(tx, project_id)?;

                let values = tx.get_all_by_index(StoreName::Artifacts, PROJECT_INDEX, project_id)?;
                let mut artifacts = decode_records(StoreName::Artifacts, values, sanitize_artifact);
                artifacts.sort_by(|a, b| {
                    b.created_at
                        .cmp(&a.created_at)
                        .then_with(|| b.id.cmp(&a.id))
                });

                let mut artifact_sessions = Vec::new();
                for artifact in &artifacts {
                    artifact_sessions.extend(sessions_of_artifact(tx, &artifact.id)?);
                }

                Ok(ProjectExport {
                    version: EXPORT_FORMAT_VERSION,
                    exported_at: now_millis(),
                    project,
                    sessions,
                    artifacts,
                    artifact_sessions,
                })
            })
            .await?;

        tracing::info!(
            project_id,
            sessions = export.sessions.len(),
            artifacts = export.artifacts.len(),
            artifact_sessions = export.artifact_sessions.len(),
            "Exported project"
        );
        Ok(export)
    }

    async fn import_project(&self, payload: Value) -> Result<ImportReport> {
        let graph = ImportGraph::build(&payload)?;
        let report = graph.report();

        self.db
            .with_stores(&StoreName::ALL, TxMode::ReadWrite, |tx| {
                tx.put(StoreName::Projects, &graph.project)?;
                for session in &graph.sessions {
                    tx.put(StoreName::Sessions, session)?;
                }
                for artifact in &graph.artifacts {
                    tx.put(StoreName::Artifacts, artifact)?;
                }
                for session in &graph.artifact_sessions {
                    tx.put(StoreName::ArtifactSessions, session)?;
                }
                Ok(())
            })
            .await?;

        tracing::info!(
            project_id = %report.project.id,
            sessions = report.sessions_imported,
            artifacts = report.artifacts_imported,
            artifact_sessions = report.artifact_sessions_imported,
            malformed = report.malformed_discarded,
            orphans = report.orphans_discarded,
            "Imported project '{}'",
            report.project.name
        );
        Ok(report)
    }
}

/// A re-keyed record graph ready to be written.
#[derive(Debug)]
struct ImportGraph {
    project: Project,
    sessions: Vec<Session>,
    artifacts: Vec<Artifact>,
    artifact_sessions: Vec<ArtifactSession>,
    malformed: usize,
    orphans: usize,
}

impl ImportGraph {
    fn build(payload: &Value) -> Result<Self> {
        let root = payload
            .as_object()
            .ok_or_else(|| StoreError::invalid_input("import payload must be a JSON object"))?;

        if let Some(version) = root.get("version") {
            if version.as_u64() != Some(u64::from(EXPORT_FORMAT_VERSION)) {
                return Err(StoreError::invalid_input(format!(
                    "unsupported export version {}",
                    version
                )));
            }
        }

        let source_project = root
            .get("project")
            .and_then(Value::as_object)
            .ok_or_else(|| StoreError::invalid_input("import payload has no project object"))?;
        let name = source_project
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| StoreError::invalid_input("imported project has no name"))?;

        let now = now_millis();
        let mut project = Project {
            id: create_id(),
            name: name.to_string(),
            description: source_project
                .get("description")
                .and_then(Value::as_str)
                .filter(|d| !d.trim().is_empty())
                .map(str::to_string),
            created_at: now,
            updated_at: now,
            current_session_id: None,
        };

        let mut malformed = 0;
        let mut orphans = 0;

        // Sessions
        let mut session_ids = HashMap::new();
        let mut sessions = Vec::new();
        for entry in entries(root, "sessions") {
            let Some((old_id, mut value)) = rekey(entry, now) else {
                malformed += 1;
                continue;
            };
            value.insert("project_id".to_string(), Value::String(project.id.clone()));
            match sanitize_session(&Value::Object(value)) {
                Some(session) => {
                    if let Some(old_id) = old_id {
                        session_ids.entry(old_id).or_insert_with(|| session.id.clone());
                    }
                    sessions.push(session);
                }
                None => malformed += 1,
            }
        }

        // Artifacts, with their pointers resolved after their sessions
        let mut artifact_ids = HashMap::new();
        let mut artifacts = Vec::new();
        let mut artifact_pointers = Vec::new();
        for entry in entries(root, "artifacts") {
            let Some((old_id, mut value)) = rekey(entry, now) else {
                malformed += 1;
                continue;
            };
            let old_pointer = value
                .insert("current_session_id".to_string(), Value::Null)
                .and_then(|v| v.as_str().map(str::to_string));
            value.insert("project_id".to_string(), Value::String(project.id.clone()));
            match sanitize_artifact(&Value::Object(value)) {
                Some(artifact) => {
                    if let Some(old_id) = old_id {
                        artifact_ids.entry(old_id).or_insert_with(|| artifact.id.clone());
                    }
                    artifact_pointers.push(old_pointer);
                    artifacts.push(artifact);
                }
                None => malformed += 1,
            }
        }

        // Artifact sessions
        let mut artifact_session_ids = HashMap::new();
        let mut first_session_of_artifact: HashMap<String, String> = HashMap::new();
        let mut artifact_sessions = Vec::new();
        for entry in entries(root, "artifact_sessions") {
            let Some((old_id, mut value)) = rekey(entry, now) else {
                malformed += 1;
                continue;
            };
            let new_artifact_id = value
                .get("artifact_id")
                .and_then(Value::as_str)
                .and_then(|old| artifact_ids.get(old))
                .cloned();
            let Some(new_artifact_id) = new_artifact_id else {
                orphans += 1;
                continue;
            };
            value.insert(
                "artifact_id".to_string(),
                Value::String(new_artifact_id.clone()),
            );
            value.insert("project_id".to_string(), Value::String(project.id.clone()));
            match sanitize_artifact_session(&Value::Object(value)) {
                Some(session) => {
                    if let Some(old_id) = old_id {
                        artifact_session_ids
                            .entry(old_id)
                            .or_insert_with(|| (session.id.clone(), new_artifact_id.clone()));
                    }
                    first_session_of_artifact
                        .entry(new_artifact_id)
                        .or_insert_with(|| session.id.clone());
                    artifact_sessions.push(session);
                }
                None => malformed += 1,
            }
        }

        // Pointers
        project.current_session_id = source_project
            .get("current_session_id")
            .and_then(Value::as_str)
            .and_then(|old| session_ids.get(old))
            .cloned()
            .or_else(|| sessions.first().map(|s| s.id.clone()));

        for (artifact, old_pointer) in artifacts.iter_mut().zip(artifact_pointers) {
            let remapped = old_pointer
                .and_then(|old| artifact_session_ids.get(&old))
                .filter(|(_, owner)| *owner == artifact.id)
                .map(|(id, _)| id.clone());
            artifact.current_session_id =
                remapped.or_else(|| first_session_of_artifact.get(&artifact.id).cloned());
        }

        Ok(Self {
            project,
            sessions,
            artifacts,
            artifact_sessions,
            malformed,
            orphans,
        })
    }

    fn report(&self) -> ImportReport {
        ImportReport {
            project: self.project.clone(),
            sessions_imported: self.sessions.len(),
            artifacts_imported: self.artifacts.len(),
            artifact_sessions_imported: self.artifact_sessions.len(),
            malformed_discarded: self.malformed,
            orphans_discarded: self.orphans,
        }
    }
}

/// The entries of a top-level array; anything else counts as no entries.
fn entries<'a>(root: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    root.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Clones an entry under a fresh id, returning the id it was exported with.
///
/// Missing timestamps are stamped with `now`. Non-objects yield `None`.
fn rekey(entry: &Value, now: i64) -> Option<(Option<String>, Map<String, Value>)> {
    let mut value = entry.as_object()?.clone();
    let old_id = value
        .insert("id".to_string(), Value::String(create_id()))
        .and_then(|id| id.as_str().map(str::to_string))
        .filter(|id| !id.trim().is_empty());
    for field in ["created_at", "updated_at"] {
        if value.get(field).is_none_or(Value::is_null) {
            value.insert(field.to_string(), Value::from(now));
        }
    }
    Some((old_id, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DbArtifactRepository, DbArtifactSessionRepository, DbProjectRepository,
        DbSessionRepository,
    };
    use promptwright_core::artifact::{ArtifactRepository, ArtifactVariable, NewArtifact};
    use promptwright_core::artifact_session::{ArtifactSessionRepository, NewArtifactSession};
    use promptwright_core::project::{NewProject, ProjectRepository};
    use promptwright_core::session::{HistoryItem, NewSession, SessionRepository};
    use serde_json::json;
    use std::collections::HashSet;

    struct Fixture {
        db: Database,
        transfer: DbProjectTransfer,
        project_id: String,
    }

    /// A project with two sessions, two artifacts and three artifact
    /// sessions.
    async fn fixture() -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        let projects = DbProjectRepository::new(db.clone());
        let sessions = DbSessionRepository::new(db.clone());
        let artifacts = DbArtifactRepository::new(db.clone());
        let artifact_sessions = DbArtifactSessionRepository::new(db.clone());

        let project = projects
            .create(NewProject {
                name: "Demo".to_string(),
                description: Some("Prompt lab".to_string()),
            })
            .await
            .unwrap();
        let first = sessions
            .create(
                &project.id,
                NewSession {
                    history: vec![HistoryItem::user("hello")],
                    ..NewSession::default()
                },
            )
            .await
            .unwrap();
        sessions.create(&project.id, NewSession::default()).await.unwrap();
        sessions.select(&project.id, &first.id).await.unwrap();

        for title in ["Summarizer", "Translator"] {
            let artifact = artifacts
                .create(
                    &project.id,
                    NewArtifact {
                        title: title.to_string(),
                        problem: String::new(),
                        prompt_content: format!("{} {{{{text}}}}", title),
                        variables: vec![ArtifactVariable::text("text", "Text")],
                    },
                )
                .await
                .unwrap();
            artifact_sessions
                .create(
                    &artifact.id,
                    NewArtifactSession {
                        title: None,
                        history: vec![HistoryItem::assistant(format!("{} ready", title))],
                    },
                )
                .await
                .unwrap();
        }
        let translator = artifacts.list(&project.id).await.unwrap()[0].clone();
        artifact_sessions
            .create(&translator.id, NewArtifactSession::default())
            .await
            .unwrap();

        Fixture {
            transfer: DbProjectTransfer::new(db.clone()),
            db,
            project_id: project.id,
        }
    }

    fn all_ids(export: &ProjectExport) -> HashSet<String> {
        let mut ids = HashSet::new();
        ids.insert(export.project.id.clone());
        ids.extend(export.sessions.iter().map(|s| s.id.clone()));
        ids.extend(export.artifacts.iter().map(|a| a.id.clone()));
        ids.extend(export.artifact_sessions.iter().map(|s| s.id.clone()));
        ids
    }

    #[tokio::test]
    async fn test_export_contains_whole_graph() {
        let fx = fixture().await;

        let export = fx.transfer.export_project(&fx.project_id).await.unwrap();
        assert_eq!(export.version, EXPORT_FORMAT_VERSION);
        assert_eq!(export.project.id, fx.project_id);
        assert_eq!(export.sessions.len(), 2);
        assert_eq!(export.artifacts.len(), 2);
        assert_eq!(export.artifact_sessions.len(), 3);

        let err = fx.transfer.export_project("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_round_trip_preserves_content_with_fresh_ids() {
        let fx = fixture().await;
        let export = fx.transfer.export_project(&fx.project_id).await.unwrap();

        let report = fx
            .transfer
            .import_project(serde_json::to_value(&export).unwrap())
            .await
            .unwrap();
        assert_eq!(report.malformed_discarded, 0);
        assert_eq!(report.orphans_discarded, 0);

        let imported = fx.transfer.export_project(&report.project.id).await.unwrap();
        assert!(all_ids(&imported).is_disjoint(&all_ids(&export)));

        assert_eq!(imported.project.name, export.project.name);
        assert_eq!(imported.project.description, export.project.description);

        let histories = |e: &ProjectExport| {
            e.sessions
                .iter()
                .map(|s| (s.created_at, s.history.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(histories(&imported), histories(&export));

        let templates = |e: &ProjectExport| {
            e.artifacts
                .iter()
                .map(|a| (a.title.clone(), a.prompt_content.clone(), a.variables.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(templates(&imported), templates(&export));

        // Pointers map onto the counterparts of the original targets
        let original_current = export
            .sessions
            .iter()
            .find(|s| Some(&s.id) == export.project.current_session_id.as_ref())
            .unwrap();
        let imported_current = imported
            .sessions
            .iter()
            .find(|s| Some(&s.id) == imported.project.current_session_id.as_ref())
            .unwrap();
        assert_eq!(imported_current.created_at, original_current.created_at);

        for artifact in &imported.artifacts {
            let current = artifact.current_session_id.as_deref().unwrap();
            let session = imported
                .artifact_sessions
                .iter()
                .find(|s| s.id == current)
                .unwrap();
            assert_eq!(session.artifact_id, artifact.id);
            assert_eq!(session.project_id, imported.project.id);
        }
    }

    #[tokio::test]
    async fn test_import_rejects_bad_top_level_shape() {
        let fx = fixture().await;

        for payload in [
            json!([]),
            json!({"version": 2, "project": {"name": "Demo"}}),
            json!({"version": "1", "project": {"name": "Demo"}}),
            json!({"sessions": []}),
            json!({"project": {"name": "   "}}),
            json!({"project": "Demo"}),
        ] {
            let err = fx.transfer.import_project(payload).await.unwrap_err();
            assert!(err.is_invalid_input());
        }
        let err = fx.transfer.import_project_json("{ nope").await.unwrap_err();
        assert!(err.is_invalid_input());

        let projects = DbProjectRepository::new(fx.db.clone());
        assert_eq!(projects.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_import_discards_malformed_and_orphaned_entries() {
        let fx = fixture().await;

        let payload = json!({
            "project": {"name": "Hand written", "current_session_id": "gone"},
            "sessions": [
                "not an object",
                {"id": "s1", "history": [{"role": "user", "content": "hi"}, {"role": 7}]},
            ],
            "artifacts": [
                {"id": "a1", "title": "Kept", "prompt_content": "Do {{x}}", "current_session_id": "x9"},
                {"id": "a2", "title": "", "prompt_content": "No title"},
            ],
            "artifact_sessions": [
                {"id": "x1", "artifact_id": "a1"},
                {"id": "x2", "artifact_id": "a2"},
                {"id": "x3", "artifact_id": "unknown"},
            ],
        });

        let report = fx.transfer.import_project(payload).await.unwrap();
        assert_eq!(report.sessions_imported, 1);
        assert_eq!(report.artifacts_imported, 1);
        assert_eq!(report.artifact_sessions_imported, 1);
        assert_eq!(report.malformed_discarded, 2);
        assert_eq!(report.orphans_discarded, 2);

        let imported = fx.transfer.export_project(&report.project.id).await.unwrap();
        assert_eq!(imported.sessions[0].history.len(), 1);
        assert_eq!(
            imported.project.current_session_id.as_deref(),
            Some(imported.sessions[0].id.as_str())
        );
        assert_eq!(
            imported.artifacts[0].current_session_id.as_deref(),
            Some(imported.artifact_sessions[0].id.as_str())
        );
    }

    #[tokio::test]
    async fn test_json_round_trip() {
        let fx = fixture().await;

        let json = fx.transfer.export_project_json(&fx.project_id).await.unwrap();
        let first = fx.transfer.import_project_json(&json).await.unwrap();
        let second = fx.transfer.import_project_json(&json).await.unwrap();
        assert_ne!(first.project.id, second.project.id);
        assert_eq!(first.sessions_imported, 2);
        assert_eq!(second.artifact_sessions_imported, 3);
    }
}
