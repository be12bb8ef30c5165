//! Database-backed ProjectRepository implementation.

use crate::repository_support::{
    ARTIFACT_INDEX, PROJECT_INDEX, decode_records, delete_by_index, read_project,
};
use crate::sanitize::sanitize_project;
use crate::storage::{Database, StoreName, TxMode};
use async_trait::async_trait;
use promptwright_core::error::{Result, StoreError};
use promptwright_core::id::create_id;
use promptwright_core::project::{NewProject, Project, ProjectPatch, ProjectRepository};
use promptwright_core::time::now_millis;

/// Project repository over the shared [`Database`].
#[derive(Debug, Clone)]
pub struct DbProjectRepository {
    db: Database,
}

impl DbProjectRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::invalid_input("project name must not be blank"));
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.trim().is_empty())
}

#[async_trait]
impl ProjectRepository for DbProjectRepository {
    async fn list(&self) -> Result<Vec<Project>> {
        let values = self
            .db
            .with_store(StoreName::Projects, TxMode::ReadOnly, |tx| {
                tx.get_all(StoreName::Projects)
            })
            .await?;

        let mut projects = decode_records(StoreName::Projects, values, sanitize_project);
        projects.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(projects)
    }

    async fn get(&self, project_id: &str) -> Result<Option<Project>> {
        self.db
            .with_store(StoreName::Projects, TxMode::ReadOnly, |tx| {
                read_project(tx, project_id)
            })
            .await
    }

    async fn create(&self, payload: NewProject) -> Result<Project> {
        let name = validate_name(&payload.name)?;
        let now = now_millis();
        let project = Project {
            id: create_id(),
            name,
            description: normalize_description(payload.description),
            created_at: now,
            updated_at: now,
            current_session_id: None,
        };

        self.db
            .with_store(StoreName::Projects, TxMode::ReadWrite, |tx| {
                tx.put(StoreName::Projects, &project)
            })
            .await?;

        tracing::info!(project_id = %project.id, "Created project '{}'", project.name);
        Ok(project)
    }

    async fn update(&self, project_id: &str, patch: ProjectPatch) -> Result<Option<Project>> {
        let name = patch.name.as_deref().map(validate_name).transpose()?;
        let description = patch.description.map(normalize_description);

        self.db
            .with_store(StoreName::Projects, TxMode::ReadWrite, move |tx| {
                let Some(mut project) = read_project(tx, project_id)? else {
                    return Ok(None);
                };
                if let Some(name) = name {
                    project.name = name;
                }
                if let Some(description) = description {
                    project.description = description;
                }
                project.updated_at = now_millis();
                tx.put(StoreName::Projects, &project)?;
                Ok(Some(project))
            })
            .await
    }

    async fn delete(&self, project_id: &str) -> Result<bool> {
        let removed = self
            .db
            .with_stores(&StoreName::ALL, TxMode::ReadWrite, |tx| {
                if read_project(tx, project_id)?.is_none() {
                    return Ok(None);
                }

                // Artifact sessions go first so none outlives its artifact
                let mut artifact_sessions = 0;
                for artifact_id in
                    tx.get_all_keys_by_index(StoreName::Artifacts, PROJECT_INDEX, project_id)?
                {
                    artifact_sessions += delete_by_index(
                        tx,
                        StoreName::ArtifactSessions,
                        ARTIFACT_INDEX,
                        &artifact_id,
                    )?;
                    tx.delete(StoreName::Artifacts, &artifact_id)?;
                }
                // Catches artifact sessions whose artifact was already gone
                artifact_sessions +=
                    delete_by_index(tx, StoreName::ArtifactSessions, PROJECT_INDEX, project_id)?;
                let sessions = delete_by_index(tx, StoreName::Sessions, PROJECT_INDEX, project_id)?;
                tx.delete(StoreName::Projects, project_id)?;

                Ok(Some((sessions, artifact_sessions)))
            })
            .await?;

        match removed {
            Some((sessions, artifact_sessions)) => {
                tracing::info!(
                    project_id,
                    sessions,
                    artifact_sessions,
                    "Deleted project and its children"
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DbArtifactRepository, DbArtifactSessionRepository, DbSessionRepository};
    use promptwright_core::artifact::{ArtifactRepository, NewArtifact};
    use promptwright_core::artifact_session::{ArtifactSessionRepository, NewArtifactSession};
    use promptwright_core::session::{NewSession, SessionRepository};

    async fn repository() -> (Database, DbProjectRepository) {
        let db = Database::open_in_memory().await.unwrap();
        (db.clone(), DbProjectRepository::new(db))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_db, repository) = repository().await;

        let project = repository
            .create(NewProject {
                name: "  Demo  ".to_string(),
                description: Some("   ".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(project.name, "Demo");
        assert_eq!(project.description, None);
        assert_eq!(project.current_session_id, None);

        let loaded = repository.get(&project.id).await.unwrap().unwrap();
        assert_eq!(loaded, project);
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let (_db, repository) = repository().await;

        let err = repository.create(NewProject::named(" ")).await.unwrap_err();
        assert!(err.is_invalid_input());
        assert!(repository.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_require_missing_project_is_not_found() {
        let (_db, repository) = repository().await;
        let err = repository.require("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_orders_by_most_recent_update() {
        let (_db, repository) = repository().await;

        let first = repository.create(NewProject::named("First")).await.unwrap();
        let second = repository.create(NewProject::named("Second")).await.unwrap();
        repository
            .update(
                &first.id,
                ProjectPatch {
                    name: Some("First (renamed)".to_string()),
                    ..ProjectPatch::default()
                },
            )
            .await
            .unwrap();

        let names: Vec<String> = repository
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["First (renamed)", "Second"]);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_update_missing_project_is_a_no_op() {
        let (_db, repository) = repository().await;

        let result = repository
            .update("missing", ProjectPatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(repository.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_clears_description() {
        let (_db, repository) = repository().await;
        let project = repository
            .create(NewProject {
                name: "Demo".to_string(),
                description: Some("about".to_string()),
            })
            .await
            .unwrap();

        let updated = repository
            .update(
                &project.id,
                ProjectPatch {
                    description: Some(None),
                    ..ProjectPatch::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.description, None);
        assert!(updated.updated_at > project.updated_at);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_every_child() {
        let (db, repository) = repository().await;
        let sessions = DbSessionRepository::new(db.clone());
        let artifacts = DbArtifactRepository::new(db.clone());
        let artifact_sessions = DbArtifactSessionRepository::new(db.clone());

        let doomed = repository.create(NewProject::named("Doomed")).await.unwrap();
        let kept = repository.create(NewProject::named("Kept")).await.unwrap();

        for project in [&doomed, &kept] {
            sessions
                .create(&project.id, NewSession::default())
                .await
                .unwrap();
            let artifact = artifacts
                .create(
                    &project.id,
                    NewArtifact {
                        title: "Template".to_string(),
                        prompt_content: "Summarize {{topic}}".to_string(),
                        ..NewArtifact::default()
                    },
                )
                .await
                .unwrap();
            artifact_sessions
                .create(&artifact.id, NewArtifactSession::default())
                .await
                .unwrap();
        }

        assert!(repository.delete(&doomed.id).await.unwrap());
        assert!(!repository.delete(&doomed.id).await.unwrap());

        let counts = db
            .with_stores(&StoreName::ALL, TxMode::ReadOnly, |tx| {
                Ok(StoreName::ALL
                    .iter()
                    .map(|store| tx.get_all(*store).map(|records| records.len()))
                    .collect::<Result<Vec<_>>>()?)
            })
            .await
            .unwrap();
        assert_eq!(counts, vec![1, 1, 1, 1]);
        assert!(repository.get(&kept.id).await.unwrap().is_some());
        assert_eq!(sessions.list(&kept.id).await.unwrap().len(), 1);
    }
}
