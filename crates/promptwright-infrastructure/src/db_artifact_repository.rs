//! Database-backed ArtifactRepository implementation.

use crate::repository_support::{
    ARTIFACT_INDEX, PROJECT_INDEX, decode_records, delete_by_index, read_owned_artifact,
    read_project,
};
use crate::sanitize::{normalize_variables, sanitize_artifact};
use crate::storage::{Database, StoreName, TxMode};
use async_trait::async_trait;
use promptwright_core::artifact::{Artifact, ArtifactPatch, ArtifactRepository, NewArtifact};
use promptwright_core::error::{Result, StoreError};
use promptwright_core::id::create_id;
use promptwright_core::time::now_millis;

/// Artifact repository over the shared [`Database`].
#[derive(Debug, Clone)]
pub struct DbArtifactRepository {
    db: Database,
}

impl DbArtifactRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::invalid_input(format!(
            "artifact {} must not be blank",
            field
        )));
    }
    Ok(())
}

#[async_trait]
impl ArtifactRepository for DbArtifactRepository {
    async fn list(&self, project_id: &str) -> Result<Vec<Artifact>> {
        let values = self
            .db
            .with_store(StoreName::Artifacts, TxMode::ReadOnly, |tx| {
                tx.get_all_by_index(StoreName::Artifacts, PROJECT_INDEX, project_id)
            })
            .await?;

        let mut artifacts = decode_records(StoreName::Artifacts, values, sanitize_artifact);
        artifacts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(artifacts)
    }

    async fn get(&self, project_id: &str, artifact_id: &str) -> Result<Option<Artifact>> {
        self.db
            .with_store(StoreName::Artifacts, TxMode::ReadOnly, |tx| {
                read_owned_artifact(tx, project_id, artifact_id)
            })
            .await
    }

    async fn create(&self, project_id: &str, payload: NewArtifact) -> Result<Artifact> {
        require_text("title", &payload.title)?;
        require_text("prompt content", &payload.prompt_content)?;

        let now = now_millis();
        let artifact = Artifact {
            id: create_id(),
            project_id: project_id.to_string(),
            title: payload.title.trim().to_string(),
            problem: payload.problem,
            prompt_content: payload.prompt_content,
            variables: normalize_variables(payload.variables),
            created_at: now,
            updated_at: now,
            current_session_id: None,
        };

        self.db
            .with_stores(
                &[StoreName::Projects, StoreName::Artifacts],
                TxMode::ReadWrite,
                |tx| {
                    if read_project(tx, project_id)?.is_none() {
                        return Err(StoreError::not_found("project", project_id));
                    }
                    tx.put(StoreName::Artifacts, &artifact)
                },
            )
            .await?;

        tracing::info!(
            project_id,
            artifact_id = %artifact.id,
            variables = artifact.variables.len(),
            "Created artifact '{}'",
            artifact.title
        );
        Ok(artifact)
    }

    async fn update(
        &self,
        project_id: &str,
        artifact_id: &str,
        patch: ArtifactPatch,
    ) -> Result<Option<Artifact>> {
        if let Some(title) = &patch.title {
            require_text("title", title)?;
        }
        if let Some(prompt_content) = &patch.prompt_content {
            require_text("prompt content", prompt_content)?;
        }

        self.db
            .with_store(StoreName::Artifacts, TxMode::ReadWrite, move |tx| {
                let Some(mut artifact) = read_owned_artifact(tx, project_id, artifact_id)? else {
                    return Ok(None);
                };
                if let Some(title) = patch.title {
                    artifact.title = title.trim().to_string();
                }
                if let Some(problem) = patch.problem {
                    artifact.problem = problem;
                }
                if let Some(prompt_content) = patch.prompt_content {
                    artifact.prompt_content = prompt_content;
                }
                if let Some(variables) = patch.variables {
                    artifact.variables = normalize_variables(variables);
                }
                artifact.updated_at = now_millis();
                tx.put(StoreName::Artifacts, &artifact)?;
                Ok(Some(artifact))
            })
            .await
    }

    async fn delete(&self, project_id: &str, artifact_id: &str) -> Result<bool> {
        let removed = self
            .db
            .with_stores(
                &[StoreName::Artifacts, StoreName::ArtifactSessions],
                TxMode::ReadWrite,
                |tx| {
                    if read_owned_artifact(tx, project_id, artifact_id)?.is_none() {
                        return Ok(None);
                    }
                    let sessions = delete_by_index(
                        tx,
                        StoreName::ArtifactSessions,
                        ARTIFACT_INDEX,
                        artifact_id,
                    )?;
                    tx.delete(StoreName::Artifacts, artifact_id)?;
                    Ok(Some(sessions))
                },
            )
            .await?;

        match removed {
            Some(sessions) => {
                tracing::info!(project_id, artifact_id, sessions, "Deleted artifact");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
