//! Database-backed ArtifactSessionRepository implementation.

use crate::db_session_repository::normalize_title;
use crate::repository_support::{
    read_artifact, read_owned_artifact_session, repair_target, sessions_of_artifact,
};
use crate::storage::{Database, StoreName, TxMode};
use async_trait::async_trait;
use promptwright_core::artifact_session::{
    ArtifactSession, ArtifactSessionPatch, ArtifactSessionRepository, NewArtifactSession,
};
use promptwright_core::error::{Result, StoreError};
use promptwright_core::id::create_id;
use promptwright_core::time::now_millis;

const STORES: [StoreName; 2] = [StoreName::Artifacts, StoreName::ArtifactSessions];

/// Artifact-session repository over the shared [`Database`].
#[derive(Debug, Clone)]
pub struct DbArtifactSessionRepository {
    db: Database,
}

impl DbArtifactSessionRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ArtifactSessionRepository for DbArtifactSessionRepository {
    async fn list(&self, artifact_id: &str) -> Result<Vec<ArtifactSession>> {
        self.db
            .with_store(StoreName::ArtifactSessions, TxMode::ReadOnly, |tx| {
                sessions_of_artifact(tx, artifact_id)
            })
            .await
    }

    async fn get(&self, artifact_id: &str, session_id: &str) -> Result<Option<ArtifactSession>> {
        self.db
            .with_store(StoreName::ArtifactSessions, TxMode::ReadOnly, |tx| {
                read_owned_artifact_session(tx, artifact_id, session_id)
            })
            .await
    }

    async fn create(
        &self,
        artifact_id: &str,
        payload: NewArtifactSession,
    ) -> Result<ArtifactSession> {
        let session = self
            .db
            .with_stores(&STORES, TxMode::ReadWrite, |tx| {
                let mut artifact = read_artifact(tx, artifact_id)?
                    .ok_or_else(|| StoreError::not_found("artifact", artifact_id))?;

                let now = now_millis();
                let mut session = ArtifactSession {
                    id: create_id(),
                    project_id: artifact.project_id.clone(),
                    artifact_id: artifact.id.clone(),
                    created_at: now,
                    updated_at: now,
                    history: payload.history,
                    title: normalize_title(payload.title),
                    last_message: None,
                };
                session.refresh_last_message();

                tx.put(StoreName::ArtifactSessions, &session)?;
                artifact.current_session_id = Some(session.id.clone());
                tx.put(StoreName::Artifacts, &artifact)?;
                Ok(session)
            })
            .await?;

        tracing::debug!(artifact_id, session_id = %session.id, "Created artifact session");
        Ok(session)
    }

    async fn update(
        &self,
        artifact_id: &str,
        session_id: &str,
        patch: ArtifactSessionPatch,
    ) -> Result<Option<ArtifactSession>> {
        self.db
            .with_store(StoreName::ArtifactSessions, TxMode::ReadWrite, move |tx| {
                let Some(mut session) = read_owned_artifact_session(tx, artifact_id, session_id)?
                else {
                    return Ok(None);
                };
                if let Some(history) = patch.history {
                    session.history = history;
                }
                if let Some(title) = patch.title {
                    session.title = normalize_title(title);
                }
                session.refresh_last_message();
                session.updated_at = now_millis();
                tx.put(StoreName::ArtifactSessions, &session)?;
                Ok(Some(session))
            })
            .await
    }

    async fn delete(&self, artifact_id: &str, session_id: &str) -> Result<bool> {
        self.db
            .with_stores(&STORES, TxMode::ReadWrite, |tx| {
                if read_owned_artifact_session(tx, artifact_id, session_id)?.is_none() {
                    return Ok(false);
                }
                tx.delete(StoreName::ArtifactSessions, session_id)?;

                if let Some(mut artifact) = read_artifact(tx, artifact_id)? {
                    if artifact.current_session_id.as_deref() == Some(session_id) {
                        let remaining = sessions_of_artifact(tx, artifact_id)?;
                        artifact.current_session_id = repair_target(&remaining);
                        tx.put(StoreName::Artifacts, &artifact)?;
                    }
                }
                Ok(true)
            })
            .await
    }

    async fn select(
        &self,
        artifact_id: &str,
        session_id: &str,
    ) -> Result<Option<ArtifactSession>> {
        self.db
            .with_stores(&STORES, TxMode::ReadWrite, |tx| {
                let Some(session) = read_owned_artifact_session(tx, artifact_id, session_id)?
                else {
                    return Ok(None);
                };
                let Some(mut artifact) = read_artifact(tx, artifact_id)? else {
                    return Ok(None);
                };
                if artifact.current_session_id.as_deref() != Some(session_id) {
                    artifact.current_session_id = Some(session.id.clone());
                    tx.put(StoreName::Artifacts, &artifact)?;
                }
                Ok(Some(session))
            })
            .await
    }
}
