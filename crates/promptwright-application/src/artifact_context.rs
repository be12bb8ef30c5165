//! Artifact context assembly.

use promptwright_core::artifact::{Artifact, ArtifactRepository};
use promptwright_core::artifact_session::{
    ArtifactSession, ArtifactSessionRepository, NewArtifactSession,
};
use promptwright_core::error::{Result, StoreError};
use promptwright_core::session::HistoryItem;
use promptwright_core::summary::SessionSummary;
use std::sync::Arc;
use tokio::sync::Mutex;

/// An artifact together with its active conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactContext {
    /// The artifact, including its template and variable schema
    pub artifact: Artifact,
    /// All sessions of the artifact, newest first
    pub sessions: Vec<SessionSummary>,
    pub current_session_id: String,
    pub history: Vec<HistoryItem>,
}

/// Use case for loading an artifact's conversation context.
///
/// Resolution mirrors [`crate::ProjectContextService`] with the artifact's
/// pointer in place of the project's.
pub struct ArtifactContextService {
    artifact_repository: Arc<dyn ArtifactRepository>,
    artifact_session_repository: Arc<dyn ArtifactSessionRepository>,
    assembly_lock: Mutex<()>,
}

impl ArtifactContextService {
    pub fn new(
        artifact_repository: Arc<dyn ArtifactRepository>,
        artifact_session_repository: Arc<dyn ArtifactSessionRepository>,
    ) -> Self {
        Self {
            artifact_repository,
            artifact_session_repository,
            assembly_lock: Mutex::new(()),
        }
    }

    /// Loads the artifact's context, resolving its current session.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the artifact does not exist or
    /// belongs to another project.
    pub async fn load_artifact_context(
        &self,
        project_id: &str,
        artifact_id: &str,
    ) -> Result<ArtifactContext> {
        let _guard = self.assembly_lock.lock().await;

        let mut artifact = self
            .artifact_repository
            .get(project_id, artifact_id)
            .await?
            .ok_or_else(|| StoreError::not_found("artifact", artifact_id))?;
        let mut sessions = self.artifact_session_repository.list(artifact_id).await?;

        let pointed = artifact
            .current_session_id
            .as_deref()
            .and_then(|id| sessions.iter().position(|s| s.id == id));

        let current: ArtifactSession = if let Some(index) = pointed {
            sessions[index].clone()
        } else if let Some(newest) = sessions.first().cloned() {
            tracing::debug!(
                artifact_id,
                stale = ?artifact.current_session_id,
                session_id = %newest.id,
                "Repairing artifact's current session pointer"
            );
            match self
                .artifact_session_repository
                .select(artifact_id, &newest.id)
                .await?
            {
                Some(session) => session,
                None => newest,
            }
        } else {
            let session = self
                .artifact_session_repository
                .create(artifact_id, NewArtifactSession::default())
                .await?;
            tracing::info!(artifact_id, session_id = %session.id, "Started first artifact session");
            sessions.push(session.clone());
            session
        };
        artifact.current_session_id = Some(current.id.clone());

        Ok(ArtifactContext {
            artifact,
            sessions: sessions.iter().map(ArtifactSession::summary).collect(),
            current_session_id: current.id,
            history: current.history,
        })
    }
}
