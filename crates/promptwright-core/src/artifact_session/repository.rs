//! Artifact session repository trait.

use super::model::{ArtifactSession, ArtifactSessionPatch, NewArtifactSession};
use crate::error::Result;
use async_trait::async_trait;

/// Repository for artifact sessions, scoped by owning artifact.
///
/// Mirrors [`crate::session::SessionRepository`] with the artifact's
/// `current_session_id` as the pointer being maintained.
#[async_trait]
pub trait ArtifactSessionRepository: Send + Sync {
    /// Lists the artifact's sessions, newest first.
    async fn list(&self, artifact_id: &str) -> Result<Vec<ArtifactSession>>;

    async fn get(&self, artifact_id: &str, session_id: &str) -> Result<Option<ArtifactSession>>;

    /// Creates an artifact session and makes it the artifact's current one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the artifact does not exist; an
    /// orphan is never created.
    async fn create(
        &self,
        artifact_id: &str,
        payload: NewArtifactSession,
    ) -> Result<ArtifactSession>;

    /// Returns `Ok(None)` without writing when the session is not found.
    async fn update(
        &self,
        artifact_id: &str,
        session_id: &str,
        patch: ArtifactSessionPatch,
    ) -> Result<Option<ArtifactSession>>;

    /// Deletes an artifact session, repairing the artifact's pointer.
    async fn delete(&self, artifact_id: &str, session_id: &str) -> Result<bool>;

    /// Returns `Ok(None)` without writing when the session is not found.
    async fn select(&self, artifact_id: &str, session_id: &str)
    -> Result<Option<ArtifactSession>>;
}
