//! Artifact repository trait.

use super::model::{Artifact, ArtifactPatch, NewArtifact};
use crate::error::Result;
use async_trait::async_trait;

/// Repository for artifact persistence, scoped by owning project.
///
/// # Implementation Notes
///
/// `delete` removes the artifact and every artifact session whose
/// `artifact_id` equals it, in one transaction.
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    /// Lists the project's artifacts, newest first.
    async fn list(&self, project_id: &str) -> Result<Vec<Artifact>>;

    /// Finds an artifact owned by the project.
    async fn get(&self, project_id: &str, artifact_id: &str) -> Result<Option<Artifact>>;

    /// Creates an artifact under the project.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidInput` if the title or prompt content is blank
    /// - `StoreError::NotFound` if the project does not exist
    async fn create(&self, project_id: &str, payload: NewArtifact) -> Result<Artifact>;

    /// Applies a patch to an artifact.
    ///
    /// Returns `Ok(None)` without writing when the artifact is not found.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidInput` if the patch blanks the title or
    /// prompt content.
    async fn update(
        &self,
        project_id: &str,
        artifact_id: &str,
        patch: ArtifactPatch,
    ) -> Result<Option<Artifact>>;

    /// Deletes an artifact and its artifact sessions.
    ///
    /// Returns `Ok(false)` when nothing was deleted.
    async fn delete(&self, project_id: &str, artifact_id: &str) -> Result<bool>;
}
