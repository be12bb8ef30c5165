//! Project repository trait.

use super::model::{NewProject, Project, ProjectPatch};
use crate::error::Result;
use async_trait::async_trait;

/// Repository for project persistence.
///
/// # Implementation Notes
///
/// `delete` is a fan-out delete: the project and every session, artifact
/// and artifact session it owns disappear in one transaction.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Lists all projects, most recently updated first.
    async fn list(&self) -> Result<Vec<Project>>;

    /// Finds a project by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Project))`: Project found
    /// - `Ok(None)`: Project not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn get(&self, project_id: &str) -> Result<Option<Project>>;

    /// Creates a project with no sessions.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidInput` if the name is blank.
    async fn create(&self, payload: NewProject) -> Result<Project>;

    /// Applies a patch to a project.
    ///
    /// Returns `Ok(None)` without writing when the project is not found.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidInput` if the patch sets a blank name.
    async fn update(&self, project_id: &str, patch: ProjectPatch) -> Result<Option<Project>>;

    /// Deletes a project and everything it owns.
    ///
    /// Returns `Ok(false)` when the project did not exist.
    async fn delete(&self, project_id: &str) -> Result<bool>;

    /// Looks up a project, failing when it is missing.
    async fn require(&self, project_id: &str) -> Result<Project> {
        self.get(project_id)
            .await?
            .ok_or_else(|| crate::error::StoreError::not_found("project", project_id))
    }
}
