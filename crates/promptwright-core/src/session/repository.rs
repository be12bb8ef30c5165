//! Session repository trait.
//!
//! Defines the interface for wizard session persistence operations.

use super::model::{NewSession, Session, SessionPatch};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for managing wizard sessions.
///
/// Every operation is scoped by the owning project. A session that exists
/// but belongs to a different project is treated exactly like a missing one.
///
/// # Implementation Notes
///
/// Implementations must keep the project's `current_session_id` consistent
/// with the session set:
/// - `create` and `select` point the project at the affected session in the
///   same transaction that touches the session
/// - `delete` of the current session repoints to the most recently created
///   remaining session, or clears the pointer
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Lists the project's sessions, newest first.
    async fn list(&self, project_id: &str) -> Result<Vec<Session>>;

    /// Finds a session owned by the project.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: Session found
    /// - `Ok(None)`: Session not found or owned by another project
    /// - `Err(_)`: Error occurred during retrieval
    async fn get(&self, project_id: &str, session_id: &str) -> Result<Option<Session>>;

    /// Creates a session and makes it the project's current session.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the project does not exist.
    async fn create(&self, project_id: &str, payload: NewSession) -> Result<Session>;

    /// Applies a patch with a read-modify-write of the record.
    ///
    /// Returns `Ok(None)` without writing when the session is not found.
    async fn update(
        &self,
        project_id: &str,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<Option<Session>>;

    /// Deletes a session, repairing the project's pointer if needed.
    ///
    /// Returns `Ok(false)` when nothing was deleted.
    async fn delete(&self, project_id: &str, session_id: &str) -> Result<bool>;

    /// Makes the session the project's current session.
    ///
    /// Returns `Ok(None)` without writing when the session is not found.
    async fn select(&self, project_id: &str, session_id: &str) -> Result<Option<Session>>;
}
