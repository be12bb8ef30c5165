//! Project context assembly.
//!
//! Gathers everything needed to render a project's wizard view in one call:
//! the project, its session list and the active session's conversation.

use promptwright_core::error::Result;
use promptwright_core::project::{Project, ProjectRepository};
use promptwright_core::session::{HistoryItem, NewSession, Session, SessionRepository, SessionState};
use promptwright_core::summary::SessionSummary;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A project together with its active wizard session.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectContext {
    pub project: Project,
    /// All sessions of the project, newest first
    pub sessions: Vec<SessionSummary>,
    pub current_session_id: String,
    pub history: Vec<HistoryItem>,
    pub state: Option<SessionState>,
}

/// Use case for loading a project's wizard context.
///
/// # Thread Safety
///
/// Assembly is serialized through an internal mutex, so two concurrent
/// loads of a project with no sessions create exactly one.
pub struct ProjectContextService {
    project_repository: Arc<dyn ProjectRepository>,
    session_repository: Arc<dyn SessionRepository>,
    assembly_lock: Mutex<()>,
}

impl ProjectContextService {
    pub fn new(
        project_repository: Arc<dyn ProjectRepository>,
        session_repository: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            project_repository,
            session_repository,
            assembly_lock: Mutex::new(()),
        }
    }

    /// Loads the project's context, resolving its current session.
    ///
    /// The current session is the project's pointer if it resolves, else
    /// the most recently created session (the pointer is repaired), else a
    /// newly created empty session. Creating that session is the only write
    /// this performs.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the project does not exist.
    pub async fn load_project_context(&self, project_id: &str) -> Result<ProjectContext> {
        let _guard = self.assembly_lock.lock().await;

        let mut project = self.project_repository.require(project_id).await?;
        let mut sessions = self.session_repository.list(project_id).await?;

        let pointed = project
            .current_session_id
            .as_deref()
            .and_then(|id| sessions.iter().position(|s| s.id == id));

        let current: Session = if let Some(index) = pointed {
            sessions[index].clone()
        } else if let Some(newest) = sessions.first().cloned() {
            tracing::debug!(
                project_id,
                stale = ?project.current_session_id,
                session_id = %newest.id,
                "Repairing project's current session pointer"
            );
            match self.session_repository.select(project_id, &newest.id).await? {
                Some(session) => session,
                None => newest,
            }
        } else {
            let session = self
                .session_repository
                .create(project_id, NewSession::default())
                .await?;
            tracing::info!(project_id, session_id = %session.id, "Started first session");
            sessions.push(session.clone());
            session
        };
        project.current_session_id = Some(current.id.clone());

        Ok(ProjectContext {
            project,
            sessions: sessions.iter().map(Session::summary).collect(),
            current_session_id: current.id,
            history: current.history,
            state: current.state,
        })
    }
}
