//! Database-backed SessionRepository implementation.

use crate::repository_support::{
    read_owned_session, read_project, repair_target, sessions_of_project,
};
use crate::storage::{Database, StoreName, TxMode};
use async_trait::async_trait;
use promptwright_core::error::{Result, StoreError};
use promptwright_core::id::create_id;
use promptwright_core::session::{NewSession, Session, SessionPatch, SessionRepository};
use promptwright_core::time::now_millis;

const STORES: [StoreName; 2] = [StoreName::Projects, StoreName::Sessions];

/// Wizard-session repository over the shared [`Database`].
#[derive(Debug, Clone)]
pub struct DbSessionRepository {
    db: Database,
}

impl DbSessionRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

pub(crate) fn normalize_title(title: Option<String>) -> Option<String> {
    title.filter(|t| !t.trim().is_empty())
}

#[async_trait]
impl SessionRepository for DbSessionRepository {
    async fn list(&self, project_id: &str) -> Result<Vec<Session>> {
        self.db
            .with_store(StoreName::Sessions, TxMode::ReadOnly, |tx| {
                sessions_of_project(tx, project_id)
            })
            .await
    }

    async fn get(&self, project_id: &str, session_id: &str) -> Result<Option<Session>> {
        self.db
            .with_store(StoreName::Sessions, TxMode::ReadOnly, |tx| {
                read_owned_session(tx, project_id, session_id)
            })
            .await
    }

    async fn create(&self, project_id: &str, payload: NewSession) -> Result<Session> {
        let now = now_millis();
        let mut session = Session {
            id: create_id(),
            project_id: project_id.to_string(),
            created_at: now,
            updated_at: now,
            history: payload.history,
            state: payload.state,
            title: normalize_title(payload.title),
            last_message: None,
        };
        session.refresh_last_message();

        self.db
            .with_stores(&STORES, TxMode::ReadWrite, |tx| {
                let mut project = read_project(tx, project_id)?
                    .ok_or_else(|| StoreError::not_found("project", project_id))?;
                tx.put(StoreName::Sessions, &session)?;
                project.current_session_id = Some(session.id.clone());
                tx.put(StoreName::Projects, &project)
            })
            .await?;

        tracing::debug!(project_id, session_id = %session.id, "Created session");
        Ok(session)
    }

    async fn update(
        &self,
        project_id: &str,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<Option<Session>> {
        self.db
            .with_store(StoreName::Sessions, TxMode::ReadWrite, move |tx| {
                let Some(mut session) = read_owned_session(tx, project_id, session_id)? else {
                    return Ok(None);
                };
                if let Some(history) = patch.history {
                    session.history = history;
                }
                if let Some(state) = patch.state {
                    session.state = state;
                }
                if let Some(title) = patch.title {
                    session.title = normalize_title(title);
                }
                session.refresh_last_message();
                session.updated_at = now_millis();
                tx.put(StoreName::Sessions, &session)?;
                Ok(Some(session))
            })
            .await
    }

    async fn delete(&self, project_id: &str, session_id: &str) -> Result<bool> {
        self.db
            .with_stores(&STORES, TxMode::ReadWrite, |tx| {
                if read_owned_session(tx, project_id, session_id)?.is_none() {
                    return Ok(false);
                }
                tx.delete(StoreName::Sessions, session_id)?;

                if let Some(mut project) = read_project(tx, project_id)? {
                    if project.current_session_id.as_deref() == Some(session_id) {
                        let remaining = sessions_of_project(tx, project_id)?;
                        project.current_session_id = repair_target(&remaining);
                        tracing::debug!(
                            project_id,
                            current = ?project.current_session_id,
                            "Repointed project after deleting its current session"
                        );
                        tx.put(StoreName::Projects, &project)?;
                    }
                }
                Ok(true)
            })
            .await
    }

    async fn select(&self, project_id: &str, session_id: &str) -> Result<Option<Session>> {
        self.db
            .with_stores(&STORES, TxMode::ReadWrite, |tx| {
                let Some(session) = read_owned_session(tx, project_id, session_id)? else {
                    return Ok(None);
                };
                let Some(mut project) = read_project(tx, project_id)? else {
                    return Ok(None);
                };
                if project.current_session_id.as_deref() != Some(session_id) {
                    project.current_session_id = Some(session.id.clone());
                    tx.put(StoreName::Projects, &project)?;
                }
                Ok(Some(session))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbProjectRepository;
    use promptwright_core::project::{NewProject, ProjectRepository};
    use promptwright_core::session::{HistoryItem, SessionState};
    use promptwright_core::summary::FORM_SUBMISSION_MARKER;

    struct Fixture {
        projects: DbProjectRepository,
        sessions: DbSessionRepository,
        project_id: String,
    }

    async fn fixture() -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        let projects = DbProjectRepository::new(db.clone());
        let sessions = DbSessionRepository::new(db);
        let project_id = projects.create(NewProject::named("Demo")).await.unwrap().id;
        Fixture {
            projects,
            sessions,
            project_id,
        }
    }

    async fn current_pointer(fx: &Fixture) -> Option<String> {
        fx.projects
            .require(&fx.project_id)
            .await
            .unwrap()
            .current_session_id
    }

    #[tokio::test]
    async fn test_create_points_project_at_new_session() {
        let fx = fixture().await;

        let first = fx
            .sessions
            .create(&fx.project_id, NewSession::default())
            .await
            .unwrap();
        assert_eq!(current_pointer(&fx).await, Some(first.id.clone()));

        let second = fx
            .sessions
            .create(&fx.project_id, NewSession::default())
            .await
            .unwrap();
        assert_eq!(current_pointer(&fx).await, Some(second.id.clone()));

        let ids: Vec<String> = fx
            .sessions
            .list(&fx.project_id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_create_under_missing_project_fails() {
        let fx = fixture().await;

        let err = fx
            .sessions
            .create("missing", NewSession::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(fx.sessions.list("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_refreshes_preview_and_timestamp() {
        let fx = fixture().await;
        let session = fx
            .sessions
            .create(&fx.project_id, NewSession::default())
            .await
            .unwrap();
        assert_eq!(session.last_message, None);

        let history = vec![
            HistoryItem::user("I need a prompt for release notes"),
            HistoryItem::user(format!("{}\n{{\"q1\":\"engineers\"}}", FORM_SUBMISSION_MARKER)),
        ];
        let updated = fx
            .sessions
            .update(
                &fx.project_id,
                &session.id,
                SessionPatch::history(history.clone())
                    .with_state(Some(SessionState::default()))
                    .with_title(Some("Release notes".to_string())),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.history, history);
        assert_eq!(updated.last_message.as_deref(), Some("Submitted answers"));
        assert_eq!(updated.title.as_deref(), Some("Release notes"));
        assert!(updated.state.is_some());
        assert!(updated.updated_at > session.updated_at);
        assert_eq!(updated.created_at, session.created_at);

        let stored = fx
            .sessions
            .get(&fx.project_id, &session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_update_missing_session_writes_nothing() {
        let fx = fixture().await;

        let result = fx
            .sessions
            .update(&fx.project_id, "missing", SessionPatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(fx.sessions.list(&fx.project_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_project_cannot_see_session() {
        let fx = fixture().await;
        let other = fx.projects.create(NewProject::named("Other")).await.unwrap();
        let session = fx
            .sessions
            .create(&fx.project_id, NewSession::default())
            .await
            .unwrap();

        assert!(fx.sessions.get(&other.id, &session.id).await.unwrap().is_none());
        assert!(!fx.sessions.delete(&other.id, &session.id).await.unwrap());
        assert!(
            fx.sessions
                .select(&other.id, &session.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(fx.sessions.get(&fx.project_id, &session.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_current_repoints_to_newest_remaining() {
        let fx = fixture().await;
        let oldest = fx
            .sessions
            .create(&fx.project_id, NewSession::default())
            .await
            .unwrap();
        let middle = fx
            .sessions
            .create(&fx.project_id, NewSession::default())
            .await
            .unwrap();
        let newest = fx
            .sessions
            .create(&fx.project_id, NewSession::default())
            .await
            .unwrap();

        fx.sessions.select(&fx.project_id, &oldest.id).await.unwrap();
        assert!(fx.sessions.delete(&fx.project_id, &oldest.id).await.unwrap());
        assert_eq!(current_pointer(&fx).await, Some(newest.id.clone()));

        // Deleting a non-current session leaves the pointer alone
        assert!(fx.sessions.delete(&fx.project_id, &middle.id).await.unwrap());
        assert_eq!(current_pointer(&fx).await, Some(newest.id.clone()));

        assert!(fx.sessions.delete(&fx.project_id, &newest.id).await.unwrap());
        assert_eq!(current_pointer(&fx).await, None);
        assert!(!fx.sessions.delete(&fx.project_id, &newest.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_select_does_not_touch_project_timestamp() {
        let fx = fixture().await;
        let first = fx
            .sessions
            .create(&fx.project_id, NewSession::default())
            .await
            .unwrap();
        fx.sessions
            .create(&fx.project_id, NewSession::default())
            .await
            .unwrap();
        let before = fx.projects.require(&fx.project_id).await.unwrap();

        let selected = fx
            .sessions
            .select(&fx.project_id, &first.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(selected.id, first.id);

        let after = fx.projects.require(&fx.project_id).await.unwrap();
        assert_eq!(after.current_session_id, Some(first.id));
        assert_eq!(after.updated_at, before.updated_at);
    }
}
