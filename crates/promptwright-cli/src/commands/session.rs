use crate::app::App;
use anyhow::{Context, Result, anyhow, bail};
use clap::Subcommand;
use promptwright_core::project::ProjectRepository;
use promptwright_core::session::{
    HistoryItem, HistoryRole, NewSession, Session, SessionPatch, SessionRepository,
};

#[derive(Subcommand, Debug)]
pub enum SessionAction {
    /// Start a session and make it current
    Create {
        project_id: String,
        #[arg(long)]
        title: Option<String>,
    },
    /// List a project's sessions, newest first
    List { project_id: String },
    /// Make a session the project's current one
    Select {
        project_id: String,
        session_id: String,
    },
    /// Delete a session
    Delete {
        project_id: String,
        session_id: String,
    },
    /// Append a message to a session's history
    Append {
        project_id: String,
        session_id: String,
        /// user, assistant or system
        #[arg(long, default_value = "user")]
        role: String,
        content: String,
    },
}

pub async fn run(app: &App, action: SessionAction) -> Result<()> {
    match action {
        SessionAction::Create { project_id, title } => {
            let session = app
                .sessions
                .create(
                    &project_id,
                    NewSession {
                        title,
                        ..NewSession::default()
                    },
                )
                .await?;
            println!("{}", session.id);
        }
        SessionAction::List { project_id } => {
            let project = app.projects.require(&project_id).await?;
            let sessions: Vec<_> = app
                .sessions
                .list(&project_id)
                .await?
                .iter()
                .map(Session::summary)
                .collect();
            super::print_sessions(&sessions, project.current_session_id.as_deref());
        }
        SessionAction::Select {
            project_id,
            session_id,
        } => {
            if app.sessions.select(&project_id, &session_id).await?.is_none() {
                bail!("Session '{}' not found in project '{}'", session_id, project_id);
            }
        }
        SessionAction::Delete {
            project_id,
            session_id,
        } => {
            if !app.sessions.delete(&project_id, &session_id).await? {
                bail!("Session '{}' not found in project '{}'", session_id, project_id);
            }
        }
        SessionAction::Append {
            project_id,
            session_id,
            role,
            content,
        } => {
            let role = HistoryRole::parse(&role).ok_or_else(|| anyhow!("Unknown role '{}'", role))?;
            let session = app
                .sessions
                .get(&project_id, &session_id)
                .await?
                .with_context(|| format!("Session '{}' not found", session_id))?;

            let mut history = session.history;
            history.push(HistoryItem::new(role, content));
            let updated = app
                .sessions
                .update(&project_id, &session_id, SessionPatch::history(history))
                .await?
                .with_context(|| format!("Session '{}' disappeared", session_id))?;
            println!("{}", updated.last_message.unwrap_or_default());
        }
    }
    Ok(())
}
