//! Store wiring for one CLI invocation.

use promptwright_application::{ArtifactContextService, ProjectContextService};
use promptwright_infrastructure::{
    Database, DatabaseOptions, DbArtifactRepository, DbArtifactSessionRepository,
    DbProjectRepository, DbProjectTransfer, DbSessionRepository,
};
use std::sync::Arc;

/// Every repository and service, sharing one open [`Database`].
pub struct App {
    db: Database,
    pub projects: Arc<DbProjectRepository>,
    pub sessions: Arc<DbSessionRepository>,
    pub artifacts: Arc<DbArtifactRepository>,
    pub artifact_sessions: Arc<DbArtifactSessionRepository>,
    pub transfer: DbProjectTransfer,
    pub project_contexts: ProjectContextService,
    pub artifact_contexts: ArtifactContextService,
}

impl App {
    pub async fn open(options: DatabaseOptions) -> promptwright_core::Result<Self> {
        let db = Database::open(options).await?;

        let projects = Arc::new(DbProjectRepository::new(db.clone()));
        let sessions = Arc::new(DbSessionRepository::new(db.clone()));
        let artifacts = Arc::new(DbArtifactRepository::new(db.clone()));
        let artifact_sessions = Arc::new(DbArtifactSessionRepository::new(db.clone()));

        Ok(Self {
            project_contexts: ProjectContextService::new(projects.clone(), sessions.clone()),
            artifact_contexts: ArtifactContextService::new(
                artifacts.clone(),
                artifact_sessions.clone(),
            ),
            transfer: DbProjectTransfer::new(db.clone()),
            projects,
            sessions,
            artifacts,
            artifact_sessions,
            db,
        })
    }

    pub async fn close(self) {
        self.db.close().await;
    }
}
