pub mod config;
pub mod db_artifact_repository;
pub mod db_artifact_session_repository;
pub mod db_project_repository;
pub mod db_session_repository;
pub mod paths;
mod repository_support;
pub mod sanitize;
pub mod storage;
pub mod transfer;

pub use crate::config::AppConfig;
pub use crate::db_artifact_repository::DbArtifactRepository;
pub use crate::db_artifact_session_repository::DbArtifactSessionRepository;
pub use crate::db_project_repository::DbProjectRepository;
pub use crate::db_session_repository::DbSessionRepository;
pub use crate::paths::PromptwrightPaths;
pub use crate::storage::{Database, DatabaseOptions};
pub use crate::transfer::DbProjectTransfer;
