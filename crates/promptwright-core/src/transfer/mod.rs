//! Project export/import contract.
//!
//! An export is the complete, self-contained record graph of one project
//! with its original identifiers. An import re-keys such a graph into a
//! fresh identity space, so importing the same export twice yields two
//! independent projects.

use crate::artifact::Artifact;
use crate::artifact_session::ArtifactSession;
use crate::error::Result;
use crate::project::Project;
use crate::session::Session;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Version written to, and accepted in, export documents.
pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// Portable snapshot of a project's full record graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectExport {
    pub version: u32,
    /// Epoch milliseconds when the export was taken
    pub exported_at: i64,
    pub project: Project,
    pub sessions: Vec<Session>,
    pub artifacts: Vec<Artifact>,
    pub artifact_sessions: Vec<ArtifactSession>,
}

/// Outcome of an import: the new project and what was kept or discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub project: Project,
    pub sessions_imported: usize,
    pub artifacts_imported: usize,
    pub artifact_sessions_imported: usize,
    /// Entries dropped because they were malformed
    pub malformed_discarded: usize,
    /// Artifact sessions dropped because their artifact didn't resolve
    pub orphans_discarded: usize,
}

/// Export/import of whole project graphs.
#[async_trait]
pub trait ProjectTransfer: Send + Sync {
    /// Assembles the export document for a project.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the project does not exist.
    async fn export_project(&self, project_id: &str) -> Result<ProjectExport>;

    /// Imports an untrusted payload as a new project.
    ///
    /// The payload is structurally validated: a bad top-level shape rejects
    /// the whole import, while malformed nested entries are discarded.
    /// Nothing is written unless the whole graph commits.
    async fn import_project(&self, payload: serde_json::Value) -> Result<ImportReport>;
}
