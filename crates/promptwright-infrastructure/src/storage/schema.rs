//! Object store layout.
//!
//! Four object stores, one per entity type, each keyed by `id`. Child
//! stores carry secondary indexes on their owning foreign keys so cascades
//! and list queries never scan a whole store.

use std::fmt;

/// Field every record is keyed by.
pub const KEY_PATH: &str = "id";

/// Current version of the store layout.
pub const SCHEMA_VERSION: u32 = 1;

/// Name of an object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StoreName {
    Projects,
    Sessions,
    Artifacts,
    ArtifactSessions,
}

impl StoreName {
    pub const ALL: [StoreName; 4] = [
        StoreName::Projects,
        StoreName::Sessions,
        StoreName::Artifacts,
        StoreName::ArtifactSessions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreName::Projects => "projects",
            StoreName::Sessions => "sessions",
            StoreName::Artifacts => "artifacts",
            StoreName::ArtifactSessions => "artifact_sessions",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|store| store.as_str() == name)
    }

    /// Secondary indexes declared on this store.
    ///
    /// Each index is named after the record field it covers.
    pub fn indexes(self) -> &'static [&'static str] {
        match self {
            StoreName::Projects => &[],
            StoreName::Sessions => &["project_id"],
            StoreName::Artifacts => &["project_id"],
            StoreName::ArtifactSessions => &["artifact_id", "project_id"],
        }
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
