//! Referential checks shared by the repositories.
//!
//! The engine has no foreign keys, so ownership checks and current-pointer
//! repair live here, in one place, and every repository write goes through
//! them inside its own transaction.

use crate::sanitize::{
    sanitize_artifact, sanitize_artifact_session, sanitize_project, sanitize_session,
};
use crate::storage::{StoreName, Transaction};
use promptwright_core::artifact::Artifact;
use promptwright_core::artifact_session::ArtifactSession;
use promptwright_core::error::Result;
use promptwright_core::project::Project;
use promptwright_core::session::Session;
use serde_json::Value;

pub(crate) const PROJECT_INDEX: &str = "project_id";
pub(crate) const ARTIFACT_INDEX: &str = "artifact_id";

/// A record that sits under a current pointer.
pub(crate) trait ChildRecord {
    fn id(&self) -> &str;
    fn created_at(&self) -> i64;
}

impl ChildRecord for Session {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }
}

impl ChildRecord for ArtifactSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }
}

/// Sanitizes raw records, dropping (and logging) the ones that don't pass.
pub(crate) fn decode_records<T>(
    store: StoreName,
    values: Vec<Value>,
    sanitize: fn(&Value) -> Option<T>,
) -> Vec<T> {
    let total = values.len();
    let records: Vec<T> = values.iter().filter_map(sanitize).collect();
    if records.len() < total {
        tracing::warn!(
            store = %store,
            dropped = total - records.len(),
            "Dropped records that failed validation"
        );
    }
    records
}

/// Sorts children newest first, breaking timestamp ties by id.
pub(crate) fn sort_newest_first<T: ChildRecord>(records: &mut [T]) {
    records.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(a.id()))
    });
}

fn decode_one<T>(store: StoreName, value: Option<Value>, sanitize: fn(&Value) -> Option<T>) -> Option<T> {
    let value = value?;
    let record = sanitize(&value);
    if record.is_none() {
        tracing::warn!(store = %store, "Ignoring record that failed validation");
    }
    record
}

pub(crate) fn read_project(tx: &Transaction<'_>, project_id: &str) -> Result<Option<Project>> {
    let value = tx.get(StoreName::Projects, project_id)?;
    Ok(decode_one(StoreName::Projects, value, sanitize_project))
}

/// Reads a session only if it belongs to `project_id`.
pub(crate) fn read_owned_session(
    tx: &Transaction<'_>,
    project_id: &str,
    session_id: &str,
) -> Result<Option<Session>> {
    let value = tx.get(StoreName::Sessions, session_id)?;
    Ok(decode_one(StoreName::Sessions, value, sanitize_session)
        .filter(|session| session.project_id == project_id))
}

/// Reads an artifact only if it belongs to `project_id`.
pub(crate) fn read_owned_artifact(
    tx: &Transaction<'_>,
    project_id: &str,
    artifact_id: &str,
) -> Result<Option<Artifact>> {
    read_artifact(tx, artifact_id)
        .map(|artifact| artifact.filter(|artifact| artifact.project_id == project_id))
}

pub(crate) fn read_artifact(tx: &Transaction<'_>, artifact_id: &str) -> Result<Option<Artifact>> {
    let value = tx.get(StoreName::Artifacts, artifact_id)?;
    Ok(decode_one(StoreName::Artifacts, value, sanitize_artifact))
}

/// Reads an artifact session only if it belongs to `artifact_id`.
pub(crate) fn read_owned_artifact_session(
    tx: &Transaction<'_>,
    artifact_id: &str,
    session_id: &str,
) -> Result<Option<ArtifactSession>> {
    let value = tx.get(StoreName::ArtifactSessions, session_id)?;
    Ok(
        decode_one(StoreName::ArtifactSessions, value, sanitize_artifact_session)
            .filter(|session| session.artifact_id == artifact_id),
    )
}

pub(crate) fn sessions_of_project(tx: &Transaction<'_>, project_id: &str) -> Result<Vec<Session>> {
    let values = tx.get_all_by_index(StoreName::Sessions, PROJECT_INDEX, project_id)?;
    let mut sessions = decode_records(StoreName::Sessions, values, sanitize_session);
    sort_newest_first(&mut sessions);
    Ok(sessions)
}

pub(crate) fn sessions_of_artifact(
    tx: &Transaction<'_>,
    artifact_id: &str,
) -> Result<Vec<ArtifactSession>> {
    let values = tx.get_all_by_index(StoreName::ArtifactSessions, ARTIFACT_INDEX, artifact_id)?;
    let mut sessions =
        decode_records(StoreName::ArtifactSessions, values, sanitize_artifact_session);
    sort_newest_first(&mut sessions);
    Ok(sessions)
}

/// The id a parent's pointer should hold after its current child is gone:
/// the most recently created remaining child, or none.
pub(crate) fn repair_target<T: ChildRecord>(remaining_newest_first: &[T]) -> Option<String> {
    remaining_newest_first.first().map(|child| child.id().to_string())
}

/// Deletes every record of `store` whose `index` equals `value`.
///
/// Returns how many records were removed.
pub(crate) fn delete_by_index(
    tx: &mut Transaction<'_>,
    store: StoreName,
    index: &str,
    value: &str,
) -> Result<usize> {
    let keys = tx.get_all_keys_by_index(store, index, value)?;
    for key in &keys {
        tx.delete(store, key)?;
    }
    Ok(keys.len())
}
