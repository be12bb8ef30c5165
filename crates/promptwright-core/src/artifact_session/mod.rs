//! Artifact session domain module.

mod model;
mod repository;

pub use model::{ArtifactSession, ArtifactSessionPatch, NewArtifactSession};
pub use repository::ArtifactSessionRepository;
