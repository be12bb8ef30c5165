//! Artifact domain module.

mod model;
mod repository;

pub use model::{Artifact, ArtifactPatch, ArtifactVariable, NewArtifact, VariableKind};
pub use repository::ArtifactRepository;
