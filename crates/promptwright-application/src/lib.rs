//! Application layer for Promptwright.
//!
//! Use cases that coordinate the repositories to assemble what a view
//! needs in a single call.

pub mod artifact_context;
pub mod project_context;

pub use artifact_context::{ArtifactContext, ArtifactContextService};
pub use project_context::{ProjectContext, ProjectContextService};
