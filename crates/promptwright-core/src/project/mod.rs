//! Project domain module.

mod model;
mod repository;

pub use model::{NewProject, Project, ProjectPatch};
pub use repository::ProjectRepository;
