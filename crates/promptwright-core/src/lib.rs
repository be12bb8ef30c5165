//! Domain layer of the Promptwright store.
//!
//! Models, repository contracts and the shared error type. Nothing in this
//! crate performs I/O; storage lives in `promptwright-infrastructure`.

pub mod artifact;
pub mod artifact_session;
pub mod error;
pub mod id;
pub mod project;
pub mod session;
pub mod summary;
pub mod time;
pub mod transfer;

// Re-export common error type
pub use error::{Result, StoreError};
