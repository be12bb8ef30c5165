//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: Wizard session model and its create/update payloads
//! - `message`: Conversation history types (`HistoryRole`, `HistoryItem`)
//! - `state`: Conversation-state snapshot (`SessionState`)
//! - `repository`: Repository trait for session persistence

mod message;
mod model;
mod repository;
mod state;

// Re-export public API
pub use message::{HistoryItem, HistoryRole};
pub use model::{NewSession, Session, SessionPatch};
pub use repository::SessionRepository;
pub use state::{Deliberation, PendingQuestion, SessionState};
