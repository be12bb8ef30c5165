//! Subcommand implementations.

pub mod artifact;
pub mod context;
pub mod project;
pub mod session;
pub mod transfer;

use promptwright_core::summary::SessionSummary;
use promptwright_core::time::format_millis;

/// One line per session, marking the current one.
pub(crate) fn print_sessions(sessions: &[SessionSummary], current: Option<&str>) {
    if sessions.is_empty() {
        println!("  (no sessions)");
        return;
    }
    for session in sessions {
        let marker = if Some(session.id.as_str()) == current { "*" } else { " " };
        println!(
            "{} {}  {}  {}  {}",
            marker,
            session.id,
            format_millis(session.created_at),
            session.title.as_deref().unwrap_or("(untitled)"),
            session.last_message.as_deref().unwrap_or("")
        );
    }
}
