//! Progress file maintenance.

#![allow(clippy::print_stdout)]

use super::{CliError, Session};

/// Delete the progress file after confirmation.
///
/// # Errors
///
/// Returns an error if the prompt fails or the file cannot be removed.
pub fn clear(session: &Session) -> Result<(), CliError> {
    let path = session.progress.path().display().to_string();
    if !session.progress.exists() {
        println!("No progress file at {path}");
        return Ok(());
    }

    if !session.confirm(&format!("Delete {path}? Already uploaded orders will be sent again"))? {
        println!("❌ Progress kept");
        return Ok(());
    }

    if session.progress.clear()? {
        tracing::info!(path = %path, "Progress cleared");
        println!("🗑️  Progress cleared - next upload starts fresh");
    }
    Ok(())
}
