//! Expired session removal.

use tracing::info;

use verdant_core::result::AppResult;
use verdant_database::repositories::SessionRepository;

/// Deletes sessions whose absolute expiry has passed.
///
/// Terminated rows are kept until their expiry so recent history stays
/// visible on the admin surface; only rows past `expires_at` are removed.
#[derive(Debug, Clone)]
pub struct SessionCleanup {
    sessions: SessionRepository,
}

impl SessionCleanup {
    /// Creates a new cleanup task over the session repository.
    pub fn new(sessions: SessionRepository) -> Self {
        Self { sessions }
    }

    /// Removes all sessions past their absolute expiry.
    ///
    /// Returns the number of rows deleted. The server runs this on an
    /// interval; the CLI exposes it as a maintenance command.
    pub async fn run_cleanup(&self) -> AppResult<u64> {
        let deleted = self.sessions.delete_expired().await?;
        if deleted > 0 {
            info!(deleted, "Removed expired sessions");
        }
        Ok(deleted)
    }
}
