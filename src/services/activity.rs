//! Activity logger
//!
//! Best-effort audit-trail writer. Re-renders and double submissions can
//! fire the same entry several times in quick succession, so an identical
//! entry within the trailing 60 seconds is treated as already logged.

use crate::config::ACTIVITY_DUPLICATE_WINDOW_SECS;
use crate::database::{ActivityLog, Repository};
use crate::error::Result;
use chrono::{Duration, Utc};

/// Service for the append-only activity log
#[derive(Clone)]
pub struct ActivityService {
    repo: Repository,
}

impl ActivityService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Record an activity entry, suppressing duplicates.
    ///
    /// Best-effort: failures are logged and absorbed so a broken audit
    /// trail never fails the operation that triggered it.
    pub async fn log(&self, user_id: &str, page: &str, action: &str, details: &str) {
        if let Err(e) = self.try_log(user_id, page, action, details).await {
            tracing::warn!("Failed to write activity log: {}", e);
        }
    }

    async fn try_log(&self, user_id: &str, page: &str, action: &str, details: &str) -> Result<()> {
        let since = Utc::now() - Duration::seconds(ACTIVITY_DUPLICATE_WINDOW_SECS);

        if self
            .repo
            .has_recent_activity(user_id, page, action, details, since)
            .await?
        {
            // Duplicate within the suppression window: treated as success
            tracing::debug!(
                "Suppressed duplicate activity entry for user {}: {}/{}",
                user_id,
                page,
                action
            );
            return Ok(());
        }

        self.repo.insert_activity(user_id, page, action, details).await?;
        Ok(())
    }

    /// Most recent entries for a user
    pub async fn recent(&self, user_id: &str, limit: i64) -> Result<Vec<ActivityLog>> {
        self.repo.list_activity(user_id, limit).await
    }
}
