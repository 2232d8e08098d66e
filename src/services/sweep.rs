//! Sweep service
//!
//! Batch maintenance jobs: deactivating expired quota packages and deleting
//! stale completed tasks. Invoked by the in-process scheduler and by the
//! HTTP endpoints an external cron can trigger.

use crate::config::COMPLETED_TASK_RETENTION_HOURS;
use crate::database::{PackageType, Repository};
use crate::error::Result;
use crate::services::QuotaService;
use chrono::{Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Outcome of a package expiry sweep
#[derive(Debug, Serialize)]
pub struct PackageSweepOutcome {
    /// Packages deactivated this run
    pub expired: u64,
    /// Distinct (user, category) pairs whose quota was recalculated
    pub recalculated: usize,
}

/// Service running the scheduled maintenance sweeps
#[derive(Clone)]
pub struct SweepService {
    repo: Repository,
    quota: QuotaService,
}

impl SweepService {
    pub fn new(repo: Repository, quota: QuotaService) -> Self {
        Self { repo, quota }
    }

    /// Deactivate packages whose expiry has passed and refresh the quota
    /// cache of every affected user/category pair.
    ///
    /// A fetch or deactivate failure aborts the whole sweep. Recalculation
    /// is per-pair and absorbs its own failures, so one broken profile does
    /// not stop the remaining pairs.
    pub async fn expire_packages(&self) -> Result<PackageSweepOutcome> {
        let now = Utc::now();

        let expired = self.repo.expired_active_packages(now).await?;
        if expired.is_empty() {
            tracing::info!("Package sweep: nothing to do");
            return Ok(PackageSweepOutcome {
                expired: 0,
                recalculated: 0,
            });
        }

        let ids: Vec<String> = expired.iter().map(|p| p.id.clone()).collect();
        let deactivated = self.repo.deactivate_packages(&ids).await?;

        // One recalculation per distinct (user, category) pair
        let pairs: HashSet<(String, PackageType)> = expired
            .iter()
            .map(|p| (p.user_id.clone(), p.package_type))
            .collect();

        for (user_id, package_type) in &pairs {
            self.quota.recalculate(user_id, *package_type).await;
        }

        tracing::info!(
            "Package sweep: deactivated {} package(s), recalculated {} user/category pair(s)",
            deactivated,
            pairs.len()
        );

        Ok(PackageSweepOutcome {
            expired: deactivated,
            recalculated: pairs.len(),
        })
    }

    /// Delete completed tasks older than the retention window.
    ///
    /// Single declarative bulk delete; the store is trusted to handle the
    /// row count without batching.
    pub async fn cleanup_completed_tasks(&self) -> Result<u64> {
        let cutoff = Utc::now() - Duration::hours(COMPLETED_TASK_RETENTION_HOURS);

        let deleted = self.repo.delete_completed_tasks_before(cutoff).await?;

        if deleted == 0 {
            tracing::info!("Task cleanup: nothing to do");
        } else {
            tracing::info!("Task cleanup: deleted {} completed task(s)", deleted);
        }

        Ok(deleted)
    }
}
