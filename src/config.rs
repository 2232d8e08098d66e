//! Application configuration
//!
//! Runtime settings loaded from the environment plus the fixed business
//! constants and validation boundaries used throughout the application.

use std::path::PathBuf;
use std::time::Duration;

use crate::database::PackageType;

// ===== Free-tier quota bases =====

/// Tasks a user may hold with no purchased packages
pub const FREE_TIER_TASKS_QUOTA: i64 = 5;
/// Notes a user may hold with no purchased packages
pub const FREE_TIER_NOTES_QUOTA: i64 = 3;

/// Free-tier base for a package type
pub fn base_quota(package_type: PackageType) -> i64 {
    match package_type {
        PackageType::Todos => FREE_TIER_TASKS_QUOTA,
        PackageType::Notes => FREE_TIER_NOTES_QUOTA,
    }
}

// ===== Sweep windows =====

/// Completed tasks older than this are deleted by the cleanup sweep
pub const COMPLETED_TASK_RETENTION_HOURS: i64 = 24;

// ===== Activity log =====

/// Identical activity entries within this window are suppressed
pub const ACTIVITY_DUPLICATE_WINDOW_SECS: i64 = 60;

// ===== Validation boundaries =====

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum length for task/note titles
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum items a single quota package may add
pub const MAX_PACKAGE_ITEMS: i64 = 1_000;

/// Maximum validity a purchased package may carry, in days
pub const MAX_PACKAGE_DURATION_DAYS: i64 = 365;

/// How long a password recovery token stays valid
pub const RECOVERY_TOKEN_TTL_MINS: i64 = 30;

// ===== Runtime configuration =====

/// Settings read from the environment at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Path to the SQLite database file
    pub db_path: PathBuf,
    /// Session lifetime
    pub session_ttl: Duration,
    /// Whether the in-process sweep scheduler runs
    pub scheduler_enabled: bool,
    /// Cron expression for the package expiry sweep
    pub package_sweep_cron: String,
    /// Cron expression for the completed-task cleanup sweep
    pub task_cleanup_cron: String,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("DAYBOOK_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

        let db_path = std::env::var("DAYBOOK_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("daybook.db"));

        let session_ttl_hours: u64 = std::env::var("DAYBOOK_SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24 * 7);

        let scheduler_enabled = std::env::var("DAYBOOK_SCHEDULER_ENABLED")
            .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        // Hourly package sweep, task cleanup daily at 03:00
        let package_sweep_cron = std::env::var("DAYBOOK_PACKAGE_SWEEP_CRON")
            .unwrap_or_else(|_| "0 0 * * * *".to_string());
        let task_cleanup_cron = std::env::var("DAYBOOK_TASK_CLEANUP_CRON")
            .unwrap_or_else(|_| "0 0 3 * * *".to_string());

        Self {
            bind_addr,
            db_path,
            session_ttl: Duration::from_secs(session_ttl_hours * 3600),
            scheduler_enabled,
            package_sweep_cron,
            task_cleanup_cron,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_quota_constants() {
        assert_eq!(base_quota(PackageType::Todos), 5);
        assert_eq!(base_quota(PackageType::Notes), 3);
    }
}
