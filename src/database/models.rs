//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization to API clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Category a quota package applies to.
///
/// Closed set: unknown values are rejected at parse time rather than
/// silently falling back to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PackageType {
    Todos,
    Notes,
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageType::Todos => write!(f, "todos"),
            PackageType::Notes => write!(f, "notes"),
        }
    }
}

impl FromStr for PackageType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "todos" => Ok(PackageType::Todos),
            "notes" => Ok(PackageType::Notes),
            other => Err(format!("Unknown package type: {}", other)),
        }
    }
}

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TaskStatus {
    Todo,
    Completed,
}

/// A registered user account
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// An authenticated session
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Single-use password recovery token
#[derive(Debug, Clone, FromRow)]
pub struct PasswordReset {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

/// Per-user profile with denormalized quota counters.
///
/// The quota columns are a read-optimization cache; the quota_packages
/// table is the source of truth.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
    pub todos_current_total_quota: i64,
    pub notes_current_total_quota: i64,
    /// True while the user holds at least one active purchased package
    pub billing: bool,
    pub updated_at: DateTime<Utc>,
}

/// A user's task
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub tag: Option<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A user's note
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    /// Calendar date the note is filed under (YYYY-MM-DD)
    pub note_date: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchased quota allotment, additive to the free-tier base
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuotaPackage {
    pub id: String,
    pub user_id: String,
    pub package_type: PackageType,
    pub items_added: i64,
    pub purchased_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Append-only record of a task completion
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TaskCompletionLog {
    pub id: String,
    pub user_id: String,
    pub task_id: String,
    pub completed_at: DateTime<Utc>,
}

/// Per-day completion counter for dashboard display
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DailyTaskCompletionSummary {
    pub user_id: String,
    /// Day key, YYYY-MM-DD
    pub day: String,
    pub completed_count: i64,
}

/// Audit-trail entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActivityLog {
    pub id: String,
    pub user_id: String,
    pub page: String,
    pub action: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

// ===== Request types =====

/// Create task request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskRequest {
    pub name: String,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub tag: Option<String>,
}

/// Create note request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    pub note_date: String,
}

/// Update note request
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub note_date: Option<String>,
}

/// Purchase quota package request
#[derive(Debug, Clone, Deserialize)]
pub struct PurchasePackageRequest {
    pub package_type: PackageType,
    pub items_added: i64,
    pub duration_days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_type_round_trip() {
        assert_eq!("todos".parse::<PackageType>().unwrap(), PackageType::Todos);
        assert_eq!("notes".parse::<PackageType>().unwrap(), PackageType::Notes);
        assert_eq!(PackageType::Todos.to_string(), "todos");
    }

    #[test]
    fn test_package_type_rejects_unknown() {
        assert!("tasks".parse::<PackageType>().is_err());
        assert!("".parse::<PackageType>().is_err());
        assert!(serde_json::from_str::<PackageType>("\"storage\"").is_err());
    }
}
