//! Repository layer for database operations
//!
//! This module provides CRUD operations for all entities.
//! Services never touch the pool directly; everything goes through here.

use super::models::*;
use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ===== Users =====

    /// Create a new user account
    pub async fn create_user(&self, email: &str, password_hash: &str) -> Result<User> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created user: {}", id);
        Ok(user)
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: &str) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Look up a user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Replace a user's password hash
    pub async fn update_password_hash(&self, user_id: &str, password_hash: &str) -> Result<()> {
        let rows = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::UserNotFound(user_id.to_string()));
        }

        tracing::debug!("Updated password for user: {}", user_id);
        Ok(())
    }

    // ===== Sessions =====

    /// Open a new session for a user
    pub async fn create_session(&self, user_id: &str, ttl: Duration) -> Result<Session> {
        let token = Uuid::new_v4().to_string();
        let now = Utc::now();

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&token)
        .bind(user_id)
        .bind(now)
        .bind(now + ttl)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created session for user: {}", user_id);
        Ok(session)
    }

    /// Get a live (non-expired) session by token
    pub async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE token = ? AND expires_at > ?",
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Remove a session (sign out)
    pub async fn delete_session(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ===== Password resets =====

    /// Record a recovery token
    pub async fn create_password_reset(
        &self,
        user_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO password_resets (token, user_id, expires_at, used)
            VALUES (?, ?, ?, 0)
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get an unused, unexpired recovery token
    pub async fn get_valid_password_reset(&self, token: &str) -> Result<Option<PasswordReset>> {
        let reset = sqlx::query_as::<_, PasswordReset>(
            "SELECT * FROM password_resets WHERE token = ? AND used = 0 AND expires_at > ?",
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(reset)
    }

    /// Consume a recovery token
    pub async fn mark_password_reset_used(&self, token: &str) -> Result<()> {
        sqlx::query("UPDATE password_resets SET used = 1 WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ===== Profiles =====

    /// Create the profile row that accompanies a new user
    pub async fn create_profile(
        &self,
        user_id: &str,
        display_name: &str,
        todos_quota: i64,
        notes_quota: i64,
    ) -> Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles
                (user_id, display_name, todos_current_total_quota,
                 notes_current_total_quota, billing, updated_at)
            VALUES (?, ?, ?, ?, 0, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(display_name)
        .bind(todos_quota)
        .bind(notes_quota)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created profile for user: {}", user_id);
        Ok(profile)
    }

    /// Get a user's profile
    pub async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))
    }

    /// Write a recalculated quota total into the profile cache
    pub async fn update_quota_total(
        &self,
        user_id: &str,
        package_type: PackageType,
        total: i64,
    ) -> Result<()> {
        let column = match package_type {
            PackageType::Todos => "todos_current_total_quota",
            PackageType::Notes => "notes_current_total_quota",
        };

        let query = format!("UPDATE profiles SET {} = ?, updated_at = ? WHERE user_id = ?", column);

        let rows = sqlx::query(&query)
            .bind(total)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::UserNotFound(user_id.to_string()));
        }

        Ok(())
    }

    /// Update the cached billing flag
    pub async fn set_billing(&self, user_id: &str, billing: bool) -> Result<()> {
        sqlx::query("UPDATE profiles SET billing = ?, updated_at = ? WHERE user_id = ?")
            .bind(billing)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ===== Tasks =====

    /// Create a new task
    pub async fn create_task(&self, user_id: &str, req: CreateTaskRequest) -> Result<Task> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, user_id, name, description, deadline, tag, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 'todo', ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.deadline)
        .bind(&req.tag)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created task: {} for user: {}", id, user_id);
        Ok(task)
    }

    /// Get a task, scoped to its owner
    pub async fn get_task(&self, user_id: &str, id: &str) -> Result<Task> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::TaskNotFound(id.to_string()))
    }

    /// List a user's tasks, optionally restricted to a deadline window
    pub async fn list_tasks(
        &self,
        user_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Task>> {
        let mut query = "SELECT * FROM tasks WHERE user_id = ?".to_string();

        if from.is_some() {
            query.push_str(" AND deadline >= ?");
        }
        if to.is_some() {
            query.push_str(" AND deadline <= ?");
        }
        query.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query_as::<_, Task>(&query).bind(user_id);
        if let Some(from) = from {
            q = q.bind(from);
        }
        if let Some(to) = to {
            q = q.bind(to);
        }

        let tasks = q.fetch_all(&self.pool).await?;
        Ok(tasks)
    }

    /// Count all of a user's tasks (open and completed)
    pub async fn count_tasks(&self, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Mark a task completed; returns the updated row
    pub async fn complete_task(&self, user_id: &str, id: &str) -> Result<Task> {
        let now = Utc::now();

        let rows = sqlx::query(
            r#"
            UPDATE tasks SET status = 'completed', completed_at = ?
            WHERE id = ? AND user_id = ? AND status = 'todo'
            "#,
        )
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::TaskNotFound(id.to_string()));
        }

        tracing::debug!("Completed task: {}", id);
        self.get_task(user_id, id).await
    }

    /// Delete a task
    pub async fn delete_task(&self, user_id: &str, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::TaskNotFound(id.to_string()));
        }

        tracing::debug!("Deleted task: {}", id);
        Ok(())
    }

    /// Bulk-delete completed tasks older than the cutoff
    pub async fn delete_completed_tasks_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let rows = sqlx::query(
            "DELETE FROM tasks WHERE status = 'completed' AND completed_at < ?",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows)
    }

    // ===== Notes =====

    /// Create a new note
    pub async fn create_note(&self, user_id: &str, req: CreateNoteRequest) -> Result<Note> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (id, user_id, title, content, note_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(&req.note_date)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created note: {} for user: {}", id, user_id);
        Ok(note)
    }

    /// Get a note, scoped to its owner
    pub async fn get_note(&self, user_id: &str, id: &str) -> Result<Note> {
        sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NoteNotFound(id.to_string()))
    }

    /// List a user's notes, most recently updated first
    pub async fn list_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(
            "SELECT * FROM notes WHERE user_id = ? ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    /// Count a user's notes
    pub async fn count_notes(&self, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Update a note
    pub async fn update_note(
        &self,
        user_id: &str,
        id: &str,
        req: UpdateNoteRequest,
    ) -> Result<Note> {
        let now = Utc::now();

        // Build dynamic update query
        let mut query = "UPDATE notes SET updated_at = ?".to_string();
        let mut params: Vec<String> = vec![now.to_rfc3339()];

        if let Some(title) = &req.title {
            query.push_str(", title = ?");
            params.push(title.clone());
        }
        if let Some(content) = &req.content {
            query.push_str(", content = ?");
            params.push(content.clone());
        }
        if let Some(note_date) = &req.note_date {
            query.push_str(", note_date = ?");
            params.push(note_date.clone());
        }

        query.push_str(" WHERE id = ? AND user_id = ?");

        let mut q = sqlx::query(&query);
        for param in &params {
            q = q.bind(param);
        }
        q = q.bind(id).bind(user_id);

        let rows_affected = q.execute(&self.pool).await?.rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NoteNotFound(id.to_string()));
        }

        self.get_note(user_id, id).await
    }

    /// Delete a note
    pub async fn delete_note(&self, user_id: &str, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM notes WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NoteNotFound(id.to_string()));
        }

        tracing::debug!("Deleted note: {}", id);
        Ok(())
    }

    // ===== Quota packages =====

    /// Record a purchased quota package
    pub async fn create_package(
        &self,
        user_id: &str,
        package_type: PackageType,
        items_added: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<QuotaPackage> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let package = sqlx::query_as::<_, QuotaPackage>(
            r#"
            INSERT INTO quota_packages
                (id, user_id, package_type, items_added, purchased_at, expires_at, is_active)
            VALUES (?, ?, ?, ?, ?, ?, 1)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(package_type)
        .bind(items_added)
        .bind(now)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created {} package: {} for user: {}", package_type, id, user_id);
        Ok(package)
    }

    /// List all of a user's packages, newest first
    pub async fn list_packages(&self, user_id: &str) -> Result<Vec<QuotaPackage>> {
        let packages = sqlx::query_as::<_, QuotaPackage>(
            "SELECT * FROM quota_packages WHERE user_id = ? ORDER BY purchased_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(packages)
    }

    /// Sum items_added over a user's active, unexpired packages of a type
    pub async fn sum_active_items(
        &self,
        user_id: &str,
        package_type: PackageType,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let sum: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(items_added), 0) FROM quota_packages
            WHERE user_id = ? AND package_type = ? AND is_active = 1 AND expires_at > ?
            "#,
        )
        .bind(user_id)
        .bind(package_type)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }

    /// Count a user's active, unexpired packages of any type
    pub async fn count_active_packages(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM quota_packages
            WHERE user_id = ? AND is_active = 1 AND expires_at > ?
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Fetch still-active packages whose expiry has passed
    pub async fn expired_active_packages(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<QuotaPackage>> {
        let packages = sqlx::query_as::<_, QuotaPackage>(
            "SELECT * FROM quota_packages WHERE is_active = 1 AND expires_at <= ?",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(packages)
    }

    /// Bulk-deactivate packages by ID
    pub async fn deactivate_packages(&self, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let query = format!(
            "UPDATE quota_packages SET is_active = 0 WHERE id IN ({})",
            placeholders
        );

        let mut q = sqlx::query(&query);
        for id in ids {
            q = q.bind(id);
        }

        let rows = q.execute(&self.pool).await?.rows_affected();
        Ok(rows)
    }

    /// Deactivate all of a user's packages of a type (user-initiated reset)
    pub async fn deactivate_user_packages(
        &self,
        user_id: &str,
        package_type: PackageType,
    ) -> Result<u64> {
        let rows = sqlx::query(
            r#"
            UPDATE quota_packages SET is_active = 0
            WHERE user_id = ? AND package_type = ? AND is_active = 1
            "#,
        )
        .bind(user_id)
        .bind(package_type)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows)
    }

    // ===== Completion counters =====

    /// Append a completion-log row and bump the day's summary counter
    pub async fn record_task_completion(
        &self,
        user_id: &str,
        task_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        let id = Uuid::new_v4().to_string();
        let day = completed_at.date_naive().to_string();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO task_completion_log (id, user_id, task_id, completed_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(task_id)
        .bind(completed_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO daily_task_completion_summary (user_id, day, completed_count)
            VALUES (?, ?, 1)
            ON CONFLICT(user_id, day)
                DO UPDATE SET completed_count = completed_count + 1
            "#,
        )
        .bind(user_id)
        .bind(&day)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Daily completion counters over an inclusive day range
    pub async fn list_daily_summaries(
        &self,
        user_id: &str,
        from_day: &str,
        to_day: &str,
    ) -> Result<Vec<DailyTaskCompletionSummary>> {
        let summaries = sqlx::query_as::<_, DailyTaskCompletionSummary>(
            r#"
            SELECT * FROM daily_task_completion_summary
            WHERE user_id = ? AND day >= ? AND day <= ?
            ORDER BY day ASC
            "#,
        )
        .bind(user_id)
        .bind(from_day)
        .bind(to_day)
        .fetch_all(&self.pool)
        .await?;

        Ok(summaries)
    }

    // ===== Activity log =====

    /// Check for an identical activity entry newer than `since`
    pub async fn has_recent_activity(
        &self,
        user_id: &str,
        page: &str,
        action: &str,
        details: &str,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM activity_log
            WHERE user_id = ? AND page = ? AND action = ? AND details = ?
              AND created_at > ?
            "#,
        )
        .bind(user_id)
        .bind(page)
        .bind(action)
        .bind(details)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Insert an activity entry
    pub async fn insert_activity(
        &self,
        user_id: &str,
        page: &str,
        action: &str,
        details: &str,
    ) -> Result<ActivityLog> {
        let id = Uuid::new_v4().to_string();

        let entry = sqlx::query_as::<_, ActivityLog>(
            r#"
            INSERT INTO activity_log (id, user_id, page, action, details, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(page)
        .bind(action)
        .bind(details)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Most recent activity entries for a user
    pub async fn list_activity(&self, user_id: &str, limit: i64) -> Result<Vec<ActivityLog>> {
        let entries = sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT * FROM activity_log
            WHERE user_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Count stored activity entries matching a tuple (test support)
    #[allow(dead_code)]
    pub async fn count_activity(
        &self,
        user_id: &str,
        page: &str,
        action: &str,
        details: &str,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM activity_log
            WHERE user_id = ? AND page = ? AND action = ? AND details = ?
            "#,
        )
        .bind(user_id)
        .bind(page)
        .bind(action)
        .bind(details)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
