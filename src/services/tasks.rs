//! Tasks service
//!
//! High-level business logic for tasks: quota gating on creation,
//! completion bookkeeping and the dashboard counters.

use crate::config::MAX_TITLE_LENGTH;
use crate::database::{
    CreateTaskRequest, DailyTaskCompletionSummary, Repository, Task, TaskStatus,
};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};

/// Service for managing tasks
#[derive(Clone)]
pub struct TasksService {
    repo: Repository,
}

impl TasksService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a new task, gated by the cached tasks quota.
    ///
    /// The gate reads the denormalized profile counter, not the package
    /// table; a stale counter can briefly admit or reject a task until the
    /// next recalculation.
    pub async fn create_task(&self, user_id: &str, req: CreateTaskRequest) -> Result<Task> {
        if req.name.trim().is_empty() {
            return Err(AppError::Validation("Task name cannot be empty".to_string()));
        }
        if req.name.len() > MAX_TITLE_LENGTH {
            return Err(AppError::Validation(format!(
                "Task name exceeds {} characters",
                MAX_TITLE_LENGTH
            )));
        }

        let profile = self.repo.get_profile(user_id).await?;
        let current = self.repo.count_tasks(user_id).await?;

        if current >= profile.todos_current_total_quota {
            return Err(AppError::QuotaExhausted(format!(
                "tasks ({} of {})",
                current, profile.todos_current_total_quota
            )));
        }

        let task = self.repo.create_task(user_id, req).await?;

        tracing::info!("Task created for user {}: {}", user_id, task.id);
        Ok(task)
    }

    /// Get a single task
    pub async fn get_task(&self, user_id: &str, id: &str) -> Result<Task> {
        self.repo.get_task(user_id, id).await
    }

    /// List tasks, optionally restricted to a deadline window (calendar view)
    pub async fn list_tasks(
        &self,
        user_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Task>> {
        self.repo.list_tasks(user_id, from, to).await
    }

    /// Complete a task and record the completion counters.
    ///
    /// The counters are display-only and never reconciled back against the
    /// tasks table; a failure there is logged, not surfaced.
    pub async fn complete_task(&self, user_id: &str, id: &str) -> Result<Task> {
        let task = self.repo.complete_task(user_id, id).await?;

        if let Some(completed_at) = task.completed_at {
            if let Err(e) = self
                .repo
                .record_task_completion(user_id, &task.id, completed_at)
                .await
            {
                tracing::warn!("Failed to record completion counters for {}: {}", task.id, e);
            }
        }

        tracing::info!("Task completed for user {}: {}", user_id, id);
        Ok(task)
    }

    /// Delete a task
    pub async fn delete_task(&self, user_id: &str, id: &str) -> Result<()> {
        self.repo.delete_task(user_id, id).await?;

        tracing::info!("Task deleted for user {}: {}", user_id, id);
        Ok(())
    }

    /// Daily completion counters over an inclusive day range
    pub async fn daily_summaries(
        &self,
        user_id: &str,
        from_day: &str,
        to_day: &str,
    ) -> Result<Vec<DailyTaskCompletionSummary>> {
        self.repo.list_daily_summaries(user_id, from_day, to_day).await
    }

    /// Count of open (not yet completed) tasks
    pub async fn open_task_count(&self, user_id: &str) -> Result<usize> {
        let tasks = self.repo.list_tasks(user_id, None, None).await?;
        Ok(tasks.iter().filter(|t| t.status == TaskStatus::Todo).count())
    }
}
