//! Sweep scheduler
//!
//! Drives the two maintenance sweeps on cron schedules using
//! tokio-cron-scheduler. The HTTP sweep endpoints stay available for
//! deployments that prefer an external cron trigger.

use crate::error::{AppError, Result};
use crate::services::SweepService;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Scheduler service for the maintenance sweeps
pub struct SweepScheduler {
    scheduler: Arc<RwLock<JobScheduler>>,
    sweep_service: Arc<SweepService>,
}

impl SweepScheduler {
    /// Create a new scheduler around the sweep service
    pub async fn new(sweep_service: SweepService) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            sweep_service: Arc::new(sweep_service),
        })
    }

    /// Register both sweep jobs and start the scheduler
    pub async fn start(&self, package_sweep_cron: &str, task_cleanup_cron: &str) -> Result<()> {
        self.add_package_sweep_job(package_sweep_cron).await?;
        self.add_task_cleanup_job(task_cleanup_cron).await?;

        let scheduler = self.scheduler.read().await;
        scheduler
            .start()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!(
            "Sweep scheduler started (packages: {}, tasks: {})",
            package_sweep_cron,
            task_cleanup_cron
        );
        Ok(())
    }

    async fn add_package_sweep_job(&self, cron_expr: &str) -> Result<()> {
        let sweep_service = Arc::clone(&self.sweep_service);

        let job = Job::new_async(cron_expr, move |_uuid, _l| {
            let sweep_service = Arc::clone(&sweep_service);
            Box::pin(async move {
                tracing::info!("Running scheduled package expiry sweep");

                match sweep_service.expire_packages().await {
                    Ok(outcome) => {
                        tracing::info!(
                            "Package sweep finished: {} expired, {} recalculated",
                            outcome.expired,
                            outcome.recalculated
                        );
                    }
                    Err(e) => {
                        tracing::error!("Package sweep failed: {}", e);
                    }
                }
            })
        })
        .map_err(|e| AppError::Scheduler(format!("Failed to create package sweep job: {}", e)))?;

        let scheduler = self.scheduler.write().await;
        scheduler
            .add(job)
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to schedule package sweep: {}", e)))?;

        Ok(())
    }

    async fn add_task_cleanup_job(&self, cron_expr: &str) -> Result<()> {
        let sweep_service = Arc::clone(&self.sweep_service);

        let job = Job::new_async(cron_expr, move |_uuid, _l| {
            let sweep_service = Arc::clone(&sweep_service);
            Box::pin(async move {
                tracing::info!("Running scheduled completed-task cleanup");

                match sweep_service.cleanup_completed_tasks().await {
                    Ok(deleted) => {
                        tracing::info!("Task cleanup finished: {} deleted", deleted);
                    }
                    Err(e) => {
                        tracing::error!("Task cleanup failed: {}", e);
                    }
                }
            })
        })
        .map_err(|e| AppError::Scheduler(format!("Failed to create task cleanup job: {}", e)))?;

        let scheduler = self.scheduler.write().await;
        scheduler
            .add(job)
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to schedule task cleanup: {}", e)))?;

        Ok(())
    }

    /// Shutdown scheduler gracefully
    pub async fn shutdown(&self) -> Result<()> {
        let mut scheduler = self.scheduler.write().await;
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to shutdown scheduler: {}", e)))?;
        tracing::info!("Sweep scheduler shutdown");
        Ok(())
    }
}
