//! Application state and initialization
//!
//! All services are initialized here and made available to the API layer
//! through AppState.

use crate::config::Config;
use crate::database::{self, Repository};
use crate::error::Result;
use crate::services::{
    ActivityService, AuthService, NotesService, QuotaService, SweepService, TasksService,
};

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub tasks: TasksService,
    pub notes: NotesService,
    pub quota: QuotaService,
    pub activity: ActivityService,
    pub sweeps: SweepService,
}

/// Initialize the database and construct all services
pub async fn build_state(config: &Config) -> Result<AppState> {
    tracing::info!("Initializing application");

    let pool = database::create_pool(&config.db_path).await?;
    let repo = Repository::new(pool);

    let session_ttl = chrono::Duration::from_std(config.session_ttl)
        .unwrap_or_else(|_| chrono::Duration::days(7));

    let quota = QuotaService::new(repo.clone());

    let state = AppState {
        auth: AuthService::new(repo.clone(), session_ttl),
        tasks: TasksService::new(repo.clone()),
        notes: NotesService::new(repo.clone()),
        quota: quota.clone(),
        activity: ActivityService::new(repo.clone()),
        sweeps: SweepService::new(repo, quota),
    };

    tracing::info!("Application initialized successfully");
    Ok(state)
}
