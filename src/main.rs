// Daybook - personal productivity backend
// Entry point and server setup

mod api;
mod app;
mod config;
mod database;
mod error;
mod services;

use config::Config;
use services::SweepScheduler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daybook=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting daybook backend");

    let config = Config::from_env();
    let state = app::build_state(&config).await?;

    // In-process sweep scheduling; deployments driving the sweeps from an
    // external cron via /internal/sweeps can disable this
    let _scheduler = if config.scheduler_enabled {
        let scheduler = SweepScheduler::new(state.sweeps.clone()).await?;
        scheduler
            .start(&config.package_sweep_cron, &config.task_cleanup_cron)
            .await?;
        Some(scheduler)
    } else {
        tracing::info!("In-process sweep scheduler disabled");
        None
    };

    let router = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, router).await?;

    Ok(())
}
