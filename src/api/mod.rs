//! HTTP API
//!
//! Router assembly for the JSON API, the sweep trigger endpoints and the
//! page route guard.

pub mod activity;
pub mod auth;
pub mod dashboard;
pub mod guard;
pub mod notes;
pub mod quota;
pub mod sweeps;
pub mod tasks;

use crate::app::AppState;
use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

async fn healthz() -> &'static str {
    "ok"
}

/// Build the full application router
pub fn router(state: AppState) -> Router {
    // Everything behind a session
    let protected = Router::new()
        .nest("/tasks", tasks::routes())
        .nest("/notes", notes::routes())
        .nest("/quota", quota::routes())
        .nest("/activity", activity::routes())
        .nest("/dashboard", dashboard::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_session,
        ));

    let api = Router::new()
        .route("/healthz", get(healthz))
        .nest("/auth", auth::routes())
        .merge(protected);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", api)
        .nest("/internal/sweeps", sweeps::routes())
        // Page navigation guard; runs on the fallback too, so guarded
        // paths redirect even though this server renders no pages itself
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::route_guard,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
