//! Sweep trigger endpoints
//!
//! HTTP surface for an external cron. No request body or query parameters
//! are consumed; OPTIONS preflight is answered by the CORS layer. Success
//! (including "nothing to do") returns 200 with counts; an aborted sweep
//! surfaces as a 500 with the error message.

use crate::app::AppState;
use crate::error::Result;
use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expired-packages", post(expire_packages))
        .route("/completed-tasks", post(cleanup_completed_tasks))
}

async fn expire_packages(State(state): State<AppState>) -> Result<Json<Value>> {
    let outcome = state.sweeps.expire_packages().await?;

    let message = if outcome.expired == 0 {
        "No expired packages"
    } else {
        "Expired packages deactivated"
    };

    Ok(Json(json!({
        "message": message,
        "expired": outcome.expired,
        "recalculated": outcome.recalculated,
    })))
}

async fn cleanup_completed_tasks(State(state): State<AppState>) -> Result<Json<Value>> {
    let deleted = state.sweeps.cleanup_completed_tasks().await?;

    let message = if deleted == 0 {
        "No stale completed tasks"
    } else {
        "Stale completed tasks deleted"
    };

    Ok(Json(json!({
        "message": message,
        "deleted": deleted,
    })))
}
