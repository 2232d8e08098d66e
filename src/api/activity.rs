//! Activity log endpoints

use crate::api::guard::CurrentUser;
use crate::app::AppState;
use crate::database::ActivityLog;
use crate::error::Result;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(recent).post(log_entry))
}

#[derive(Deserialize)]
struct RecentQuery {
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct LogRequest {
    page: String,
    action: String,
    #[serde(default)]
    details: String,
}

async fn recent(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<ActivityLog>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let entries = state.activity.recent(&user.id, limit).await?;
    Ok(Json(entries))
}

async fn log_entry(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<LogRequest>,
) -> Json<Value> {
    // Best effort; duplicates inside the suppression window count as logged
    state
        .activity
        .log(&user.id, &req.page, &req.action, &req.details)
        .await;

    Json(json!({ "message": "Logged" }))
}
