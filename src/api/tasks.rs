//! Task endpoints

use crate::api::guard::CurrentUser;
use crate::app::AppState;
use crate::database::{CreateTaskRequest, Task};
use crate::error::Result;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/{id}/complete", post(complete_task))
        .route("/{id}", delete(delete_task))
}

#[derive(Deserialize)]
struct TaskListQuery {
    /// Lower deadline bound (calendar view)
    from: Option<DateTime<Utc>>,
    /// Upper deadline bound (calendar view)
    to: Option<DateTime<Utc>>,
}

async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<Vec<Task>>> {
    let tasks = state.tasks.list_tasks(&user.id, query.from, query.to).await?;
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<Json<Task>> {
    let name = req.name.clone();
    let task = state.tasks.create_task(&user.id, req).await?;

    state.activity.log(&user.id, "tasks", "create", &name).await;

    Ok(Json(task))
}

async fn complete_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Task>> {
    let task = state.tasks.complete_task(&user.id, &id).await?;

    state.activity.log(&user.id, "tasks", "complete", &task.name).await;

    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.tasks.delete_task(&user.id, &id).await?;

    state.activity.log(&user.id, "tasks", "delete", &id).await;

    Ok(Json(json!({ "message": "Task deleted" })))
}
