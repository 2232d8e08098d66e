//! Note endpoints

use crate::api::guard::CurrentUser;
use crate::app::AppState;
use crate::database::{CreateNoteRequest, Note, UpdateNoteRequest};
use crate::error::Result;
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notes).post(create_note))
        .route("/{id}", axum::routing::put(update_note).delete(delete_note))
}

async fn list_notes(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Note>>> {
    let notes = state.notes.list_notes(&user.id).await?;
    Ok(Json(notes))
}

async fn create_note(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<Json<Note>> {
    let title = req.title.clone();
    let note = state.notes.create_note(&user.id, req).await?;

    state.activity.log(&user.id, "notes", "create", &title).await;

    Ok(Json(note))
}

async fn update_note(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<Json<Note>> {
    let note = state.notes.update_note(&user.id, &id, req).await?;

    state.activity.log(&user.id, "notes", "edit", &note.title).await;

    Ok(Json(note))
}

async fn delete_note(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.notes.delete_note(&user.id, &id).await?;

    state.activity.log(&user.id, "notes", "delete", &id).await;

    Ok(Json(json!({ "message": "Note deleted" })))
}
