//! Notes service
//!
//! High-level business logic for notes operations, gated by the
//! notes quota.

use crate::config::MAX_TITLE_LENGTH;
use crate::database::{CreateNoteRequest, Note, Repository, UpdateNoteRequest};
use crate::error::{AppError, Result};
use chrono::NaiveDate;

/// Service for managing notes
#[derive(Clone)]
pub struct NotesService {
    repo: Repository,
}

impl NotesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a new note, gated by the cached notes quota
    pub async fn create_note(&self, user_id: &str, req: CreateNoteRequest) -> Result<Note> {
        if req.title.trim().is_empty() {
            return Err(AppError::Validation("Note title cannot be empty".to_string()));
        }
        if req.title.len() > MAX_TITLE_LENGTH {
            return Err(AppError::Validation(format!(
                "Note title exceeds {} characters",
                MAX_TITLE_LENGTH
            )));
        }
        validate_note_date(&req.note_date)?;

        let profile = self.repo.get_profile(user_id).await?;
        let current = self.repo.count_notes(user_id).await?;

        if current >= profile.notes_current_total_quota {
            return Err(AppError::QuotaExhausted(format!(
                "notes ({} of {})",
                current, profile.notes_current_total_quota
            )));
        }

        let note = self.repo.create_note(user_id, req).await?;

        tracing::info!("Note created for user {}: {}", user_id, note.id);
        Ok(note)
    }

    /// Get a note by ID
    pub async fn get_note(&self, user_id: &str, id: &str) -> Result<Note> {
        self.repo.get_note(user_id, id).await
    }

    /// List a user's notes
    pub async fn list_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        self.repo.list_notes(user_id).await
    }

    /// Update a note
    pub async fn update_note(
        &self,
        user_id: &str,
        id: &str,
        req: UpdateNoteRequest,
    ) -> Result<Note> {
        if let Some(title) = &req.title {
            if title.trim().is_empty() {
                return Err(AppError::Validation("Note title cannot be empty".to_string()));
            }
        }
        if let Some(note_date) = &req.note_date {
            validate_note_date(note_date)?;
        }

        let note = self.repo.update_note(user_id, id, req).await?;

        tracing::debug!("Note updated for user {}: {}", user_id, id);
        Ok(note)
    }

    /// Delete a note
    pub async fn delete_note(&self, user_id: &str, id: &str) -> Result<()> {
        self.repo.delete_note(user_id, id).await?;

        tracing::info!("Note deleted for user {}: {}", user_id, id);
        Ok(())
    }
}

fn validate_note_date(s: &str) -> Result<()> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| AppError::Validation(format!("Invalid note date: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::initialize_database;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_service() -> (NotesService, Repository, String) {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        let repo = Repository::new(pool);
        let user = repo.create_user("notes@example.com", "hash").await.unwrap();
        repo.create_profile(&user.id, "notes", 5, 3).await.unwrap();

        (NotesService::new(repo.clone()), repo, user.id)
    }

    fn note_req(title: &str) -> CreateNoteRequest {
        CreateNoteRequest {
            title: title.to_string(),
            content: "content".to_string(),
            note_date: "2026-08-27".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_gated_by_quota() {
        let (service, _repo, user_id) = create_test_service().await;

        for i in 0..3 {
            service
                .create_note(&user_id, note_req(&format!("Note {}", i)))
                .await
                .unwrap();
        }

        let result = service.create_note(&user_id, note_req("One too many")).await;
        assert!(matches!(result, Err(AppError::QuotaExhausted(_))));
    }

    #[tokio::test]
    async fn test_delete_frees_quota() {
        let (service, _repo, user_id) = create_test_service().await;

        let mut last = None;
        for i in 0..3 {
            last = Some(
                service
                    .create_note(&user_id, note_req(&format!("Note {}", i)))
                    .await
                    .unwrap(),
            );
        }

        service.delete_note(&user_id, &last.unwrap().id).await.unwrap();
        service.create_note(&user_id, note_req("Fits again")).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_date_rejected() {
        let (service, _repo, user_id) = create_test_service().await;

        let req = CreateNoteRequest {
            title: "Bad date".to_string(),
            content: "content".to_string(),
            note_date: "27/08/2026".to_string(),
        };

        let result = service.create_note(&user_id, req).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_note() {
        let (service, _repo, user_id) = create_test_service().await;

        let note = service.create_note(&user_id, note_req("Original")).await.unwrap();

        let updated = service
            .update_note(
                &user_id,
                &note.id,
                UpdateNoteRequest {
                    title: Some("Updated".to_string()),
                    content: None,
                    note_date: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Updated");
        assert_eq!(updated.content, "content");
    }
}
