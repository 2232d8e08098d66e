//! Integration tests for the daybook backend
//!
//! These tests verify end-to-end functionality including:
//! - Account lifecycle and sessions
//! - Quota gating, purchases and recalculation
//! - The package expiry and task cleanup sweeps
//! - Activity log duplicate suppression

use chrono::{Duration, Utc};
use daybook::database::{create_pool, CreateNoteRequest, CreateTaskRequest, PackageType, PurchasePackageRequest, Repository};
use daybook::services::{
    ActivityService, AuthService, NotesService, QuotaService, SweepService, TasksService,
};
use sqlx::SqlitePool;
use tempfile::TempDir;

struct TestApp {
    pool: SqlitePool,
    repo: Repository,
    auth: AuthService,
    tasks: TasksService,
    notes: NotesService,
    quota: QuotaService,
    activity: ActivityService,
    sweeps: SweepService,
    _temp: TempDir,
}

/// Helper to create a full service stack over a temp database
async fn create_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let pool = create_pool(&db_path).await.unwrap();
    let repo = Repository::new(pool.clone());

    let quota = QuotaService::new(repo.clone());

    TestApp {
        pool,
        repo: repo.clone(),
        auth: AuthService::new(repo.clone(), Duration::hours(1)),
        tasks: TasksService::new(repo.clone()),
        notes: NotesService::new(repo.clone()),
        quota: quota.clone(),
        activity: ActivityService::new(repo.clone()),
        sweeps: SweepService::new(repo, quota),
        _temp: temp_dir,
    }
}

fn task_req(name: &str) -> CreateTaskRequest {
    CreateTaskRequest {
        name: name.to_string(),
        description: None,
        deadline: None,
        tag: None,
    }
}

#[tokio::test]
async fn test_account_and_task_lifecycle() {
    let app = create_test_app().await;

    let (user, session) = app
        .auth
        .sign_up("alice@example.com", "password123", "Alice")
        .await
        .unwrap();

    // Session resolves back to the user
    let (resolved, _) = app.auth.session_user(&session.token).await.unwrap();
    assert_eq!(resolved.id, user.id);

    // Free tier admits five tasks, then gates
    for i in 0..5 {
        app.tasks
            .create_task(&user.id, task_req(&format!("Task {}", i)))
            .await
            .unwrap();
    }
    assert!(app.tasks.create_task(&user.id, task_req("Sixth")).await.is_err());

    // Completing a task records the dashboard counter
    let all = app.tasks.list_tasks(&user.id, None, None).await.unwrap();
    let completed = app.tasks.complete_task(&user.id, &all[0].id).await.unwrap();

    let day = completed.completed_at.unwrap().date_naive().to_string();
    let summaries = app.tasks.daily_summaries(&user.id, &day, &day).await.unwrap();
    assert_eq!(summaries[0].completed_count, 1);

    app.auth.sign_out(&session.token).await.unwrap();
    assert!(app.auth.session_user(&session.token).await.is_err());
}

#[tokio::test]
async fn test_purchase_extends_quota_and_sweep_reverts_it() {
    let app = create_test_app().await;

    let (user, _) = app
        .auth
        .sign_up("bob@example.com", "password123", "Bob")
        .await
        .unwrap();

    // Notes gate at the free-tier base of three
    for i in 0..3 {
        app.notes
            .create_note(
                &user.id,
                CreateNoteRequest {
                    title: format!("Note {}", i),
                    content: "content".to_string(),
                    note_date: "2026-08-27".to_string(),
                },
            )
            .await
            .unwrap();
    }
    assert!(app
        .notes
        .create_note(
            &user.id,
            CreateNoteRequest {
                title: "Fourth".to_string(),
                content: "content".to_string(),
                note_date: "2026-08-27".to_string(),
            },
        )
        .await
        .is_err());

    // A purchase raises the cached total
    app.quota
        .purchase_package(
            &user.id,
            PurchasePackageRequest {
                package_type: PackageType::Notes,
                items_added: 5,
                duration_days: 30,
            },
        )
        .await
        .unwrap();

    let profile = app.repo.get_profile(&user.id).await.unwrap();
    assert_eq!(profile.notes_current_total_quota, 3 + 5);
    assert!(profile.billing);

    app.notes
        .create_note(
            &user.id,
            CreateNoteRequest {
                title: "Now fits".to_string(),
                content: "content".to_string(),
                note_date: "2026-08-27".to_string(),
            },
        )
        .await
        .unwrap();

    // Force the package past its expiry and run the sweep
    sqlx::query("UPDATE quota_packages SET expires_at = ? WHERE user_id = ?")
        .bind(Utc::now() - Duration::seconds(1))
        .bind(&user.id)
        .execute(&app.pool)
        .await
        .unwrap();

    let outcome = app.sweeps.expire_packages().await.unwrap();
    assert_eq!(outcome.expired, 1);
    assert_eq!(outcome.recalculated, 1);

    let profile = app.repo.get_profile(&user.id).await.unwrap();
    assert_eq!(profile.notes_current_total_quota, 3);
    assert!(!profile.billing);
}

#[tokio::test]
async fn test_task_cleanup_sweep_retention_boundary() {
    let app = create_test_app().await;

    let (user, _) = app
        .auth
        .sign_up("carol@example.com", "password123", "Carol")
        .await
        .unwrap();

    let stale = app.tasks.create_task(&user.id, task_req("Stale")).await.unwrap();
    let recent = app.tasks.create_task(&user.id, task_req("Recent")).await.unwrap();

    app.tasks.complete_task(&user.id, &stale.id).await.unwrap();
    app.tasks.complete_task(&user.id, &recent.id).await.unwrap();

    sqlx::query("UPDATE tasks SET completed_at = ? WHERE id = ?")
        .bind(Utc::now() - Duration::hours(25))
        .bind(&stale.id)
        .execute(&app.pool)
        .await
        .unwrap();
    sqlx::query("UPDATE tasks SET completed_at = ? WHERE id = ?")
        .bind(Utc::now() - Duration::hours(1))
        .bind(&recent.id)
        .execute(&app.pool)
        .await
        .unwrap();

    let deleted = app.sweeps.cleanup_completed_tasks().await.unwrap();
    assert_eq!(deleted, 1);

    assert!(app.tasks.get_task(&user.id, &stale.id).await.is_err());
    assert!(app.tasks.get_task(&user.id, &recent.id).await.is_ok());
}

#[tokio::test]
async fn test_activity_duplicate_suppression_window() {
    let app = create_test_app().await;

    let (user, _) = app
        .auth
        .sign_up("dave@example.com", "password123", "Dave")
        .await
        .unwrap();

    // Two identical entries inside the window collapse to one
    app.activity.log(&user.id, "tasks", "create", "Buy milk").await;
    app.activity.log(&user.id, "tasks", "create", "Buy milk").await;

    let count = app
        .repo
        .count_activity(&user.id, "tasks", "create", "Buy milk")
        .await
        .unwrap();
    assert_eq!(count, 1);

    // Pushed outside the window, the same entry logs again
    sqlx::query("UPDATE activity_log SET created_at = ? WHERE user_id = ? AND details = ?")
        .bind(Utc::now() - Duration::seconds(61))
        .bind(&user.id)
        .bind("Buy milk")
        .execute(&app.pool)
        .await
        .unwrap();

    app.activity.log(&user.id, "tasks", "create", "Buy milk").await;

    let count = app
        .repo
        .count_activity(&user.id, "tasks", "create", "Buy milk")
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_password_recovery_end_to_end() {
    let app = create_test_app().await;

    app.auth
        .sign_up("erin@example.com", "password123", "Erin")
        .await
        .unwrap();

    let token = app
        .auth
        .request_password_recovery("erin@example.com")
        .await
        .unwrap()
        .expect("token for registered email");

    app.auth
        .confirm_password_recovery(&token, "recovered123")
        .await
        .unwrap();

    app.auth.sign_in("erin@example.com", "recovered123").await.unwrap();
    assert!(app.auth.sign_in("erin@example.com", "password123").await.is_err());
}
