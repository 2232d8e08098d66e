//! Authentication endpoints

use crate::api::guard::session_token;
use crate::app::AppState;
use crate::database::{Session, User};
use crate::error::{AppError, Result};
use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/session", get(session))
        .route("/password", put(update_password))
        .route("/recovery", post(request_recovery))
        .route("/recovery/confirm", post(confirm_recovery))
}

#[derive(Deserialize)]
struct SignupRequest {
    email: String,
    password: String,
    #[serde(default)]
    display_name: String,
}

#[derive(Deserialize)]
struct SigninRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct UpdatePasswordRequest {
    current_password: String,
    new_password: String,
}

#[derive(Deserialize)]
struct RecoveryRequest {
    email: String,
}

#[derive(Deserialize)]
struct RecoveryConfirmRequest {
    token: String,
    new_password: String,
}

#[derive(Serialize)]
struct UserResponse {
    id: String,
    email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Serialize)]
struct SessionResponse {
    token: String,
    expires_at: DateTime<Utc>,
    user: UserResponse,
}

impl SessionResponse {
    fn new(user: User, session: Session) -> Self {
        Self {
            token: session.token,
            expires_at: session.expires_at,
            user: user.into(),
        }
    }
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<SessionResponse>> {
    let (user, session) = state
        .auth
        .sign_up(&req.email, &req.password, &req.display_name)
        .await?;

    state.activity.log(&user.id, "auth", "signup", &user.email).await;

    Ok(Json(SessionResponse::new(user, session)))
}

async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> Result<Json<SessionResponse>> {
    let (user, session) = state.auth.sign_in(&req.email, &req.password).await?;

    state.activity.log(&user.id, "auth", "signin", &user.email).await;

    Ok(Json(SessionResponse::new(user, session)))
}

async fn signout(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>> {
    let token = session_token(&headers).ok_or(AppError::Unauthorized)?;
    state.auth.sign_out(&token).await?;

    Ok(Json(json!({ "message": "Signed out" })))
}

async fn session(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<SessionResponse>> {
    let token = session_token(&headers).ok_or(AppError::Unauthorized)?;
    let (user, session) = state.auth.session_user(&token).await?;

    Ok(Json(SessionResponse::new(user, session)))
}

async fn update_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<Json<Value>> {
    let token = session_token(&headers).ok_or(AppError::Unauthorized)?;
    let (user, _) = state.auth.session_user(&token).await?;

    state
        .auth
        .update_password(&user.id, &req.current_password, &req.new_password)
        .await?;

    state.activity.log(&user.id, "auth", "password_update", "").await;

    Ok(Json(json!({ "message": "Password updated" })))
}

async fn request_recovery(
    State(state): State<AppState>,
    Json(req): Json<RecoveryRequest>,
) -> Result<Json<Value>> {
    // The answer is identical whether or not the address is registered
    state.auth.request_password_recovery(&req.email).await?;

    Ok(Json(json!({
        "message": "If the address is registered, a recovery token has been issued"
    })))
}

async fn confirm_recovery(
    State(state): State<AppState>,
    Json(req): Json<RecoveryConfirmRequest>,
) -> Result<Json<Value>> {
    state
        .auth
        .confirm_password_recovery(&req.token, &req.new_password)
        .await?;

    Ok(Json(json!({ "message": "Password updated" })))
}
