//! Session extraction and route guarding
//!
//! Two middlewares: `require_session` protects the JSON API with a 401,
//! while `route_guard` reproduces browser navigation rules over page
//! paths (unauthenticated users bounce to the login page, authenticated
//! users bounce off the auth-only pages to the dashboard).

use crate::app::AppState;
use crate::error::AppError;
use axum::{
    body::Body,
    extract::State,
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap, Request,
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

/// Page paths that require an authenticated session
pub const PROTECTED_PATHS: &[&str] = &[
    "/dashboard",
    "/tasks",
    "/notes",
    "/calendar",
    "/billing",
    "/activity",
];

/// Page paths only meaningful while signed out
pub const AUTH_ONLY_PATHS: &[&str] = &["/login", "/register", "/forgot-password"];

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// The authenticated user, inserted into request extensions by
/// `require_session`
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Protected,
    AuthOnly,
    Open,
}

/// Classify a request path against the fixed guard lists
pub fn classify(path: &str) -> PathClass {
    if matches_any(path, PROTECTED_PATHS) {
        PathClass::Protected
    } else if matches_any(path, AUTH_ONLY_PATHS) {
        PathClass::AuthOnly
    } else {
        PathClass::Open
    }
}

fn matches_any(path: &str, prefixes: &[&str]) -> bool {
    prefixes
        .iter()
        .any(|p| path == *p || path.starts_with(&format!("{}/", p)))
}

/// Pull the session token from the Authorization header or session cookie
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        let mut parts = value.splitn(2, ' ');
        if let (Some(scheme), Some(token)) = (parts.next(), parts.next()) {
            if scheme.eq_ignore_ascii_case("Bearer") && !token.trim().is_empty() {
                return Some(token.trim().to_string());
            }
        }
    }

    headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(str::trim)
                .find_map(|c| c.strip_prefix("session="))
                .map(str::to_string)
        })
}

/// API middleware: reject requests without a live session, otherwise make
/// the current user available to handlers
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(request.headers()).ok_or(AppError::Unauthorized)?;
    let (user, _session) = state.auth.session_user(&token).await?;

    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        email: user.email,
    });

    Ok(next.run(request).await)
}

/// Page middleware: redirect around the fixed protected/auth-only lists
pub async fn route_guard(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let class = classify(request.uri().path());
    if class == PathClass::Open {
        return next.run(request).await;
    }

    let authenticated = match session_token(request.headers()) {
        Some(token) => state.auth.session_user(&token).await.is_ok(),
        None => false,
    };

    match class {
        PathClass::Protected if !authenticated => Redirect::to(LOGIN_PATH).into_response(),
        PathClass::AuthOnly if authenticated => Redirect::to(DASHBOARD_PATH).into_response(),
        _ => next.run(request).await,
    }
}
