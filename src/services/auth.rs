//! Authentication service
//!
//! Account creation, session management, password updates and the
//! recovery flow. Passwords are hashed with argon2; sessions are opaque
//! random tokens stored server-side with an expiry.

use crate::config::{
    self, MIN_PASSWORD_LENGTH, RECOVERY_TOKEN_TTL_MINS,
};
use crate::database::{PackageType, Repository, Session, User};
use crate::error::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};

/// Service for accounts and sessions
#[derive(Clone)]
pub struct AuthService {
    repo: Repository,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(repo: Repository, session_ttl: Duration) -> Self {
        Self { repo, session_ttl }
    }

    /// Register a new account and open a session.
    ///
    /// Also creates the profile row seeded with the free-tier quotas.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<(User, Session)> {
        let email = email.trim().to_lowercase();
        validate_email(&email)?;
        validate_password(password)?;

        if self.repo.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::EmailTaken(email));
        }

        let hash = hash_password(password)?;
        let user = self.repo.create_user(&email, &hash).await?;

        let display_name = if display_name.trim().is_empty() {
            email.split('@').next().unwrap_or("user").to_string()
        } else {
            display_name.trim().to_string()
        };

        self.repo
            .create_profile(
                &user.id,
                &display_name,
                config::base_quota(PackageType::Todos),
                config::base_quota(PackageType::Notes),
            )
            .await?;

        let session = self.repo.create_session(&user.id, self.session_ttl).await?;

        tracing::info!("New account registered: {}", user.id);
        Ok((user, session))
    }

    /// Verify credentials and open a session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(User, Session)> {
        let email = email.trim().to_lowercase();

        let user = self
            .repo
            .get_user_by_email(&email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let session = self.repo.create_session(&user.id, self.session_ttl).await?;

        tracing::info!("User signed in: {}", user.id);
        Ok((user, session))
    }

    /// Close a session
    pub async fn sign_out(&self, token: &str) -> Result<()> {
        self.repo.delete_session(token).await?;
        Ok(())
    }

    /// Resolve a session token to its user
    pub async fn session_user(&self, token: &str) -> Result<(User, Session)> {
        let session = self
            .repo
            .get_session(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let user = self.repo.get_user(&session.user_id).await?;
        Ok((user, session))
    }

    /// Change a password, verifying the current one first
    pub async fn update_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        validate_password(new_password)?;

        let user = self.repo.get_user(user_id).await?;
        if !verify_password(current_password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let hash = hash_password(new_password)?;
        self.repo.update_password_hash(user_id, &hash).await?;

        tracing::info!("Password updated for user: {}", user_id);
        Ok(())
    }

    /// Issue a single-use recovery token for an email.
    ///
    /// Mail delivery is out of scope: the token is logged and returned so
    /// the deployment can route it. Unknown emails yield `Ok(None)` so the
    /// endpoint can answer identically either way.
    pub async fn request_password_recovery(&self, email: &str) -> Result<Option<String>> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.repo.get_user_by_email(&email).await? else {
            tracing::debug!("Recovery requested for unknown email");
            return Ok(None);
        };

        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        let expires_at = Utc::now() + Duration::minutes(RECOVERY_TOKEN_TTL_MINS);
        self.repo
            .create_password_reset(&user.id, &token, expires_at)
            .await?;

        tracing::info!("Recovery token issued for user: {}", user.id);
        Ok(Some(token))
    }

    /// Redeem a recovery token and set a new password
    pub async fn confirm_password_recovery(&self, token: &str, new_password: &str) -> Result<()> {
        validate_password(new_password)?;

        let reset = self
            .repo
            .get_valid_password_reset(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let hash = hash_password(new_password)?;
        self.repo.update_password_hash(&reset.user_id, &hash).await?;
        self.repo.mark_password_reset_used(token).await?;

        tracing::info!("Password recovered for user: {}", reset.user_id);
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<()> {
    let valid = email.contains('@')
        && !email.starts_with('@')
        && !email.ends_with('@')
        && !email.contains(char::is_whitespace);

    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!("Invalid email address: {}", email)))
    }
}

fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| AppError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::initialize_database;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_service() -> AuthService {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        AuthService::new(Repository::new(pool), Duration::hours(1))
    }

    #[tokio::test]
    async fn test_sign_up_and_sign_in() {
        let service = create_test_service().await;

        let (user, session) = service
            .sign_up("alice@example.com", "correct horse", "Alice")
            .await
            .unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert!(!session.token.is_empty());

        let (signed_in, _) = service
            .sign_in("alice@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(signed_in.id, user.id);

        let result = service.sign_in("alice@example.com", "wrong password").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_sign_up_seeds_free_tier_profile() {
        let service = create_test_service().await;

        let (user, _) = service
            .sign_up("bob@example.com", "password123", "")
            .await
            .unwrap();

        let profile = service.repo.get_profile(&user.id).await.unwrap();
        assert_eq!(profile.todos_current_total_quota, 5);
        assert_eq!(profile.notes_current_total_quota, 3);
        assert!(!profile.billing);
        assert_eq!(profile.display_name, "bob");
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let service = create_test_service().await;

        service
            .sign_up("carol@example.com", "password123", "Carol")
            .await
            .unwrap();

        let result = service
            .sign_up("Carol@Example.com", "password123", "Carol")
            .await;
        assert!(matches!(result, Err(AppError::EmailTaken(_))));
    }

    #[tokio::test]
    async fn test_invalid_inputs_rejected() {
        let service = create_test_service().await;

        assert!(matches!(
            service.sign_up("not-an-email", "password123", "X").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.sign_up("x@example.com", "short", "X").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let service = create_test_service().await;

        let (user, session) = service
            .sign_up("dave@example.com", "password123", "Dave")
            .await
            .unwrap();

        let (resolved, _) = service.session_user(&session.token).await.unwrap();
        assert_eq!(resolved.id, user.id);

        service.sign_out(&session.token).await.unwrap();
        let result = service.session_user(&session.token).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_update_password() {
        let service = create_test_service().await;

        let (user, _) = service
            .sign_up("erin@example.com", "password123", "Erin")
            .await
            .unwrap();

        let result = service
            .update_password(&user.id, "wrong", "newpassword1")
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized)));

        service
            .update_password(&user.id, "password123", "newpassword1")
            .await
            .unwrap();

        service.sign_in("erin@example.com", "newpassword1").await.unwrap();
        assert!(service.sign_in("erin@example.com", "password123").await.is_err());
    }

    #[tokio::test]
    async fn test_password_recovery_flow() {
        let service = create_test_service().await;

        service
            .sign_up("frank@example.com", "password123", "Frank")
            .await
            .unwrap();

        // Unknown email yields no token but no error either
        assert!(service
            .request_password_recovery("nobody@example.com")
            .await
            .unwrap()
            .is_none());

        let token = service
            .request_password_recovery("frank@example.com")
            .await
            .unwrap()
            .unwrap();

        service
            .confirm_password_recovery(&token, "recovered123")
            .await
            .unwrap();

        service.sign_in("frank@example.com", "recovered123").await.unwrap();

        // Token is single-use
        let result = service.confirm_password_recovery(&token, "another123").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
