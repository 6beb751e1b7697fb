//! Auth service: registration, login, and bearer-session lookup.

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};

use crate::domain::user::normalize_username;
use crate::domain::{Money, User, UserId};
use crate::error::GatewayError;
use crate::persistence::{Database, sessions, users};

/// Longest session lifetime accepted; larger settings are clamped to it.
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365;

/// A user together with a freshly issued session token.
#[derive(Debug, Clone)]
pub struct Session {
    /// Authenticated user.
    pub user: User,
    /// Opaque bearer token. Only its digest is stored.
    pub token: String,
}

/// Issues and verifies opaque bearer tokens.
///
/// Tokens are random UUIDs; the database keeps only a SHA-256 digest keyed
/// with the configured secret, so a leaked `sessions` table cannot be
/// replayed.
#[derive(Debug, Clone)]
pub struct AuthService {
    db: Database,
    secret: String,
    ttl: Duration,
}

impl AuthService {
    /// Creates a new `AuthService`.
    ///
    /// `ttl_hours` is capped at [`MAX_SESSION_TTL_HOURS`].
    #[must_use]
    pub fn new(db: Database, secret: impl Into<String>, ttl_hours: u64) -> Self {
        let hours = ttl_hours.min(MAX_SESSION_TTL_HOURS);
        if hours < ttl_hours {
            tracing::warn!(ttl_hours, max = MAX_SESSION_TTL_HOURS, "session ttl clamped");
        }
        let ttl = i64::try_from(hours)
            .ok()
            .and_then(Duration::try_hours)
            .unwrap_or_else(Duration::zero);
        Self {
            db,
            secret: secret.into(),
            ttl,
        }
    }

    /// Creates an account with a zero balance and opens a session.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] if the username is blank or too long.
    /// - [`GatewayError::UsernameTaken`] if it already exists.
    pub async fn register(&self, username: &str) -> Result<Session, GatewayError> {
        let username = normalize_username(username)
            .ok_or_else(|| GatewayError::InvalidRequest("username required".to_string()))?;

        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            balance: Money::ZERO,
            created_at: Utc::now(),
        };

        let mut tx = self.db.begin().await?;
        users::insert(&mut tx, &user).await?;
        let token = self.issue(&mut tx, user.id).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(Session { user, token })
    }

    /// Opens a session for an existing account.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] if the username is blank.
    /// - [`GatewayError::UserNotFound`] if no such account exists.
    pub async fn login(&self, username: &str) -> Result<Session, GatewayError> {
        let username = normalize_username(username)
            .ok_or_else(|| GatewayError::InvalidRequest("username required".to_string()))?;

        let mut conn = self.db.acquire().await?;
        let user = users::find_by_username(&mut conn, username)
            .await?
            .ok_or_else(|| GatewayError::UserNotFound(username.to_string()))?;
        let token = self.issue(&mut conn, user.id).await?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(Session { user, token })
    }

    /// Resolves a bearer token to its user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unauthorized`] if the token is unknown,
    /// expired, or belongs to a deleted user.
    pub async fn authenticate(&self, token: &str) -> Result<User, GatewayError> {
        let mut conn = self.db.acquire().await?;
        let session = sessions::find(&mut conn, &self.digest(token))
            .await?
            .ok_or_else(invalid_token)?;
        if session.expires_at <= Utc::now().timestamp() {
            return Err(invalid_token());
        }
        users::find_by_id(&mut conn, session.user_id.into())
            .await?
            .ok_or_else(invalid_token)
    }

    /// Revokes a session. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn logout(&self, token: &str) -> Result<(), GatewayError> {
        let mut conn = self.db.acquire().await?;
        if sessions::delete(&mut conn, &self.digest(token)).await? {
            tracing::debug!("session revoked");
        }
        Ok(())
    }

    /// Reloads the current state of a user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] if the account no longer exists.
    pub async fn me(&self, id: UserId) -> Result<User, GatewayError> {
        let mut conn = self.db.acquire().await?;
        users::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| GatewayError::UserNotFound(id.to_string()))
    }

    /// Removes every expired session. Returns how many were deleted.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn purge_expired(&self) -> Result<u64, GatewayError> {
        let mut conn = self.db.acquire().await?;
        sessions::delete_expired(&mut conn, Utc::now().timestamp()).await
    }

    async fn issue(
        &self,
        conn: &mut sqlx::SqliteConnection,
        user: UserId,
    ) -> Result<String, GatewayError> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.ttl).unwrap_or(now).timestamp();
        sessions::insert(conn, &self.digest(&token), user, expires_at, now.timestamp()).await?;
        Ok(token)
    }

    fn digest(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

fn invalid_token() -> GatewayError {
    GatewayError::Unauthorized("invalid token".to_string())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    async fn service(ttl_hours: u64) -> AuthService {
        let Ok(db) = Database::in_memory().await else {
            panic!("db");
        };
        AuthService::new(db, "test_secret", ttl_hours)
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let auth = service(1).await;
        let Ok(session) = auth.register("  ana  ").await else {
            panic!("register failed");
        };
        assert_eq!(session.user.username, "ana");
        assert_eq!(session.user.balance, Money::ZERO);

        let Ok(user) = auth.authenticate(&session.token).await else {
            panic!("token rejected");
        };
        assert_eq!(user.id, session.user.id);
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let auth = service(1).await;
        assert!(auth.register("bia").await.is_ok());
        assert!(matches!(
            auth.register("bia").await,
            Err(GatewayError::UsernameTaken(_))
        ));
    }

    #[tokio::test]
    async fn blank_username_rejected() {
        let auth = service(1).await;
        assert!(matches!(
            auth.register("   ").await,
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn login_requires_existing_user() {
        let auth = service(1).await;
        assert!(matches!(
            auth.login("ghost").await,
            Err(GatewayError::UserNotFound(_))
        ));
        assert!(auth.register("caio").await.is_ok());
        let Ok(session) = auth.login("caio").await else {
            panic!("login failed");
        };
        assert!(auth.authenticate(&session.token).await.is_ok());
    }

    #[tokio::test]
    async fn logout_revokes_token() {
        let auth = service(1).await;
        let Ok(session) = auth.register("duda").await else {
            panic!("register failed");
        };
        assert!(auth.logout(&session.token).await.is_ok());
        assert!(matches!(
            auth.authenticate(&session.token).await,
            Err(GatewayError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn expired_session_rejected_and_purged() {
        let auth = service(0).await;
        let Ok(session) = auth.register("edu").await else {
            panic!("register failed");
        };
        assert!(matches!(
            auth.authenticate(&session.token).await,
            Err(GatewayError::Unauthorized(_))
        ));
        assert_eq!(auth.purge_expired().await.ok(), Some(1));
    }

    #[tokio::test]
    async fn huge_ttl_is_clamped_not_expired() {
        let auth = service(u64::MAX).await;
        let Ok(session) = auth.register("gabi").await else {
            panic!("register failed");
        };
        assert!(auth.authenticate(&session.token).await.is_ok());
        assert_eq!(auth.purge_expired().await.ok(), Some(0));

        let Ok(mut conn) = auth.db.acquire().await else {
            panic!("conn");
        };
        let Ok(Some(row)) = sessions::find(&mut conn, &auth.digest(&session.token)).await else {
            panic!("session row missing");
        };
        let max_secs = i64::try_from(MAX_SESSION_TTL_HOURS * 3600).unwrap_or(i64::MAX);
        let remaining = row.expires_at - Utc::now().timestamp();
        assert!(remaining > max_secs - 60 && remaining <= max_secs);
    }

    #[tokio::test]
    async fn tokens_are_bound_to_secret() {
        let Ok(db) = Database::in_memory().await else {
            panic!("db");
        };
        let issuer = AuthService::new(db.clone(), "one", 1);
        let other = AuthService::new(db, "two", 1);
        let Ok(session) = issuer.register("fabi").await else {
            panic!("register failed");
        };
        assert!(other.authenticate(&session.token).await.is_err());
    }
}
