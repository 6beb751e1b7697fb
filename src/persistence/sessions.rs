//! Queries against the `sessions` table.
//!
//! Expiry is stored as Unix seconds so that range deletes compare integers.

use sqlx::SqliteConnection;

use super::models::SessionRow;
use crate::domain::UserId;
use crate::error::GatewayError;

/// Stores a session digest for `user`.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn insert(
    conn: &mut SqliteConnection,
    token_hash: &str,
    user: UserId,
    expires_at: i64,
    now: i64,
) -> Result<(), GatewayError> {
    sqlx::query(
        "INSERT INTO sessions (token_hash, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(token_hash)
    .bind(user.as_uuid())
    .bind(expires_at)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

/// Looks up a session by digest.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn find(
    conn: &mut SqliteConnection,
    token_hash: &str,
) -> Result<Option<SessionRow>, GatewayError> {
    Ok(
        sqlx::query_as::<_, SessionRow>(
            "SELECT user_id, expires_at FROM sessions WHERE token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(conn)
        .await?,
    )
}

/// Deletes a session. Returns `true` if one existed.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn delete(conn: &mut SqliteConnection, token_hash: &str) -> Result<bool, GatewayError> {
    let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(token_hash)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes every session that expired before `now`.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn delete_expired(conn: &mut SqliteConnection, now: i64) -> Result<u64, GatewayError> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(now)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
