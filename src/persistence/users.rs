//! Queries against the `users` table.

use sqlx::SqliteConnection;

use super::models::UserRow;
use crate::domain::{Money, User, UserId};
use crate::error::GatewayError;

const SELECT_USER: &str = "SELECT id, username, balance_cents, created_at FROM users";

/// Inserts a new user.
///
/// # Errors
///
/// Returns [`GatewayError::UsernameTaken`] if the username exists, or a
/// [`GatewayError::PersistenceError`] on other failures.
pub async fn insert(conn: &mut SqliteConnection, user: &User) -> Result<(), GatewayError> {
    sqlx::query("INSERT INTO users (id, username, balance_cents, created_at) VALUES (?, ?, ?, ?)")
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(user.balance.cents())
        .bind(user.created_at)
        .execute(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                GatewayError::UsernameTaken(user.username.clone())
            }
            other => other.into(),
        })?;
    Ok(())
}

/// Loads a user by id.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: UserId,
) -> Result<Option<User>, GatewayError> {
    let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = ?"))
        .bind(id.as_uuid())
        .fetch_optional(conn)
        .await?;
    Ok(row.map(User::from))
}

/// Loads a user by username.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn find_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<User>, GatewayError> {
    let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE username = ?"))
        .bind(username)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(User::from))
}

/// Adds `amount` to a user's balance.
///
/// # Errors
///
/// Returns [`GatewayError::UserNotFound`] if no row was updated.
pub async fn credit(
    conn: &mut SqliteConnection,
    id: UserId,
    amount: Money,
) -> Result<(), GatewayError> {
    let result = sqlx::query("UPDATE users SET balance_cents = balance_cents + ? WHERE id = ?")
        .bind(amount.cents())
        .bind(id.as_uuid())
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(GatewayError::UserNotFound(id.to_string()));
    }
    Ok(())
}

/// Subtracts `amount` from a user's balance if it covers the debit.
///
/// The balance check and the update are one statement, so two concurrent
/// debits can never both pass against the same funds. Returns `false` when
/// the balance is insufficient or the user does not exist.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn debit_if_sufficient(
    conn: &mut SqliteConnection,
    id: UserId,
    amount: Money,
) -> Result<bool, GatewayError> {
    let result = sqlx::query(
        "UPDATE users SET balance_cents = balance_cents - ?1 \
         WHERE id = ?2 AND balance_cents >= ?1",
    )
    .bind(amount.cents())
    .bind(id.as_uuid())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
