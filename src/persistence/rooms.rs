//! Queries against the `rooms` table.
//!
//! State transitions are conditional updates keyed on the expected current
//! status, so a transition that lost a race affects zero rows instead of
//! overwriting the winner's state.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use super::models::RoomRow;
use crate::domain::{Room, RoomId, RoomStatus, UserId};
use crate::error::GatewayError;

const SELECT_ROOM: &str = "SELECT id, host_id, guest_id, stake_cents, status, winner_id, \
                           created_at, updated_at FROM rooms";

/// Inserts a new room.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn insert(conn: &mut SqliteConnection, room: &Room) -> Result<(), GatewayError> {
    sqlx::query(
        "INSERT INTO rooms (id, host_id, guest_id, stake_cents, status, winner_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(room.id.as_uuid())
    .bind(room.host_id.as_uuid())
    .bind(room.guest_id.map(uuid::Uuid::from))
    .bind(room.stake.cents())
    .bind(room.status.as_str())
    .bind(room.winner_id.map(uuid::Uuid::from))
    .bind(room.created_at)
    .bind(room.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Loads a room by id.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn find(conn: &mut SqliteConnection, id: RoomId) -> Result<Option<Room>, GatewayError> {
    let row = sqlx::query_as::<_, RoomRow>(&format!("{SELECT_ROOM} WHERE id = ?"))
        .bind(id.as_uuid())
        .fetch_optional(conn)
        .await?;
    row.map(Room::try_from).transpose()
}

/// Lists rooms newest first, optionally filtered by status.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn list(
    conn: &mut SqliteConnection,
    status: Option<RoomStatus>,
    limit: u32,
    offset: u32,
) -> Result<Vec<Room>, GatewayError> {
    let rows = sqlx::query_as::<_, RoomRow>(&format!(
        "{SELECT_ROOM} WHERE (?1 IS NULL OR status = ?1) \
         ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
    ))
    .bind(status.map(RoomStatus::as_str))
    .bind(i64::from(limit))
    .bind(i64::from(offset))
    .fetch_all(conn)
    .await?;
    rows.into_iter().map(Room::try_from).collect()
}

/// Counts rooms, optionally filtered by status.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn count(
    conn: &mut SqliteConnection,
    status: Option<RoomStatus>,
) -> Result<u64, GatewayError> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE (?1 IS NULL OR status = ?1)")
        .bind(status.map(RoomStatus::as_str))
        .fetch_one(conn)
        .await?;
    Ok(u64::try_from(n).unwrap_or(0))
}

/// Moves a `waiting` room to `playing` with `guest` as the second player.
///
/// Returns `false` if the room was no longer waiting, already had a guest,
/// or is hosted by `guest`.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn claim_for_guest(
    conn: &mut SqliteConnection,
    id: RoomId,
    guest: UserId,
    now: DateTime<Utc>,
) -> Result<bool, GatewayError> {
    let result = sqlx::query(
        "UPDATE rooms SET guest_id = ?1, status = 'playing', updated_at = ?2 \
         WHERE id = ?3 AND status = 'waiting' AND guest_id IS NULL AND host_id != ?1",
    )
    .bind(guest.as_uuid())
    .bind(now)
    .bind(id.as_uuid())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Moves a `playing` room to `finished` and records the winner.
///
/// Returns `false` if the room was not playing.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn finish(
    conn: &mut SqliteConnection,
    id: RoomId,
    winner: UserId,
    now: DateTime<Utc>,
) -> Result<bool, GatewayError> {
    let result = sqlx::query(
        "UPDATE rooms SET winner_id = ?1, status = 'finished', updated_at = ?2 \
         WHERE id = ?3 AND status = 'playing'",
    )
    .bind(winner.as_uuid())
    .bind(now)
    .bind(id.as_uuid())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Money, User};
    use crate::persistence::{Database, users};

    async fn seed_user(conn: &mut SqliteConnection, name: &str) -> UserId {
        let user = User {
            id: UserId::new(),
            username: name.to_string(),
            balance: Money::ZERO,
            created_at: Utc::now(),
        };
        if users::insert(conn, &user).await.is_err() {
            panic!("seed user failed");
        }
        user.id
    }

    fn new_room(host: UserId) -> Room {
        let now = Utc::now();
        Room {
            id: RoomId::new(),
            host_id: host,
            guest_id: None,
            stake: Money::from_cents(1_500),
            status: RoomStatus::Waiting,
            winner_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn lifecycle_transitions_are_conditional() {
        let Ok(db) = Database::in_memory().await else {
            panic!("db");
        };
        let Ok(mut conn) = db.acquire().await else {
            panic!("conn");
        };
        let host = seed_user(&mut conn, "host").await;
        let guest = seed_user(&mut conn, "guest").await;
        let room = new_room(host);
        assert!(insert(&mut conn, &room).await.is_ok());

        // Host cannot claim their own room; finishing a waiting room fails.
        assert_eq!(claim_for_guest(&mut conn, room.id, host, Utc::now()).await.ok(), Some(false));
        assert_eq!(finish(&mut conn, room.id, host, Utc::now()).await.ok(), Some(false));

        assert_eq!(claim_for_guest(&mut conn, room.id, guest, Utc::now()).await.ok(), Some(true));
        // Second claim loses.
        let third = seed_user(&mut conn, "third").await;
        assert_eq!(claim_for_guest(&mut conn, room.id, third, Utc::now()).await.ok(), Some(false));

        assert_eq!(finish(&mut conn, room.id, guest, Utc::now()).await.ok(), Some(true));
        assert_eq!(finish(&mut conn, room.id, host, Utc::now()).await.ok(), Some(false));

        let Ok(Some(stored)) = find(&mut conn, room.id).await else {
            panic!("room missing");
        };
        assert_eq!(stored.status, RoomStatus::Finished);
        assert_eq!(stored.guest_id, Some(guest));
        assert_eq!(stored.winner_id, Some(guest));
        assert_eq!(stored.stake, Money::from_cents(1_500));
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let Ok(db) = Database::in_memory().await else {
            panic!("db");
        };
        let Ok(mut conn) = db.acquire().await else {
            panic!("conn");
        };
        let host = seed_user(&mut conn, "host").await;
        let guest = seed_user(&mut conn, "guest").await;
        let a = new_room(host);
        let b = new_room(host);
        assert!(insert(&mut conn, &a).await.is_ok());
        assert!(insert(&mut conn, &b).await.is_ok());
        assert!(claim_for_guest(&mut conn, b.id, guest, Utc::now()).await.is_ok());

        let Ok(waiting) = list(&mut conn, Some(RoomStatus::Waiting), 10, 0).await else {
            panic!("list failed");
        };
        assert_eq!(waiting.len(), 1);
        assert_eq!(waiting.first().map(|r| r.id), Some(a.id));

        assert_eq!(count(&mut conn, None).await.ok(), Some(2));
        assert_eq!(count(&mut conn, Some(RoomStatus::Playing)).await.ok(), Some(1));
    }
}
