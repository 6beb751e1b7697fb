//! Database row models and their conversion into domain types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{EntryKind, LedgerEntry, LedgerOwner, Money, Room, User, UserId};
use crate::error::GatewayError;

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    /// User UUID.
    pub id: Uuid,
    /// Unique login name.
    pub username: String,
    /// Balance in centavos.
    pub balance_cents: i64,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id.into(),
            username: row.username,
            balance: Money::from_cents(row.balance_cents),
            created_at: row.created_at,
        }
    }
}

/// A row from the `rooms` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoomRow {
    /// Room UUID.
    pub id: Uuid,
    /// Host UUID.
    pub host_id: Uuid,
    /// Guest UUID, once joined.
    pub guest_id: Option<Uuid>,
    /// Per-player stake in centavos.
    pub stake_cents: i64,
    /// Status string (`waiting`, `playing`, `finished`).
    pub status: String,
    /// Winner UUID, once finished.
    pub winner_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last transition timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<RoomRow> for Room {
    type Error = GatewayError;

    fn try_from(row: RoomRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            host_id: row.host_id.into(),
            guest_id: row.guest_id.map(UserId::from),
            stake: Money::from_cents(row.stake_cents),
            status: row
                .status
                .parse()
                .map_err(|_| GatewayError::Internal(format!("corrupt room status: {}", row.status)))?,
            winner_id: row.winner_id.map(UserId::from),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row from the `transactions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerRow {
    /// Monotonic row id.
    pub id: i64,
    /// Owner UUID; `NULL` for the platform.
    pub user_id: Option<Uuid>,
    /// Kind string.
    pub kind: String,
    /// Signed amount in centavos.
    pub amount_cents: i64,
    /// Free-text description.
    pub meta: String,
    /// Structured correlation key.
    pub reference: Option<String>,
    /// Append timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = GatewayError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            owner: LedgerOwner::from(row.user_id.map(UserId::from)),
            kind: row.kind.parse::<EntryKind>()?,
            amount: Money::from_cents(row.amount_cents),
            meta: row.meta,
            reference: row.reference,
            created_at: row.created_at,
        })
    }
}

/// A row from the `sessions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    /// Session owner.
    pub user_id: Uuid,
    /// Expiry as Unix seconds.
    pub expires_at: i64,
}
