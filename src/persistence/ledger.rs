//! Queries against the append-only `transactions` table.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use super::models::LedgerRow;
use crate::domain::{EntryKind, LedgerEntry, Money, NewEntry, UserId};
use crate::error::GatewayError;

const SELECT_ENTRY: &str =
    "SELECT id, user_id, kind, amount_cents, meta, reference, created_at FROM transactions";

/// Appends an entry and returns its row id.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure,
/// including unique-index violations on deposit references.
pub async fn append(
    conn: &mut SqliteConnection,
    entry: &NewEntry,
    now: DateTime<Utc>,
) -> Result<i64, GatewayError> {
    try_append(conn, entry, now).await?.ok_or_else(|| {
        GatewayError::PersistenceError(format!(
            "duplicate {} entry for reference {:?}",
            entry.kind, entry.reference
        ))
    })
}

/// Appends an entry, returning `None` instead of failing when a unique
/// reference index rejects it.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on any other failure.
pub async fn try_append(
    conn: &mut SqliteConnection,
    entry: &NewEntry,
    now: DateTime<Utc>,
) -> Result<Option<i64>, GatewayError> {
    let result = sqlx::query(
        "INSERT INTO transactions (user_id, kind, amount_cents, meta, reference, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(entry.owner.user_id().map(uuid::Uuid::from))
    .bind(entry.kind.as_str())
    .bind(entry.amount.cents())
    .bind(&entry.meta)
    .bind(entry.reference.as_deref())
    .bind(now)
    .execute(conn)
    .await;

    match result {
        Ok(done) => Ok(Some(done.last_insert_rowid())),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Ok(None),
        Err(other) => Err(other.into()),
    }
}

/// Writes the `deposit` entry for the pending charge `reference`, copying
/// its owner and amount, and returns them.
///
/// Returns `None` when there is no pending charge with that reference or it
/// was already confirmed. The statement is a write even when it inserts
/// nothing, so the caller's transaction holds the write lock from here on.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn confirm_pending_deposit(
    conn: &mut SqliteConnection,
    reference: &str,
    meta: &str,
    now: DateTime<Utc>,
) -> Result<Option<(UserId, Money)>, GatewayError> {
    let rows: Vec<(uuid::Uuid, i64)> = sqlx::query_as(
        "INSERT OR IGNORE INTO transactions \
             (user_id, kind, amount_cents, meta, reference, created_at) \
         SELECT user_id, 'deposit', amount_cents, ?, reference, ? FROM transactions \
         WHERE kind = 'deposit_pending' AND reference = ? AND user_id IS NOT NULL \
         RETURNING user_id, amount_cents",
    )
    .bind(meta)
    .bind(now)
    .bind(reference)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .next()
        .map(|(user, cents)| (UserId::from(user), Money::from_cents(cents))))
}

/// Lists a user's entries newest first.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn list_for_user(
    conn: &mut SqliteConnection,
    user: UserId,
    limit: u32,
    offset: u32,
) -> Result<Vec<LedgerEntry>, GatewayError> {
    let rows = sqlx::query_as::<_, LedgerRow>(&format!(
        "{SELECT_ENTRY} WHERE user_id = ? ORDER BY id DESC LIMIT ? OFFSET ?"
    ))
    .bind(user.as_uuid())
    .bind(i64::from(limit))
    .bind(i64::from(offset))
    .fetch_all(conn)
    .await?;
    rows.into_iter().map(LedgerEntry::try_from).collect()
}

/// Counts a user's entries.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn count_for_user(conn: &mut SqliteConnection, user: UserId) -> Result<u64, GatewayError> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE user_id = ?")
        .bind(user.as_uuid())
        .fetch_one(conn)
        .await?;
    Ok(u64::try_from(n).unwrap_or(0))
}

/// Finds the entry of `kind` with exactly `reference`.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn find_by_reference(
    conn: &mut SqliteConnection,
    kind: EntryKind,
    reference: &str,
) -> Result<Option<LedgerEntry>, GatewayError> {
    let row = sqlx::query_as::<_, LedgerRow>(&format!(
        "{SELECT_ENTRY} WHERE kind = ? AND reference = ? ORDER BY id ASC LIMIT 1"
    ))
    .bind(kind.as_str())
    .bind(reference)
    .fetch_optional(conn)
    .await?;
    row.map(LedgerEntry::try_from).transpose()
}

/// Sums a user's balance-affecting entries.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn balance_total(conn: &mut SqliteConnection, user: UserId) -> Result<Money, GatewayError> {
    let sums: Vec<(String, i64)> = sqlx::query_as(
        "SELECT kind, COALESCE(SUM(amount_cents), 0) FROM transactions \
         WHERE user_id = ? GROUP BY kind",
    )
    .bind(user.as_uuid())
    .fetch_all(conn)
    .await?;

    let mut total = Money::ZERO;
    for (kind, cents) in sums {
        if kind.parse::<EntryKind>()?.affects_balance() {
            total = total.checked_add(Money::from_cents(cents))?;
        }
    }
    Ok(total)
}

/// Sums the platform account's entries.
///
/// # Errors
///
/// Returns a [`GatewayError::PersistenceError`] on database failure.
pub async fn platform_total(conn: &mut SqliteConnection) -> Result<Money, GatewayError> {
    let cents: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM transactions WHERE user_id IS NULL",
    )
    .fetch_one(conn)
    .await?;
    Ok(Money::from_cents(cents))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{LedgerOwner, User};
    use crate::persistence::{Database, users};

    async fn seed(conn: &mut SqliteConnection) -> UserId {
        let user = User {
            id: UserId::new(),
            username: "dani".to_string(),
            balance: Money::ZERO,
            created_at: Utc::now(),
        };
        if users::insert(conn, &user).await.is_err() {
            panic!("seed failed");
        }
        user.id
    }

    #[tokio::test]
    async fn append_and_list_newest_first() {
        let Ok(db) = Database::in_memory().await else {
            panic!("db");
        };
        let Ok(mut conn) = db.acquire().await else {
            panic!("conn");
        };
        let user = seed(&mut conn).await;
        let owner = LedgerOwner::User(user);

        let first = NewEntry::new(owner, EntryKind::Deposit, Money::from_cents(5_000), "a");
        let second = NewEntry::new(owner, EntryKind::Stake, Money::from_cents(-1_000), "b");
        assert!(append(&mut conn, &first, Utc::now()).await.is_ok());
        assert!(append(&mut conn, &second, Utc::now()).await.is_ok());

        let Ok(entries) = list_for_user(&mut conn, user, 10, 0).await else {
            panic!("list failed");
        };
        let kinds: Vec<EntryKind> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntryKind::Stake, EntryKind::Deposit]);
        assert_eq!(count_for_user(&mut conn, user).await.ok(), Some(2));
    }

    #[tokio::test]
    async fn balance_total_skips_pending_deposits() {
        let Ok(db) = Database::in_memory().await else {
            panic!("db");
        };
        let Ok(mut conn) = db.acquire().await else {
            panic!("conn");
        };
        let user = seed(&mut conn).await;
        let owner = LedgerOwner::User(user);
        let entries = [
            NewEntry::new(owner, EntryKind::DepositPending, Money::from_cents(5_000), "")
                .with_reference("ch_1"),
            NewEntry::new(owner, EntryKind::Deposit, Money::from_cents(5_000), "")
                .with_reference("ch_1"),
            NewEntry::new(owner, EntryKind::WithdrawRequest, Money::from_cents(-1_000), ""),
            NewEntry::new(owner, EntryKind::WithdrawFee, Money::from_cents(-30), ""),
            NewEntry::new(LedgerOwner::Platform, EntryKind::PlatformWithdrawFee, Money::from_cents(30), ""),
        ];
        for entry in &entries {
            assert!(append(&mut conn, entry, Utc::now()).await.is_ok());
        }

        assert_eq!(balance_total(&mut conn, user).await.ok(), Some(Money::from_cents(3_970)));
        assert_eq!(platform_total(&mut conn).await.ok(), Some(Money::from_cents(30)));
    }

    #[tokio::test]
    async fn deposit_reference_is_unique() {
        let Ok(db) = Database::in_memory().await else {
            panic!("db");
        };
        let Ok(mut conn) = db.acquire().await else {
            panic!("conn");
        };
        let user = seed(&mut conn).await;
        let deposit = NewEntry::new(LedgerOwner::User(user), EntryKind::Deposit, Money::from_cents(100), "")
            .with_reference("ch_dup");
        assert!(append(&mut conn, &deposit, Utc::now()).await.is_ok());

        let Err(GatewayError::PersistenceError(_)) = append(&mut conn, &deposit, Utc::now()).await else {
            panic!("duplicate deposit accepted");
        };
        assert_eq!(try_append(&mut conn, &deposit, Utc::now()).await.ok(), Some(None));

        let Ok(Some(found)) = find_by_reference(&mut conn, EntryKind::Deposit, "ch_dup").await else {
            panic!("deposit not found");
        };
        assert_eq!(found.amount, Money::from_cents(100));
    }

    #[tokio::test]
    async fn confirm_pending_deposit_copies_owner_and_amount_once() {
        let Ok(db) = Database::in_memory().await else {
            panic!("db");
        };
        let Ok(mut conn) = db.acquire().await else {
            panic!("conn");
        };
        let user = seed(&mut conn).await;
        let pending = NewEntry::new(
            LedgerOwner::User(user),
            EntryKind::DepositPending,
            Money::from_cents(2_500),
            "{}",
        )
        .with_reference("ch_9");
        assert!(append(&mut conn, &pending, Utc::now()).await.is_ok());

        let first = confirm_pending_deposit(&mut conn, "ch_9", "pix_confirmed:ch_9", Utc::now()).await;
        assert_eq!(first.ok(), Some(Some((user, Money::from_cents(2_500)))));

        let again = confirm_pending_deposit(&mut conn, "ch_9", "pix_confirmed:ch_9", Utc::now()).await;
        assert_eq!(again.ok(), Some(None));
        let unknown = confirm_pending_deposit(&mut conn, "ch_x", "pix_confirmed:ch_x", Utc::now()).await;
        assert_eq!(unknown.ok(), Some(None));

        let Ok(Some(deposit)) = find_by_reference(&mut conn, EntryKind::Deposit, "ch_9").await else {
            panic!("deposit not written");
        };
        assert_eq!(deposit.meta, "pix_confirmed:ch_9");
        assert_eq!(balance_total(&mut conn, user).await.ok(), Some(Money::from_cents(2_500)));
    }
}
