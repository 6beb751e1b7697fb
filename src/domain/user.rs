//! Registered players and their wallet balance.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Money, UserId};

/// A registered player.
///
/// `balance` is the spendable wallet amount. It is mutated together with
/// the ledger inside one SQL transaction, so it should always equal the sum
/// of the user's balance-affecting ledger entries (see [`BalanceAudit`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Spendable balance.
    pub balance: Money,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Comparison between the stored balance and the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceAudit {
    /// Balance column on the user row.
    pub balance: Money,
    /// Sum of every balance-affecting ledger entry for the user.
    pub ledger_total: Money,
}

impl BalanceAudit {
    /// Returns `true` if the balance and the ledger agree.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.balance == self.ledger_total
    }
}

/// Validates and normalizes a username.
///
/// Leading and trailing whitespace is removed; the result must be between
/// 1 and 32 characters.
#[must_use]
pub fn normalize_username(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    (1..=32).contains(&len).then_some(trimmed)
}
