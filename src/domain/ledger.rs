//! Append-only transaction ledger.
//!
//! Every movement of money produces one or more [`LedgerEntry`] rows. Rows
//! are never updated or deleted; together with the balance column on the
//! user they form the dual bookkeeping that [`super::BalanceAudit`] checks.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Money, MoneyError, UserId};
use crate::error::GatewayError;

/// Kind of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Stake reserved when creating or joining a room (negative).
    Stake,
    /// Winnings credited when a room finishes (positive).
    Payout,
    /// Match fee retained by the platform (platform-owned, positive).
    PlatformFee,
    /// Withdrawn principal (negative).
    WithdrawRequest,
    /// Withdrawal fee charged to the user (negative).
    WithdrawFee,
    /// Withdrawal fee income (platform-owned, positive).
    PlatformWithdrawFee,
    /// Charge created at the payment provider, not yet paid (informational).
    DepositPending,
    /// Confirmed deposit credited to the wallet (positive).
    Deposit,
}

impl EntryKind {
    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stake => "stake",
            Self::Payout => "payout",
            Self::PlatformFee => "platform_fee",
            Self::WithdrawRequest => "withdraw_request",
            Self::WithdrawFee => "withdraw_fee",
            Self::PlatformWithdrawFee => "platform_withdraw_fee",
            Self::DepositPending => "deposit_pending",
            Self::Deposit => "deposit",
        }
    }

    /// Returns `true` if entries of this kind move a user's balance.
    #[must_use]
    pub const fn affects_balance(self) -> bool {
        matches!(
            self,
            Self::Stake | Self::Payout | Self::WithdrawRequest | Self::WithdrawFee | Self::Deposit
        )
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "stake" => Self::Stake,
            "payout" => Self::Payout,
            "platform_fee" => Self::PlatformFee,
            "withdraw_request" => Self::WithdrawRequest,
            "withdraw_fee" => Self::WithdrawFee,
            "platform_withdraw_fee" => Self::PlatformWithdrawFee,
            "deposit_pending" => Self::DepositPending,
            "deposit" => Self::Deposit,
            other => {
                return Err(GatewayError::Internal(format!(
                    "unknown ledger kind: {other}"
                )));
            }
        })
    }
}

/// Owner of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerOwner {
    /// A registered user.
    User(UserId),
    /// The platform's own revenue account.
    Platform,
}

impl LedgerOwner {
    /// Returns the user id, or `None` for the platform.
    #[must_use]
    pub const fn user_id(self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(id),
            Self::Platform => None,
        }
    }
}

impl From<Option<UserId>> for LedgerOwner {
    fn from(id: Option<UserId>) -> Self {
        id.map_or(Self::Platform, Self::User)
    }
}

/// A ledger entry about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    /// Account the entry belongs to.
    pub owner: LedgerOwner,
    /// Entry kind.
    pub kind: EntryKind,
    /// Signed amount.
    pub amount: Money,
    /// Free-text description.
    pub meta: String,
    /// Structured correlation key: a room id or a provider charge id.
    pub reference: Option<String>,
}

impl NewEntry {
    /// Creates an entry without a reference.
    #[must_use]
    pub fn new(owner: LedgerOwner, kind: EntryKind, amount: Money, meta: impl Into<String>) -> Self {
        Self {
            owner,
            kind,
            amount,
            meta: meta.into(),
            reference: None,
        }
    }

    /// Attaches a structured reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// A persisted ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    /// Monotonic row id.
    pub id: i64,
    /// Account the entry belongs to.
    pub owner: LedgerOwner,
    /// Entry kind.
    pub kind: EntryKind,
    /// Signed amount.
    pub amount: Money,
    /// Free-text description.
    pub meta: String,
    /// Structured correlation key.
    pub reference: Option<String>,
    /// Append timestamp.
    pub created_at: DateTime<Utc>,
}

/// Fee breakdown for a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WithdrawalQuote {
    /// Principal requested by the user.
    pub amount: Money,
    /// Platform fee charged on top.
    pub fee: Money,
    /// Total taken from the balance (`amount + fee`).
    pub debited: Money,
}

impl WithdrawalQuote {
    /// Computes the fee (`fee_bps` of `amount`, rounded to the centavo) and
    /// the total debit.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] on arithmetic overflow.
    pub fn compute(amount: Money, fee_bps: u32) -> Result<Self, MoneyError> {
        let fee = amount.percent_bps(fee_bps)?.max(Money::ZERO);
        let debited = amount.checked_add(fee)?;
        Ok(Self {
            amount,
            fee,
            debited,
        })
    }
}
