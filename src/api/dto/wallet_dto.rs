//! Wallet DTOs: withdrawals, transaction history, and Pix charges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{EntryKind, LedgerEntry, Money, UserId, WithdrawalQuote};

/// Request body for `POST /withdraw`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WithdrawRequest {
    /// Principal to withdraw, as a number or decimal string.
    #[serde(default)]
    #[schema(value_type = String, example = "50.00")]
    pub amount: Money,
}

/// Response body for `POST /withdraw`.
#[derive(Debug, Serialize, ToSchema)]
pub struct WithdrawResponse {
    /// Always `true`.
    pub ok: bool,
    /// Requested principal.
    #[schema(value_type = String, example = "50.00")]
    pub amount: Money,
    /// Fee charged on top.
    #[schema(value_type = String, example = "1.50")]
    pub fee: Money,
    /// Total taken from the balance.
    #[schema(value_type = String, example = "51.50")]
    pub debited: Money,
}

impl From<WithdrawalQuote> for WithdrawResponse {
    fn from(quote: WithdrawalQuote) -> Self {
        Self {
            ok: true,
            amount: quote.amount,
            fee: quote.fee,
            debited: quote.debited,
        }
    }
}

/// A ledger entry as shown to its owner.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionDto {
    /// Monotonic entry id.
    pub id: i64,
    /// Owner; always the requesting user on this endpoint.
    pub user_id: Option<UserId>,
    /// Entry kind.
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Signed amount.
    #[schema(value_type = String, example = "-10.00")]
    pub amount: Money,
    /// Free-text description.
    pub meta: String,
    /// Room id or provider charge id.
    pub reference: Option<String>,
    /// Append timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntry> for TransactionDto {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.owner.user_id(),
            kind: entry.kind,
            amount: entry.amount,
            meta: entry.meta,
            reference: entry.reference,
            created_at: entry.created_at,
        }
    }
}

/// Paginated list response for `GET /transactions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionListResponse {
    /// Entries on this page, newest first.
    pub transactions: Vec<TransactionDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Request body for `POST /pix/create_charge`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateChargeRequest {
    /// Amount to deposit, as a number or decimal string.
    #[serde(default)]
    #[schema(value_type = String, example = "50.00")]
    pub amount: Money,
    /// Description shown to the payer.
    #[serde(default)]
    pub description: Option<String>,
}

/// Response body for `POST /pix/create_charge`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChargeResponse {
    /// Provider charge id.
    pub charge_id: String,
    /// Raw provider response (QR code, copy-paste key, ...).
    #[schema(value_type = Object)]
    pub charge: serde_json::Value,
}
