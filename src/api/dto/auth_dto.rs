//! Account DTOs: register, login, profile, and audit.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::UserDto;
use crate::domain::{BalanceAudit, Money};

/// Request body for `POST /register` and `POST /login`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    /// Login name (1–32 characters after trimming).
    #[serde(default)]
    pub username: String,
}

/// Response body for `POST /register` and `POST /login`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// The authenticated account.
    pub user: UserDto,
    /// Bearer token for the `Authorization` header.
    pub token: String,
}

/// Response body for `GET /me`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    /// The authenticated account.
    pub user: UserDto,
}

/// Response body for `GET /me/audit`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditResponse {
    /// Stored balance.
    #[schema(value_type = String)]
    pub balance: Money,
    /// Sum of balance-affecting ledger entries.
    #[schema(value_type = String)]
    pub ledger_total: Money,
    /// Whether the two agree.
    pub consistent: bool,
}

impl From<BalanceAudit> for AuditResponse {
    fn from(audit: BalanceAudit) -> Self {
        Self {
            balance: audit.balance,
            ledger_total: audit.ledger_total,
            consistent: audit.is_consistent(),
        }
    }
}

/// Generic acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct OkResponse {
    /// Always `true`.
    pub ok: bool,
}
