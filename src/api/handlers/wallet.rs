//! Wallet handlers: transaction history and withdrawals.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::AuthUser;
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::dto::{
    PaginationParams, TransactionDto, TransactionListResponse, WithdrawRequest, WithdrawResponse,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /transactions` — The caller's ledger, newest first.
///
/// # Errors
///
/// Returns [`GatewayError`] if the token is invalid.
#[utoipa::path(
    get,
    path = "/api/transactions",
    tag = "Wallet",
    summary = "List transactions",
    security(("bearer" = [])),
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated ledger", body = TransactionListResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> Result<Json<TransactionListResponse>, GatewayError> {
    let params = params.clamped();
    let page = state
        .wallet
        .transactions(auth.user.id, params.per_page, params.offset())
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: page.items.into_iter().map(TransactionDto::from).collect(),
        pagination: params.meta(page.total),
    }))
}

/// `POST /withdraw` — Request a withdrawal.
///
/// # Errors
///
/// Returns [`GatewayError`] on an invalid amount or if the balance does not
/// cover the amount plus fee.
#[utoipa::path(
    post,
    path = "/api/withdraw",
    tag = "Wallet",
    summary = "Withdraw",
    description = "Debits the amount plus a percentage fee and records the request. No funds are sent by this endpoint.",
    security(("bearer" = [])),
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Withdrawal recorded", body = WithdrawResponse),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 422, description = "Insufficient balance including fees", body = ErrorResponse),
    )
)]
pub async fn withdraw(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<WithdrawRequest>,
) -> Result<Json<WithdrawResponse>, GatewayError> {
    let quote = state.wallet.withdraw(auth.user.id, req.amount).await?;
    Ok(Json(quote.into()))
}

/// Wallet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions))
        .route("/withdraw", post(withdraw))
}
