//! Pix handlers: charge creation and provider webhook.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::auth::AuthUser;
use crate::api::extract::ApiJson;
use crate::api::dto::{ChargeResponse, CreateChargeRequest};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};
use crate::payments::WebhookNotice;

/// Header carrying the shared webhook secret.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// `POST /pix/create_charge` — Open a Pix charge for a deposit.
///
/// # Errors
///
/// Returns [`GatewayError`] on an invalid amount or a provider failure.
#[utoipa::path(
    post,
    path = "/api/pix/create_charge",
    tag = "Payments",
    summary = "Create a Pix charge",
    description = "Opens a charge at the payment provider and records it as a pending deposit. The balance is credited when the provider's webhook confirms payment.",
    security(("bearer" = [])),
    request_body = CreateChargeRequest,
    responses(
        (status = 200, description = "Charge opened", body = ChargeResponse),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 502, description = "Provider rejected the charge", body = ErrorResponse),
        (status = 503, description = "Provider credentials not configured", body = ErrorResponse),
    )
)]
pub async fn create_charge(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CreateChargeRequest>,
) -> Result<Json<ChargeResponse>, GatewayError> {
    let receipt = state
        .deposits
        .create_charge(auth.user.id, req.amount, req.description)
        .await?;
    Ok(Json(ChargeResponse {
        charge_id: receipt.charge_id,
        charge: receipt.raw,
    }))
}

/// `POST /pixup/webhook` — Payment notification from the provider.
///
/// Replies `ok` to every well-formed delivery, including ones that change
/// nothing, so the provider stops retrying.
///
/// # Errors
///
/// Returns [`GatewayError`] if the shared secret is wrong or the ledger
/// cannot be updated.
#[utoipa::path(
    post,
    path = "/api/pixup/webhook",
    tag = "Payments",
    summary = "Provider webhook",
    description = "Credits the pending deposit whose charge id matches the notification. Redeliveries are idempotent.",
    params(
        ("x-webhook-secret" = Option<String>, Header, description = "Shared secret, required when configured"),
    ),
    request_body(content = serde_json::Value, description = "Provider notification"),
    responses(
        (status = 200, description = "Notification processed", body = String),
        (status = 401, description = "Invalid webhook secret", body = ErrorResponse),
    )
)]
pub async fn pixup_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<serde_json::Value>,
) -> Result<&'static str, GatewayError> {
    let presented = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    state.deposits.verify_webhook_secret(presented)?;

    let notice = WebhookNotice::from_payload(&payload);
    let outcome = state.deposits.confirm(&notice).await?;
    tracing::debug!(?outcome, charge_id = ?notice.charge_id, "webhook processed");
    Ok("ok")
}

/// Payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pix/create_charge", post(create_charge))
        .route("/pixup/webhook", post(pixup_webhook))
}
