//! Account handlers: register, login, logout, profile, and audit.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::AuthUser;
use crate::api::extract::ApiJson;
use crate::api::dto::{AuditResponse, CredentialsRequest, MeResponse, OkResponse, SessionResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};
use crate::service::Session;

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            user: session.user.into(),
            token: session.token,
        }
    }
}

/// `POST /register` — Create an account and open a session.
///
/// # Errors
///
/// Returns [`GatewayError`] on a blank or duplicate username.
#[utoipa::path(
    post,
    path = "/api/register",
    tag = "Accounts",
    summary = "Register",
    description = "Creates an account with a zero balance and returns a bearer token.",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Account created", body = SessionResponse),
        (status = 400, description = "Username missing or too long", body = ErrorResponse),
        (status = 409, description = "Username already exists", body = ErrorResponse),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> Result<Json<SessionResponse>, GatewayError> {
    let session = state.auth.register(&req.username).await?;
    Ok(Json(session.into()))
}

/// `POST /login` — Open a session for an existing account.
///
/// # Errors
///
/// Returns [`GatewayError`] if the username is unknown.
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Accounts",
    summary = "Log in",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Session opened", body = SessionResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> Result<Json<SessionResponse>, GatewayError> {
    let session = state.auth.login(&req.username).await?;
    Ok(Json(session.into()))
}

/// `POST /logout` — Revoke the current session.
///
/// # Errors
///
/// Returns [`GatewayError`] if the token is invalid.
#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "Accounts",
    summary = "Log out",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Session revoked", body = OkResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<OkResponse>, GatewayError> {
    state.auth.logout(&auth.token).await?;
    Ok(Json(OkResponse { ok: true }))
}

/// `GET /me` — Current account.
///
/// # Errors
///
/// Returns [`GatewayError`] if the token is invalid.
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Accounts",
    summary = "Current user",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current account", body = MeResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn me(auth: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: auth.user.into(),
    })
}

/// `GET /me/audit` — Compare the balance with the ledger.
///
/// # Errors
///
/// Returns [`GatewayError`] if the token is invalid.
#[utoipa::path(
    get,
    path = "/api/me/audit",
    tag = "Accounts",
    summary = "Balance audit",
    description = "Returns the stored balance next to the sum of the user's balance-affecting ledger entries.",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Audit result", body = AuditResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn audit(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<AuditResponse>, GatewayError> {
    let audit = state.wallet.audit(auth.user.id).await?;
    Ok(Json(audit.into()))
}

/// Account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/me/audit", get(audit))
}
