//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Money, MoneyError, RoomId, UserId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "insufficient balance, deposit first",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see the table on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                    |
/// |-----------|-------------------|--------------------------------|
/// | 1000–1099 | Validation        | 400 Bad Request                |
/// | 1100–1199 | Authentication    | 401 Unauthorized / 403 Forbidden |
/// | 2000–2999 | State/Not Found   | 404 Not Found / 409 Conflict   |
/// | 3000–3999 | Server            | 500 Internal Server Error      |
/// | 4000–4999 | Funds             | 422 Unprocessable Entity       |
/// | 5000–5999 | Payment provider  | 502 Bad Gateway / 503 Unavailable |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An amount could not be parsed or combined.
    #[error(transparent)]
    InvalidAmount(#[from] MoneyError),

    /// Stake is below the configured room minimum.
    #[error("minimum stake is R$ {minimum}")]
    StakeBelowMinimum {
        /// Configured minimum stake.
        minimum: Money,
    },

    /// A host tried to join the room they created.
    #[error("cannot join your own room")]
    CannotJoinOwnRoom,

    /// The declared winner is not one of the two players.
    #[error("winner {0} is not a participant")]
    InvalidWinner(UserId),

    /// Missing, unknown, or expired session token.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated caller may not perform this action.
    #[error("{0}")]
    Forbidden(String),

    /// No user with the given identity.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Room with the given ID was not found.
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    /// Registration with a username that already exists.
    #[error("username already exists: {0}")]
    UsernameTaken(String),

    /// Room is no longer waiting for a guest.
    #[error("room not available: {0}")]
    RoomUnavailable(RoomId),

    /// Room is not in the `playing` state.
    #[error("room not playing: {0}")]
    RoomNotPlaying(RoomId),

    /// Balance does not cover the requested debit.
    #[error("{0}")]
    InsufficientBalance(String),

    /// The payment provider rejected or failed a request.
    #[error("payment provider error: {0}")]
    PaymentProvider(String),

    /// Payment provider credentials are not configured.
    #[error("payment provider credentials not configured")]
    PaymentNotConfigured,

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidAmount(_) => 1002,
            Self::StakeBelowMinimum { .. } => 1003,
            Self::CannotJoinOwnRoom => 1004,
            Self::InvalidWinner(_) => 1005,
            Self::Unauthorized(_) => 1101,
            Self::Forbidden(_) => 1102,
            Self::UserNotFound(_) => 2001,
            Self::RoomNotFound(_) => 2002,
            Self::UsernameTaken(_) => 2003,
            Self::RoomUnavailable(_) => 2004,
            Self::RoomNotPlaying(_) => 2005,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::InsufficientBalance(_) => 4001,
            Self::PaymentProvider(_) => 5001,
            Self::PaymentNotConfigured => 5002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidAmount(_)
            | Self::StakeBelowMinimum { .. }
            | Self::CannotJoinOwnRoom
            | Self::InvalidWinner(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::UserNotFound(_) | Self::RoomNotFound(_) => StatusCode::NOT_FOUND,
            Self::UsernameTaken(_) | Self::RoomUnavailable(_) | Self::RoomNotPlaying(_) => {
                StatusCode::CONFLICT
            }
            Self::InsufficientBalance(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PaymentProvider(_) => StatusCode::BAD_GATEWAY,
            Self::PaymentNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for GatewayError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for GatewayError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            GatewayError::CannotJoinOwnRoom.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::Forbidden("not a participant".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GatewayError::RoomUnavailable(RoomId::new()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            GatewayError::InsufficientBalance(String::new()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            GatewayError::PaymentNotConfigured.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn minimum_stake_message_uses_currency_format() {
        let err = GatewayError::StakeBelowMinimum {
            minimum: Money::from_cents(1000),
        };
        assert_eq!(err.to_string(), "minimum stake is R$ 10.00");
    }

    #[test]
    fn money_errors_are_bad_requests() {
        let err = GatewayError::from(MoneyError::Overflow);
        assert_eq!(err.error_code(), 1002);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn sqlx_errors_become_persistence_errors() {
        let err = GatewayError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, GatewayError::PersistenceError(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
