//! Room DTOs for create, join, result, get, and list operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::{PaginationMeta, PaginationParams};
use crate::domain::{Money, Room, RoomId, RoomStatus, UserId};

/// Request body for `POST /rooms`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoomRequest {
    /// Stake each player reserves, as a number or decimal string.
    #[serde(default)]
    #[schema(value_type = String, example = "10.00")]
    pub stake: Money,
}

/// Request body for `POST /rooms/{id}/result`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportResultRequest {
    /// Declared winner; must be the host or the guest.
    #[serde(alias = "winnerId")]
    pub winner_id: UserId,
}

/// Room representation returned by every room endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomDto {
    /// Room identifier.
    pub id: RoomId,
    /// Host user.
    pub host_id: UserId,
    /// Guest user, once joined.
    pub guest_id: Option<UserId>,
    /// Stake per player.
    #[schema(value_type = String, example = "10.00")]
    pub stake: Money,
    /// Lifecycle state.
    pub status: RoomStatus,
    /// Winner, once finished.
    pub winner_id: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last transition timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Room> for RoomDto {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            host_id: room.host_id,
            guest_id: room.guest_id,
            stake: room.stake,
            status: room.status,
            winner_id: room.winner_id,
            created_at: room.created_at,
            updated_at: room.updated_at,
        }
    }
}

/// Single-room envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomResponse {
    /// The room.
    pub room: RoomDto,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        Self { room: room.into() }
    }
}

/// Query parameters for `GET /rooms`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoomListParams {
    /// Only return rooms in this state.
    #[serde(default)]
    pub status: Option<RoomStatus>,
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default)]
    pub page: Option<u32>,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl RoomListParams {
    /// Returns the clamped pagination part.
    #[must_use]
    pub fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
        .clamped()
    }
}

/// Paginated list response for `GET /rooms`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomListResponse {
    /// Rooms on this page, newest first.
    pub rooms: Vec<RoomDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
