//! Room handlers: create, list, get, join, and result.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::AuthUser;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::dto::{
    CreateRoomRequest, ReportResultRequest, RoomDto, RoomListParams, RoomListResponse,
    RoomResponse,
};
use crate::app_state::AppState;
use crate::domain::RoomId;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /rooms` — Open a room and reserve the host's stake.
///
/// # Errors
///
/// Returns [`GatewayError`] on an invalid stake or insufficient balance.
#[utoipa::path(
    post,
    path = "/api/rooms",
    tag = "Rooms",
    summary = "Create a room",
    description = "Debits the stake from the caller and opens a room in the `waiting` state.",
    security(("bearer" = [])),
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = RoomResponse),
        (status = 400, description = "Stake invalid or below the minimum", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 422, description = "Insufficient balance", body = ErrorResponse),
    )
)]
pub async fn create_room(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CreateRoomRequest>,
) -> Result<Json<RoomResponse>, GatewayError> {
    let room = state.rooms.create_room(auth.user.id, req.stake).await?;
    Ok(Json(room.into()))
}

/// `GET /rooms` — List rooms with pagination and optional status filter.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/rooms",
    tag = "Rooms",
    summary = "List rooms",
    description = "Returns rooms newest first. Filter with `status=waiting` to find open tables.",
    params(RoomListParams),
    responses(
        (status = 200, description = "Paginated room list", body = RoomListResponse),
    )
)]
pub async fn list_rooms(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<RoomListParams>,
) -> Result<Json<RoomListResponse>, GatewayError> {
    let page = params.pagination();
    let rooms = state
        .rooms
        .list_rooms(params.status, page.per_page, page.offset())
        .await?;

    Ok(Json(RoomListResponse {
        rooms: rooms.items.into_iter().map(RoomDto::from).collect(),
        pagination: page.meta(rooms.total),
    }))
}

/// `GET /rooms/{id}` — Room details.
///
/// # Errors
///
/// Returns [`GatewayError`] if the room does not exist.
#[utoipa::path(
    get,
    path = "/api/rooms/{id}",
    tag = "Rooms",
    summary = "Get a room",
    params(
        ("id" = uuid::Uuid, Path, description = "Room UUID"),
    ),
    responses(
        (status = 200, description = "Room details", body = RoomResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
    )
)]
pub async fn get_room(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<Json<RoomResponse>, GatewayError> {
    let room = state.rooms.get_room(RoomId::from_uuid(id)).await?;
    Ok(Json(room.into()))
}

/// `POST /rooms/{id}/join` — Reserve the guest's stake and start the match.
///
/// # Errors
///
/// Returns [`GatewayError`] if the room is missing, unavailable, owned by
/// the caller, or the caller cannot cover the stake.
#[utoipa::path(
    post,
    path = "/api/rooms/{id}/join",
    tag = "Rooms",
    summary = "Join a room",
    description = "Debits the stake from the caller, moves the room to `playing`, and broadcasts `room_started`.",
    security(("bearer" = [])),
    params(
        ("id" = uuid::Uuid, Path, description = "Room UUID"),
    ),
    responses(
        (status = 200, description = "Room joined", body = RoomResponse),
        (status = 400, description = "Cannot join your own room", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
        (status = 409, description = "Room not available", body = ErrorResponse),
        (status = 422, description = "Insufficient balance", body = ErrorResponse),
    )
)]
pub async fn join_room(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<Json<RoomResponse>, GatewayError> {
    let room = state
        .rooms
        .join_room(RoomId::from_uuid(id), auth.user.id)
        .await?;
    Ok(Json(room.into()))
}

/// `POST /rooms/{id}/result` — Record the winner and pay out.
///
/// # Errors
///
/// Returns [`GatewayError`] if the room is not playing, the caller is not a
/// participant, or the winner is not a participant.
#[utoipa::path(
    post,
    path = "/api/rooms/{id}/result",
    tag = "Rooms",
    summary = "Report a result",
    description = "Credits the pot minus the platform fee to the winner, moves the room to `finished`, and broadcasts `room_finished`.",
    security(("bearer" = [])),
    params(
        ("id" = uuid::Uuid, Path, description = "Room UUID"),
    ),
    request_body = ReportResultRequest,
    responses(
        (status = 200, description = "Result recorded", body = RoomResponse),
        (status = 400, description = "Winner is not a participant", body = ErrorResponse),
        (status = 403, description = "Caller is not a participant", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
        (status = 409, description = "Room not playing", body = ErrorResponse),
    )
)]
pub async fn report_result(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<uuid::Uuid>,
    ApiJson(req): ApiJson<ReportResultRequest>,
) -> Result<Json<RoomResponse>, GatewayError> {
    let room = state
        .rooms
        .report_result(RoomId::from_uuid(id), auth.user.id, req.winner_id)
        .await?;
    Ok(Json(room.into()))
}

/// Room routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/{id}", get(get_room))
        .route("/rooms/{id}/join", post(join_room))
        .route("/rooms/{id}/result", post(report_result))
}
