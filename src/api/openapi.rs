//! OpenAPI document for the REST surface.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{
    AuditResponse, ChargeResponse, CreateChargeRequest, CreateRoomRequest, CredentialsRequest,
    MeResponse, OkResponse, PaginationMeta, ReportResultRequest, RoomDto, RoomListResponse,
    RoomResponse, SessionResponse, TransactionDto, TransactionListResponse, UserDto,
    WithdrawRequest, WithdrawResponse,
};
use super::handlers::{account, payment, room, system, wallet};
use crate::domain::{EntryKind, RoomId, RoomStatus, UserId};
use crate::error::{ErrorBody, ErrorResponse};

/// Aggregated OpenAPI specification.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "damas-gateway",
        description = "Staked checkers rooms, Pix deposits, and withdrawals."
    ),
    paths(
        account::register,
        account::login,
        account::logout,
        account::me,
        account::audit,
        room::create_room,
        room::list_rooms,
        room::get_room,
        room::join_room,
        room::report_result,
        wallet::list_transactions,
        wallet::withdraw,
        payment::create_charge,
        payment::pixup_webhook,
        system::health_handler,
    ),
    components(schemas(
        AuditResponse,
        ChargeResponse,
        CreateChargeRequest,
        CreateRoomRequest,
        CredentialsRequest,
        EntryKind,
        ErrorBody,
        ErrorResponse,
        MeResponse,
        OkResponse,
        PaginationMeta,
        ReportResultRequest,
        RoomDto,
        RoomId,
        RoomListResponse,
        RoomResponse,
        RoomStatus,
        SessionResponse,
        TransactionDto,
        TransactionListResponse,
        UserDto,
        UserId,
        WithdrawRequest,
        WithdrawResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Accounts", description = "Registration and sessions"),
        (name = "Rooms", description = "Staked matches"),
        (name = "Wallet", description = "Ledger and withdrawals"),
        (name = "Payments", description = "Pix deposits"),
        (name = "System", description = "Operational endpoints"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by protected paths.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}
