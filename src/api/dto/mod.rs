//! Data Transfer Objects for REST request/response serialization.
//!
//! All monetary amounts are serialized as decimal strings (`"10.00"`) and
//! accepted as either strings or JSON numbers.

pub mod auth_dto;
pub mod common_dto;
pub mod room_dto;
pub mod wallet_dto;

pub use auth_dto::*;
pub use common_dto::*;
pub use room_dto::*;
pub use wallet_dto::*;
