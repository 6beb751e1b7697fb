//! Service layer: business logic orchestration.
//!
//! Each service owns a [`crate::persistence::Database`] handle and runs
//! every multi-step mutation inside one SQL transaction. [`RoomService`]
//! additionally emits events through the [`super::domain::EventBus`] after
//! a successful commit.

pub mod auth_service;
pub mod deposit_service;
pub mod room_service;
pub mod wallet_service;

pub use auth_service::{AuthService, Session};
pub use deposit_service::{DepositOutcome, DepositService};
pub use room_service::RoomService;
pub use wallet_service::WalletService;

/// One page of a listing plus the unpaginated total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Number of items across all pages.
    pub total: u64,
}
