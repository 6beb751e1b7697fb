//! Domain layer: money, identities, rooms, ledger, and the event system.
//!
//! Everything here is storage-agnostic. The persistence layer maps rows
//! into these types and the service layer enforces the room state machine
//! and fee arithmetic defined here.

pub mod event_bus;
pub mod ids;
pub mod ledger;
pub mod money;
pub mod room;
pub mod room_event;
pub mod user;

pub use event_bus::{EventBus, RoomSubscriber};
pub use ids::{RoomId, UserId};
pub use ledger::{EntryKind, LedgerEntry, LedgerOwner, NewEntry, WithdrawalQuote};
pub use money::{Money, MoneyError};
pub use room::{Room, RoomRules, RoomStatus, Settlement};
pub use room_event::RoomEvent;
pub use user::{BalanceAudit, User};
