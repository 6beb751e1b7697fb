//! # damas-gateway
//!
//! HTTP and WebSocket backend for staked two-player checkers matches.
//!
//! Players register, fund their wallet through Pix charges confirmed by a
//! payment-provider webhook, open or join rooms by reserving a stake, relay
//! moves in real time, and withdraw their balance minus a percentage fee.
//! The server does not referee the game: it guards who may join and report,
//! and it keeps the money consistent.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)          PixUp (HTTPS, webhook)
//!     │                                  │
//!     ├── REST Handlers (api/)  ◀────────┤
//!     ├── WS Handler (ws/)               │
//!     │                                  │
//!     ├── Auth / Room / Wallet / Deposit services (service/)
//!     ├── EventBus (domain/)    PaymentProvider (payments/)
//!     │
//!     └── SQLite persistence (persistence/): users, sessions, rooms, ledger
//! ```
//!
//! Every balance change and its ledger entries commit in one SQL
//! transaction; `GET /api/me/audit` compares the two.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod payments;
pub mod persistence;
pub mod service;
pub mod ws;
