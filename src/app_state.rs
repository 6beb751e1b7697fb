//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::EventBus;
use crate::payments::PaymentProvider;
use crate::persistence::Database;
use crate::service::{AuthService, DepositService, RoomService, WalletService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Registration, login, and session lookup.
    pub auth: Arc<AuthService>,
    /// Room lifecycle and move relay.
    pub rooms: Arc<RoomService>,
    /// Withdrawals, history, and audit.
    pub wallet: Arc<WalletService>,
    /// Pix charges and webhook confirmation.
    pub deposits: Arc<DepositService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires every service to `db` using the settings in `config`.
    #[must_use]
    pub fn new(config: &AppConfig, db: Database, payments: Arc<dyn PaymentProvider>) -> Self {
        let event_bus = EventBus::new(config.event_bus_capacity);
        Self {
            auth: Arc::new(AuthService::new(
                db.clone(),
                config.session_secret.clone(),
                config.session_ttl_hours,
            )),
            rooms: Arc::new(RoomService::new(
                db.clone(),
                event_bus.clone(),
                config.room_rules,
            )),
            wallet: Arc::new(WalletService::new(db.clone(), config.withdraw_fee_bps)),
            deposits: Arc::new(DepositService::new(
                db,
                payments,
                config.webhook_callback_url(),
                config.pixup_webhook_secret.clone(),
            )),
            event_bus,
        }
    }
}
