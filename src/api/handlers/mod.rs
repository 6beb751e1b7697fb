//! REST endpoint handlers organized by resource.

pub mod account;
pub mod payment;
pub mod room;
pub mod system;
pub mod wallet;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(account::routes())
        .merge(room::routes())
        .merge(wallet::routes())
        .merge(payment::routes())
}
