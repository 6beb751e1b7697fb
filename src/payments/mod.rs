//! Payment provider integration.
//!
//! [`PaymentProvider`] is the seam between the deposit flow and the Pix
//! acquirer. [`PixupClient`] talks to the real PixUp API; tests and local
//! development substitute their own implementation.

pub mod pixup;
pub mod webhook;

use futures_util::future::BoxFuture;
use serde::Serialize;

use crate::domain::Money;
use crate::error::GatewayError;

pub use pixup::PixupClient;
pub use webhook::WebhookNotice;

/// A request to open a Pix charge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeRequest {
    /// Amount the payer must send.
    pub amount: Money,
    /// Description shown to the payer.
    pub description: String,
    /// URL the provider notifies once the charge is paid.
    pub callback_url: String,
}

/// The provider's answer to a [`ChargeRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeReceipt {
    /// Provider charge identifier, echoed back by the webhook.
    pub charge_id: String,
    /// Raw provider response (QR code, copy-paste key, expiry, ...).
    pub raw: serde_json::Value,
}

impl ChargeReceipt {
    /// Builds a receipt from a raw provider response, reading the charge id
    /// from `id` or `charge_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PaymentProvider`] if neither field holds a
    /// string or number.
    pub fn from_raw(raw: serde_json::Value) -> Result<Self, GatewayError> {
        let charge_id = ["id", "charge_id"]
            .iter()
            .find_map(|key| scalar_to_string(raw.get(*key)?))
            .ok_or_else(|| {
                GatewayError::PaymentProvider("charge response has no id".to_string())
            })?;
        Ok(Self { charge_id, raw })
    }
}

/// A Pix acquirer able to open charges.
///
/// Implementations must be shareable across request handlers.
pub trait PaymentProvider: std::fmt::Debug + Send + Sync {
    /// Opens a charge and returns the provider's receipt.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::PaymentNotConfigured`] if credentials are missing.
    /// - [`GatewayError::PaymentProvider`] if the provider rejects the call.
    fn create_charge<'a>(
        &'a self,
        request: &'a ChargeRequest,
    ) -> BoxFuture<'a, Result<ChargeReceipt, GatewayError>>;
}

/// Renders a JSON string or number as an identifier.
pub(crate) fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
