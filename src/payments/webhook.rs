//! Parsing of PixUp payment notifications.

use super::scalar_to_string;

/// The parts of a provider notification the deposit flow acts on.
///
/// PixUp nests the charge under `resource` in some deliveries and sends it
/// flat in others; both shapes are accepted, with `resource` taking
/// precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookNotice {
    /// Charge the notification refers to.
    pub charge_id: Option<String>,
    /// Reported charge status, lowercased.
    pub status: Option<String>,
}

impl WebhookNotice {
    /// Extracts the charge id and status from a raw payload.
    #[must_use]
    pub fn from_payload(payload: &serde_json::Value) -> Self {
        let resource = payload.get("resource");
        let charge_id = resource
            .and_then(|r| r.get("charge_id"))
            .and_then(scalar_to_string)
            .or_else(|| payload.get("id").and_then(scalar_to_string));
        let status = resource
            .and_then(|r| r.get("status"))
            .and_then(|s| s.as_str())
            .or_else(|| payload.get("status").and_then(|s| s.as_str()))
            .map(str::to_ascii_lowercase);
        Self { charge_id, status }
    }

    /// Returns `true` if the status marks the charge as settled.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        matches!(self.status.as_deref(), Some("paid" | "confirmed"))
    }
}
