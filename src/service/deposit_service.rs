//! Deposit service: Pix charge creation and webhook confirmation.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{EntryKind, LedgerOwner, Money, NewEntry, UserId};
use crate::error::GatewayError;
use crate::payments::{ChargeReceipt, ChargeRequest, PaymentProvider, WebhookNotice};
use crate::persistence::{Database, ledger, users};

/// Description used when the client does not send one.
pub const DEFAULT_CHARGE_DESCRIPTION: &str = "Depósito Desafio de Damas";

/// What a webhook delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositOutcome {
    /// The pending charge was credited to its owner.
    Credited {
        /// Credited user.
        user_id: UserId,
        /// Credited amount.
        amount: Money,
    },
    /// The charge had already been credited; nothing changed.
    AlreadyConfirmed,
    /// No pending charge carries this id.
    UnknownCharge,
    /// The notification is not a payment confirmation.
    Ignored,
}

/// Coordinates the payment provider and the ledger for deposits.
///
/// A deposit is two ledger entries sharing the provider's charge id as
/// `reference`: an informational `deposit_pending` written when the charge
/// is opened, and a balance-affecting `deposit` written when the webhook
/// confirms payment. Unique indexes on `(reference)` per kind make both
/// steps idempotent.
#[derive(Debug, Clone)]
pub struct DepositService {
    db: Database,
    provider: Arc<dyn PaymentProvider>,
    callback_url: String,
    webhook_secret: Option<String>,
}

impl DepositService {
    /// Creates a new `DepositService`.
    #[must_use]
    pub fn new(
        db: Database,
        provider: Arc<dyn PaymentProvider>,
        callback_url: impl Into<String>,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            db,
            provider,
            callback_url: callback_url.into(),
            webhook_secret,
        }
    }

    /// Opens a Pix charge for `user` and records it as pending.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] if `amount` is not positive.
    /// - [`GatewayError::PaymentNotConfigured`] / [`GatewayError::PaymentProvider`]
    ///   if the provider call fails.
    pub async fn create_charge(
        &self,
        user: UserId,
        amount: Money,
        description: Option<String>,
    ) -> Result<ChargeReceipt, GatewayError> {
        if !amount.is_positive() {
            return Err(GatewayError::InvalidRequest("invalid amount".to_string()));
        }
        let request = ChargeRequest {
            amount,
            description: description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CHARGE_DESCRIPTION.to_string()),
            callback_url: self.callback_url.clone(),
        };
        let receipt = self.provider.create_charge(&request).await?;

        let entry = NewEntry::new(
            LedgerOwner::User(user),
            EntryKind::DepositPending,
            amount,
            receipt.raw.to_string(),
        )
        .with_reference(receipt.charge_id.clone());
        let mut conn = self.db.acquire().await?;
        if ledger::try_append(&mut conn, &entry, Utc::now()).await?.is_none() {
            tracing::warn!(charge_id = %receipt.charge_id, "provider reused a charge id");
            return Err(GatewayError::PaymentProvider(format!(
                "duplicate charge id {}",
                receipt.charge_id
            )));
        }

        tracing::info!(%user, %amount, charge_id = %receipt.charge_id, "deposit pending");
        Ok(receipt)
    }

    /// Checks the shared secret sent with a webhook delivery.
    ///
    /// Always succeeds when no secret is configured.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unauthorized`] if the secret is missing or
    /// wrong.
    pub fn verify_webhook_secret(&self, presented: Option<&str>) -> Result<(), GatewayError> {
        match &self.webhook_secret {
            Some(expected) if presented != Some(expected.as_str()) => Err(
                GatewayError::Unauthorized("invalid webhook secret".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Applies a provider notification.
    ///
    /// Only `paid` / `confirmed` notifications for a known pending charge
    /// move money; every other delivery is acknowledged without effect.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn confirm(&self, notice: &WebhookNotice) -> Result<DepositOutcome, GatewayError> {
        let Some(charge_id) = notice.charge_id.as_deref() else {
            return Ok(DepositOutcome::Ignored);
        };
        if !notice.is_paid() {
            tracing::debug!(charge_id, status = ?notice.status, "webhook ignored");
            return Ok(DepositOutcome::Ignored);
        }

        // The insert runs first so the transaction takes the write lock
        // before it reads anything.
        let mut tx = self.db.begin().await?;
        let meta = format!("pix_confirmed:{charge_id}");
        let Some((user_id, amount)) =
            ledger::confirm_pending_deposit(&mut tx, charge_id, &meta, Utc::now()).await?
        else {
            let confirmed =
                ledger::find_by_reference(&mut tx, EntryKind::Deposit, charge_id).await?;
            return Ok(if confirmed.is_some() {
                tracing::info!(charge_id, "webhook redelivery ignored");
                DepositOutcome::AlreadyConfirmed
            } else {
                tracing::warn!(charge_id, "webhook for unknown charge");
                DepositOutcome::UnknownCharge
            });
        };
        users::credit(&mut tx, user_id, amount).await?;
        tx.commit().await?;

        tracing::info!(%user_id, %amount, charge_id, "deposit confirmed");
        Ok(DepositOutcome::Credited { user_id, amount })
    }
}
