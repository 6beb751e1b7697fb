//! Wallet service: withdrawals, transaction history, and balance audit.

use chrono::Utc;

use super::Page;
use crate::domain::{
    BalanceAudit, EntryKind, LedgerEntry, LedgerOwner, Money, NewEntry, UserId, WithdrawalQuote,
};
use crate::error::GatewayError;
use crate::persistence::{Database, ledger, users};

/// Wallet operations over the user balance and the ledger.
#[derive(Debug, Clone)]
pub struct WalletService {
    db: Database,
    withdraw_fee_bps: u32,
}

impl WalletService {
    /// Creates a new `WalletService` charging `withdraw_fee_bps` on
    /// withdrawals.
    #[must_use]
    pub fn new(db: Database, withdraw_fee_bps: u32) -> Self {
        Self {
            db,
            withdraw_fee_bps,
        }
    }

    /// Debits `amount` plus the withdrawal fee and records the request.
    ///
    /// No funds leave the platform here; the `withdraw_request` entry is
    /// what an operator pays out.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] if `amount` is not positive.
    /// - [`GatewayError::InsufficientBalance`] if the balance does not cover
    ///   `amount + fee`.
    pub async fn withdraw(
        &self,
        user: UserId,
        amount: Money,
    ) -> Result<WithdrawalQuote, GatewayError> {
        if !amount.is_positive() {
            return Err(GatewayError::InvalidRequest("invalid amount".to_string()));
        }
        let quote = WithdrawalQuote::compute(amount, self.withdraw_fee_bps)?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        if !users::debit_if_sufficient(&mut tx, user, quote.debited).await? {
            return Err(GatewayError::InsufficientBalance(
                "insufficient balance including fees".to_string(),
            ));
        }
        let entries = [
            NewEntry::new(
                LedgerOwner::User(user),
                EntryKind::WithdrawRequest,
                amount.checked_neg()?,
                format!("withdraw_request amount:{amount}"),
            ),
            NewEntry::new(
                LedgerOwner::User(user),
                EntryKind::WithdrawFee,
                quote.fee.checked_neg()?,
                format!("withdraw_fee:{}", quote.fee),
            ),
            NewEntry::new(
                LedgerOwner::Platform,
                EntryKind::PlatformWithdrawFee,
                quote.fee,
                format!("withdraw_fee user:{user}"),
            ),
        ];
        for entry in &entries {
            ledger::append(&mut tx, entry, now).await?;
        }
        tx.commit().await?;

        tracing::info!(%user, %amount, fee = %quote.fee, debited = %quote.debited, "withdrawal requested");
        Ok(quote)
    }

    /// Lists a user's ledger entries newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn transactions(
        &self,
        user: UserId,
        limit: u32,
        offset: u32,
    ) -> Result<Page<LedgerEntry>, GatewayError> {
        let mut conn = self.db.acquire().await?;
        let items = ledger::list_for_user(&mut conn, user, limit, offset).await?;
        let total = ledger::count_for_user(&mut conn, user).await?;
        Ok(Page { items, total })
    }

    /// Compares the stored balance with the sum of the user's ledger.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] if the account does not exist.
    pub async fn audit(&self, user: UserId) -> Result<BalanceAudit, GatewayError> {
        let mut tx = self.db.begin().await?;
        let balance = users::find_by_id(&mut tx, user)
            .await?
            .ok_or_else(|| GatewayError::UserNotFound(user.to_string()))?
            .balance;
        let ledger_total = ledger::balance_total(&mut tx, user).await?;
        tx.commit().await?;

        let audit = BalanceAudit {
            balance,
            ledger_total,
        };
        if !audit.is_consistent() {
            tracing::warn!(%user, %balance, %ledger_total, "balance diverges from ledger");
        }
        Ok(audit)
    }
}
