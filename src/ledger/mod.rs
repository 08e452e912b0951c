//! Wallet ledger: the single authority for balance and escrow mutation.
//!
//! Every operation is check-then-mutate and appends an immutable [`TxRecord`]
//! to the audit log, so total user-held value never changes without a record.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use crate::Amount;
use crate::commission;
use crate::model::{TxDirection, TxId, TxPurpose, TxRecord, TxStatus, UserId};

mod wallet;
pub use wallet::Wallet;

mod error;
pub use error::LedgerError;

/// Synthetic account the platform's commission entries are recorded against.
pub const PLATFORM_ACCOUNT: UserId = 0;

/// Result of an escrow release: how the settled amount was divided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub payout: Amount,
    pub commission: Amount,
}

/// The wallet ledger.
///
/// Wallets are created on first touch with zero balances and never removed.
pub struct Ledger {
    wallets: HashMap<UserId, Wallet>,
    log: Vec<TxRecord>,
    commission_total: Amount,
    next_tx: TxId,
}

/// Public API
impl Ledger {
    pub fn new() -> Self {
        Self {
            wallets: HashMap::new(),
            log: Vec::new(),
            commission_total: Amount::ZERO,
            next_tx: 1,
        }
    }

    /// Snapshot of one user's wallet (zero balances if never touched).
    pub fn wallet(&self, user: UserId) -> Wallet {
        self.wallets.get(&user).copied().unwrap_or_default()
    }

    /// All wallets with a recorded position.
    pub fn wallets(&self) -> impl Iterator<Item = (UserId, &Wallet)> + '_ {
        self.wallets.iter().map(|(id, w)| (*id, w))
    }

    /// The append-only transaction log, oldest first.
    pub fn log(&self) -> &[TxRecord] {
        &self.log
    }

    /// Log entries touching one user's wallet, oldest first.
    pub fn transactions_for(&self, user: UserId) -> impl Iterator<Item = &TxRecord> + '_ {
        self.log.iter().filter(move |tx| tx.user == user)
    }

    /// Commission accumulated by the platform across all settlements.
    pub fn commission_total(&self) -> Amount {
        self.commission_total
    }

    /// Increase a user's spendable balance.
    pub fn credit(
        &mut self,
        user: UserId,
        amount: Amount,
        purpose: TxPurpose,
        description: impl Into<String>,
    ) -> Result<TxId, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        self.wallets.entry(user).or_default().credit(amount);
        let tx = self.record(user, amount, TxDirection::Credit, purpose, description);
        info!(user, tx, amount = %amount, purpose = ?purpose, "credit applied");
        Ok(tx)
    }

    /// Decrease a user's spendable balance.
    pub fn debit(
        &mut self,
        user: UserId,
        amount: Amount,
        purpose: TxPurpose,
        description: impl Into<String>,
    ) -> Result<TxId, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let wallet = self.wallets.entry(user).or_default();
        if wallet.balance() < amount {
            return Err(LedgerError::InsufficientFunds(
                user,
                wallet.balance(),
                amount,
            ));
        }

        wallet.debit(amount);
        let tx = self.record(user, amount, TxDirection::Debit, purpose, description);
        info!(user, tx, amount = %amount, purpose = ?purpose, "debit applied");
        Ok(tx)
    }

    /// Move spendable funds into escrow as one atomic step: the balance is
    /// never debited without the matching escrow credit.
    pub fn hold_to_escrow(
        &mut self,
        user: UserId,
        amount: Amount,
        description: impl Into<String>,
    ) -> Result<TxId, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let wallet = self.wallets.entry(user).or_default();
        if wallet.balance() < amount {
            return Err(LedgerError::InsufficientFunds(
                user,
                wallet.balance(),
                amount,
            ));
        }

        wallet.hold(amount);
        let tx = self.record(
            user,
            amount,
            TxDirection::Debit,
            TxPurpose::BookingHold,
            description,
        );
        info!(user, tx, amount = %amount, "escrow hold applied");
        Ok(tx)
    }

    /// Settle escrowed funds to an agent: the tenant's escrow drops by the
    /// full amount, the agent's balance rises by the amount net of
    /// commission, and the commission is recorded on the platform account.
    pub fn release_escrow(
        &mut self,
        user: UserId,
        amount: Amount,
        agent: UserId,
        rate_bps: u32,
        description: impl Into<String>,
    ) -> Result<Settlement, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let wallet = self.wallets.entry(user).or_default();
        if wallet.escrow() < amount {
            return Err(LedgerError::InsufficientEscrow(user, wallet.escrow(), amount));
        }

        let (payout, commission) = commission::split(amount, rate_bps);
        let description = description.into();

        wallet.release(amount);
        self.record(
            user,
            amount,
            TxDirection::Debit,
            TxPurpose::BookingRelease,
            description.clone(),
        );

        if !payout.is_zero() {
            self.wallets.entry(agent).or_default().credit(payout);
            self.record(
                agent,
                payout,
                TxDirection::Credit,
                TxPurpose::BookingRelease,
                description.clone(),
            );
        }

        if !commission.is_zero() {
            self.commission_total += commission;
            self.record(
                PLATFORM_ACCOUNT,
                commission,
                TxDirection::Credit,
                TxPurpose::Commission,
                description,
            );
        }

        info!(
            user,
            agent,
            amount = %amount,
            payout = %payout,
            commission = %commission,
            "escrow released"
        );
        Ok(Settlement { payout, commission })
    }

    /// Return escrowed funds to the tenant's spendable balance as one atomic
    /// step.
    pub fn refund_escrow(
        &mut self,
        user: UserId,
        amount: Amount,
        description: impl Into<String>,
    ) -> Result<TxId, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let wallet = self.wallets.entry(user).or_default();
        if wallet.escrow() < amount {
            return Err(LedgerError::InsufficientEscrow(user, wallet.escrow(), amount));
        }

        wallet.refund(amount);
        let tx = self.record(
            user,
            amount,
            TxDirection::Credit,
            TxPurpose::BookingRefund,
            description,
        );
        info!(user, tx, amount = %amount, "escrow refunded");
        Ok(tx)
    }
}

/// Private API
impl Ledger {
    fn record(
        &mut self,
        user: UserId,
        amount: Amount,
        direction: TxDirection,
        purpose: TxPurpose,
        description: impl Into<String>,
    ) -> TxId {
        let id = self.next_tx;
        self.next_tx += 1;
        self.log.push(TxRecord {
            id,
            user,
            amount,
            direction,
            purpose,
            description: description.into(),
            status: TxStatus::Confirmed,
            created_at: Utc::now(),
        });
        id
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
