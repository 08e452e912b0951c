//! Error types for ledger operations.

use thiserror::Error;

use crate::Amount;
use crate::model::UserId;

/// Error returned by [`Ledger`](super::Ledger) operations. Every failure is
/// checked before any mutation, so a returned error means the ledger is
/// exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("amount must be positive")]
    InvalidAmount,

    #[error("insufficient funds for user {0}: available {1}, requested {2}")]
    InsufficientFunds(UserId, Amount, Amount),

    #[error("insufficient escrow for user {0}: held {1}, requested {2}")]
    InsufficientEscrow(UserId, Amount, Amount),
}
