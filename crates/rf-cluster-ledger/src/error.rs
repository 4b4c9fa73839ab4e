//! Error types for rf-cluster-ledger

use rf_cluster::ClusterError;
use thiserror::Error;

use crate::account::AccountId;

/// Ledger error type
///
/// A failed submission leaves the account untouched: nothing is debited
/// before the spin has been fully resolved.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Unknown account: {0}")]
    UnknownAccount(AccountId),

    #[error("Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: f64, available: f64 },

    #[error("Bet {0} is not on the bet ladder")]
    BetNotOnLadder(f64),

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Declared payout {declared} does not match replayed payout {replayed}")]
    ReplayMismatch { declared: f64, replayed: f64 },

    #[error("Engine error: {0}")]
    Engine(#[from] ClusterError),
}

/// Result type alias
pub type LedgerResult<T> = Result<T, LedgerError>;
