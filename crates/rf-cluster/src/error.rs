//! Error types for rf-cluster

use thiserror::Error;

/// Engine error type
///
/// Every variant is a local computation error. Nothing here is retryable:
/// a failed spin produces no partial result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid bet: {0}")]
    InvalidBet(f64),

    #[error("Invalid declared payout: {0}")]
    InvalidPayout(f64),

    #[error("Cascade did not settle within {steps} steps")]
    CascadeLimit { steps: u32 },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("No active bonus session")]
    BonusInactive,
}

/// Result type alias
pub type ClusterResult<T> = Result<T, ClusterError>;
