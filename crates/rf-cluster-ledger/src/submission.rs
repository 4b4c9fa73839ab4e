//! Spin submissions and receipts

use serde::{Deserialize, Serialize};

use rf_cluster::{BonusEvent, Grid, Reconciliation, SpinMode, SpinResult};

use crate::account::AccountId;

/// How a spin reaches the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpinSubmission {
    /// The ledger generates and resolves the grid itself
    Authoritative,
    /// A client resolved the spin and reports grid and payout
    Declared(DeclaredSpin),
}

/// Client-reported spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredSpin {
    pub initial_grid: Grid,
    pub declared_payout: f64,
    /// Seed the client used for cascade refills; enables exact replay
    #[serde(default)]
    pub seed: Option<u64>,
}

/// How far the ledger trusts the payout it credited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    /// Generated and resolved by the ledger
    Authoritative,
    /// Declared, then reproduced exactly from the supplied seed
    Replayed,
    /// Declared without a seed, accepted up to the grid bound
    Reconciled,
}

/// Record of one settled spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinReceipt {
    pub spin_id: u64,
    pub account: AccountId,
    pub mode: SpinMode,
    pub trust: TrustLevel,
    /// Bet the spin was played at
    pub bet: f64,
    /// Payout this spin produced (credited now or held for the bonus)
    pub payout: f64,
    pub charged: f64,
    pub credited: f64,
    pub balance_after: f64,
    pub event: BonusEvent,
    /// Full cascade trace when the ledger resolved the spin itself
    pub result: Option<SpinResult>,
    /// Bound check when the payout was declared without a seed
    pub reconciliation: Option<Reconciliation>,
}

impl SpinReceipt {
    /// Net balance change
    pub fn net(&self) -> f64 {
        self.credited - self.charged
    }
}
