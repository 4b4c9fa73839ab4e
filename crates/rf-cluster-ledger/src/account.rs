//! Player accounts

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use rf_cluster::{BonusState, SessionStats};

/// Account identifier, assigned by the ledger
pub type AccountId = u64;

/// Mutable per-player state. Only ever touched under the account's lock.
pub(crate) struct Account {
    pub(crate) id: AccountId,
    pub(crate) balance: f64,
    pub(crate) bonus: BonusState,
    pub(crate) stats: SessionStats,
    /// Stream for authoritative spins, forked from the ledger's master RNG
    pub(crate) rng: ChaCha8Rng,
}

impl Account {
    pub(crate) fn new(id: AccountId, balance: f64, rng: ChaCha8Rng) -> Self {
        Self {
            id,
            balance,
            bonus: BonusState::Inactive,
            stats: SessionStats::default(),
            rng,
        }
    }

    pub(crate) fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            id: self.id,
            balance: self.balance,
            bonus: self.bonus.clone(),
            stats: self.stats.clone(),
        }
    }
}

/// Point-in-time copy of an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: AccountId,
    pub balance: f64,
    pub bonus: BonusState,
    pub stats: SessionStats,
}

impl AccountSnapshot {
    pub fn in_bonus(&self) -> bool {
        self.bonus.is_active()
    }
}
