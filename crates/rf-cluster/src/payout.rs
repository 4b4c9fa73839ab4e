//! Payout calculation for matched clusters

use serde::{Deserialize, Serialize};

use crate::catalog::{Symbol, SymbolCatalog};
use crate::cluster::Cluster;
use crate::error::{ClusterError, ClusterResult};

/// Win produced by a single cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterWin {
    pub symbol: Symbol,
    pub size: usize,
    /// Bet multiplier from the payout table
    pub multiplier: f64,
    /// `bet * multiplier`
    pub amount: f64,
}

/// Reject bets that cannot act as a payout multiplier base
pub fn validate_bet(bet: f64) -> ClusterResult<()> {
    if bet.is_finite() && bet > 0.0 {
        Ok(())
    } else {
        Err(ClusterError::InvalidBet(bet))
    }
}

/// Turns clusters plus a bet into money
#[derive(Debug, Clone, Copy)]
pub struct PayoutCalculator<'a> {
    catalog: &'a SymbolCatalog,
}

impl<'a> PayoutCalculator<'a> {
    pub fn new(catalog: &'a SymbolCatalog) -> Self {
        Self { catalog }
    }

    /// Per-cluster wins for one round
    pub fn wins<'c>(
        &self,
        clusters: impl IntoIterator<Item = &'c Cluster>,
        bet: f64,
    ) -> ClusterResult<Vec<ClusterWin>> {
        validate_bet(bet)?;
        Ok(clusters
            .into_iter()
            .map(|cluster| {
                let multiplier = self.catalog.multiplier(cluster.symbol, cluster.size());
                ClusterWin {
                    symbol: cluster.symbol,
                    size: cluster.size(),
                    multiplier,
                    amount: bet * multiplier,
                }
            })
            .collect())
    }

    /// Total payout of one round
    pub fn payout<'c>(
        &self,
        clusters: impl IntoIterator<Item = &'c Cluster>,
        bet: f64,
    ) -> ClusterResult<f64> {
        Ok(self.wins(clusters, bet)?.iter().map(|w| w.amount).sum())
    }
}
