//! Symbol catalog: weighted sampling and payout lookup

use std::fmt;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::config::{GameConfig, TierMultipliers};
use crate::error::ClusterResult;

/// A symbol id. Payout and probability come from table lookups, the id carries nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub u8);

impl Symbol {
    /// Raw id
    pub fn id(self) -> u8 {
        self.0
    }

    /// Id as a table index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse value class of a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolTier {
    Low,
    Mid,
    High,
    Premium,
    Scatter,
}

/// Immutable lookup tables derived from a validated [`GameConfig`]
#[derive(Debug, Clone)]
pub struct SymbolCatalog {
    /// Running sum of weights, index = symbol id
    cumulative: Vec<u32>,
    /// Running sum of weights with the scatter weight zeroed
    cumulative_no_scatter: Vec<u32>,
    scatter: Symbol,
    cluster_size: usize,
    payout_table: Vec<Vec<f64>>,
    tiers: Vec<SymbolTier>,
    tier_multipliers: TierMultipliers,
}

impl SymbolCatalog {
    /// Build the catalog, validating the config first
    pub fn from_config(config: &GameConfig) -> ClusterResult<Self> {
        config.validate()?;

        let scatter = Symbol(config.scatter_symbol);
        let running = |skip: Option<usize>| -> Vec<u32> {
            config
                .symbol_weights
                .iter()
                .enumerate()
                .scan(0u32, |acc, (id, w)| {
                    if Some(id) != skip {
                        *acc += *w;
                    }
                    Some(*acc)
                })
                .collect()
        };

        Ok(Self {
            cumulative: running(None),
            cumulative_no_scatter: running(Some(scatter.index())),
            scatter,
            cluster_size: config.cluster_size,
            payout_table: config.payout_table.clone(),
            tiers: config.symbol_tiers.clone(),
            tier_multipliers: config.tier_multipliers,
        })
    }

    /// Number of symbol ids
    pub fn symbol_count(&self) -> usize {
        self.cumulative.len()
    }

    /// The scatter symbol
    pub fn scatter(&self) -> Symbol {
        self.scatter
    }

    /// Check if a symbol is the scatter
    pub fn is_scatter(&self, symbol: Symbol) -> bool {
        symbol == self.scatter
    }

    /// Check if a symbol id exists in this catalog
    pub fn contains(&self, symbol: Symbol) -> bool {
        symbol.index() < self.symbol_count()
    }

    /// All symbol ids in order
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> {
        (0..self.symbol_count() as u8).map(Symbol)
    }

    /// Draw a symbol from the weight table
    pub fn sample<R: RngCore + ?Sized>(&self, rng: &mut R) -> Symbol {
        Self::walk(&self.cumulative, rng)
    }

    /// Draw a symbol from the weight table with the scatter excluded
    ///
    /// Same distribution as redrawing until a non-scatter comes up, without the loop.
    pub fn sample_non_scatter<R: RngCore + ?Sized>(&self, rng: &mut R) -> Symbol {
        Self::walk(&self.cumulative_no_scatter, rng)
    }

    fn walk<R: RngCore + ?Sized>(cumulative: &[u32], rng: &mut R) -> Symbol {
        let total = cumulative.last().copied().unwrap_or(0);
        let last = cumulative.len().saturating_sub(1);
        if total == 0 {
            return Symbol(last as u8);
        }
        let draw = rng.random_range(0..total);
        let index = cumulative
            .iter()
            .position(|&sum| sum > draw)
            .unwrap_or(last);
        Symbol(index as u8)
    }

    /// Payout table row for a cluster size, `None` below the minimum size
    pub fn bucket(&self, cluster_size: usize) -> Option<usize> {
        let over = cluster_size.checked_sub(self.cluster_size)?;
        Some(over.min(self.payout_table.len().saturating_sub(1)))
    }

    /// Bet multiplier for a cluster of `size` cells of `symbol`
    pub fn multiplier(&self, symbol: Symbol, size: usize) -> f64 {
        self.bucket(size)
            .and_then(|row| self.payout_table.get(row))
            .and_then(|row| row.get(symbol.index()))
            .copied()
            .unwrap_or(0.0)
    }

    /// Tier of a symbol
    pub fn tier(&self, symbol: Symbol) -> SymbolTier {
        self.tiers
            .get(symbol.index())
            .copied()
            .unwrap_or(SymbolTier::Low)
    }

    /// Reconciler multiplier for a symbol (by tier)
    pub fn simplified_multiplier(&self, symbol: Symbol) -> f64 {
        self.tier_multipliers.get(self.tier(symbol))
    }

    /// Minimum paying cluster size
    pub fn cluster_size(&self) -> usize {
        self.cluster_size
    }
}
