//! Engine configuration
//!
//! Everything the engine needs is carried by [`GameConfig`], built by the caller
//! and handed over at construction. The engine never reads files or environment.

use serde::{Deserialize, Serialize};

use crate::catalog::SymbolTier;
use crate::error::{ClusterError, ClusterResult};

/// Grid edge length (the grid is square)
pub const GRID_SIZE: usize = 7;
/// Minimum paying cluster size
pub const CLUSTER_SIZE: usize = 5;
/// Number of symbol ids, scatter included
pub const SYMBOL_COUNT: usize = 9;
/// Scatter symbol id
pub const SCATTER_SYMBOL: u8 = 8;
/// Scatters needed on a base spin to enter bonus mode
pub const BONUS_TRIGGER_COUNT: usize = 4;
/// Scatters needed on a bonus spin to retrigger
pub const RETRIGGER_COUNT: usize = 3;
/// Free spins awarded on bonus entry
pub const FREE_SPINS: u32 = 10;
/// Free spins added per retrigger
pub const RETRIGGER_SPINS: u32 = 5;
/// Smallest accepted bet
pub const MIN_BET: u64 = 200;
/// Largest accepted bet
pub const MAX_BET: u64 = 6000;
/// Bet ladder step
pub const BET_STEP: u64 = 400;

/// Default symbol weights in percentage points, index = symbol id
pub const DEFAULT_SYMBOL_WEIGHTS: [u32; SYMBOL_COUNT] = [20, 18, 16, 14, 11, 9, 6, 3, 3];

/// Default payout multipliers. Row = cluster size bucket (5, 6, ... 14, 15+), column = symbol id.
pub const DEFAULT_PAYOUT_TABLE: [[f64; SYMBOL_COUNT]; 11] = [
    [0.10, 0.12, 0.15, 0.20, 0.25, 0.30, 0.40, 0.50, 1.00],
    [0.15, 0.18, 0.22, 0.30, 0.38, 0.45, 0.60, 0.75, 1.50],
    [0.20, 0.25, 0.30, 0.45, 0.50, 0.60, 0.80, 1.00, 2.00],
    [0.30, 0.35, 0.45, 0.60, 0.75, 0.90, 1.20, 1.50, 3.00],
    [0.40, 0.45, 0.60, 0.80, 1.00, 1.20, 1.60, 2.00, 4.00],
    [0.50, 0.60, 0.75, 1.00, 1.25, 1.50, 2.00, 2.50, 5.00],
    [0.75, 0.90, 1.10, 1.50, 2.00, 2.25, 3.00, 4.00, 7.50],
    [1.00, 1.20, 1.50, 2.00, 2.50, 3.00, 4.00, 5.00, 10.00],
    [1.50, 1.80, 2.25, 3.00, 3.75, 4.50, 6.00, 7.50, 15.00],
    [2.00, 2.50, 3.00, 4.00, 5.00, 6.00, 8.00, 10.00, 20.00],
    [3.00, 3.50, 4.50, 6.00, 7.50, 9.00, 12.00, 15.00, 30.00],
];

/// Default tier of each symbol id
pub const DEFAULT_SYMBOL_TIERS: [SymbolTier; SYMBOL_COUNT] = [
    SymbolTier::Low,
    SymbolTier::Low,
    SymbolTier::Mid,
    SymbolTier::Mid,
    SymbolTier::High,
    SymbolTier::High,
    SymbolTier::Premium,
    SymbolTier::Premium,
    SymbolTier::Scatter,
];

/// Coarse per-tier multipliers used by the payout reconciler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierMultipliers {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
    pub premium: f64,
    pub scatter: f64,
}

impl TierMultipliers {
    /// Multiplier for a tier
    pub fn get(&self, tier: SymbolTier) -> f64 {
        match tier {
            SymbolTier::Low => self.low,
            SymbolTier::Mid => self.mid,
            SymbolTier::High => self.high,
            SymbolTier::Premium => self.premium,
            SymbolTier::Scatter => self.scatter,
        }
    }

    fn all(&self) -> [f64; 5] {
        [self.low, self.mid, self.high, self.premium, self.scatter]
    }
}

impl Default for TierMultipliers {
    fn default() -> Self {
        Self {
            low: 0.5,
            mid: 1.0,
            high: 2.0,
            premium: 4.0,
            scatter: 10.0,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Grid edge length
    pub grid_size: usize,
    /// Minimum paying cluster size
    pub cluster_size: usize,
    /// Number of symbol ids (scatter included)
    pub symbol_count: usize,
    /// Scatter symbol id
    pub scatter_symbol: u8,
    /// Scatters needed to enter bonus mode
    pub bonus_trigger_count: usize,
    /// Scatters needed to retrigger inside bonus mode
    pub retrigger_count: usize,
    /// Free spins awarded on entry
    pub free_spins: u32,
    /// Free spins added per retrigger
    pub retrigger_spins: u32,
    /// Bet ladder bounds and step
    pub min_bet: u64,
    pub max_bet: u64,
    pub bet_step: u64,
    /// Symbol weights (percentage points, must sum to 100)
    pub symbol_weights: Vec<u32>,
    /// Payout multipliers, `payout_table[bucket][symbol]`
    pub payout_table: Vec<Vec<f64>>,
    /// Tier of each symbol, used by the reconciler
    pub symbol_tiers: Vec<SymbolTier>,
    /// Reconciler multipliers per tier
    pub tier_multipliers: TierMultipliers,
    /// Chance to copy an already placed neighbor during generation
    pub neighbor_bias: f64,
    /// Chance to copy a horizontal neighbor during refill
    pub refill_bias: f64,
    /// Apply the scatter placement rule to refilled cells as well
    pub suppress_refill_scatters: bool,
    /// Hard cap on cascade rounds per spin
    pub max_cascade_steps: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            cluster_size: CLUSTER_SIZE,
            symbol_count: SYMBOL_COUNT,
            scatter_symbol: SCATTER_SYMBOL,
            bonus_trigger_count: BONUS_TRIGGER_COUNT,
            retrigger_count: RETRIGGER_COUNT,
            free_spins: FREE_SPINS,
            retrigger_spins: RETRIGGER_SPINS,
            min_bet: MIN_BET,
            max_bet: MAX_BET,
            bet_step: BET_STEP,
            symbol_weights: DEFAULT_SYMBOL_WEIGHTS.to_vec(),
            payout_table: DEFAULT_PAYOUT_TABLE.iter().map(|row| row.to_vec()).collect(),
            symbol_tiers: DEFAULT_SYMBOL_TIERS.to_vec(),
            tier_multipliers: TierMultipliers::default(),
            neighbor_bias: 0.3,
            refill_bias: 0.2,
            suppress_refill_scatters: false,
            max_cascade_steps: 100,
        }
    }
}

impl GameConfig {
    /// Builder: set cascade cap
    pub fn with_max_cascade_steps(mut self, steps: u32) -> Self {
        self.max_cascade_steps = steps;
        self
    }

    /// Builder: set symbol weights
    pub fn with_symbol_weights(mut self, weights: Vec<u32>) -> Self {
        self.symbol_weights = weights;
        self
    }

    /// Builder: set generation and refill neighbor biases
    pub fn with_biases(mut self, neighbor_bias: f64, refill_bias: f64) -> Self {
        self.neighbor_bias = neighbor_bias;
        self.refill_bias = refill_bias;
        self
    }

    /// Builder: enable scatter suppression on refill
    pub fn with_refill_scatter_suppression(mut self, enabled: bool) -> Self {
        self.suppress_refill_scatters = enabled;
        self
    }

    /// Index of the last payout row ("N or more")
    pub fn max_bucket(&self) -> usize {
        self.payout_table.len().saturating_sub(1)
    }

    /// Bet ladder described by this config
    pub fn bet_ladder(&self) -> BetLadder {
        BetLadder {
            min: self.min_bet,
            max: self.max_bet,
            step: self.bet_step,
        }
    }

    /// Check table shapes and value ranges
    pub fn validate(&self) -> ClusterResult<()> {
        let invalid = |msg: String| Err(ClusterError::InvalidConfig(msg));

        if self.grid_size == 0 {
            return invalid("grid_size must be positive".into());
        }
        if self.cluster_size == 0 {
            return invalid("cluster_size must be positive".into());
        }
        if self.symbol_count == 0 || self.symbol_count > u8::MAX as usize {
            return invalid(format!("symbol_count {} out of range", self.symbol_count));
        }
        if self.scatter_symbol as usize >= self.symbol_count {
            return invalid(format!(
                "scatter_symbol {} not below symbol_count {}",
                self.scatter_symbol, self.symbol_count
            ));
        }
        if self.bonus_trigger_count == 0 || self.retrigger_count == 0 {
            return invalid("scatter trigger counts must be positive".into());
        }

        if self.symbol_weights.len() != self.symbol_count {
            return invalid(format!(
                "expected {} symbol weights, got {}",
                self.symbol_count,
                self.symbol_weights.len()
            ));
        }
        let total: u32 = self.symbol_weights.iter().sum();
        if total != 100 {
            return invalid(format!("symbol weights sum to {}, expected 100", total));
        }
        let scatter_weight = self.symbol_weights[self.scatter_symbol as usize];
        if scatter_weight == total {
            return invalid("at least one paying symbol needs a non-zero weight".into());
        }

        if self.payout_table.is_empty() {
            return invalid("payout table has no rows".into());
        }
        for (bucket, row) in self.payout_table.iter().enumerate() {
            if row.len() != self.symbol_count {
                return invalid(format!(
                    "payout row {} has {} entries, expected {}",
                    bucket,
                    row.len(),
                    self.symbol_count
                ));
            }
            if let Some(bad) = row.iter().find(|m| !m.is_finite() || **m < 0.0) {
                return invalid(format!("payout row {} holds invalid multiplier {}", bucket, bad));
            }
        }

        if self.symbol_tiers.len() != self.symbol_count {
            return invalid(format!(
                "expected {} symbol tiers, got {}",
                self.symbol_count,
                self.symbol_tiers.len()
            ));
        }
        if self
            .tier_multipliers
            .all()
            .iter()
            .any(|m| !m.is_finite() || *m < 0.0)
        {
            return invalid("tier multipliers must be finite and non-negative".into());
        }

        for (name, p) in [
            ("neighbor_bias", self.neighbor_bias),
            ("refill_bias", self.refill_bias),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return invalid(format!("{} {} outside [0, 1]", name, p));
            }
        }

        if self.max_cascade_steps == 0 {
            return invalid("max_cascade_steps must be positive".into());
        }

        if self.min_bet == 0 || self.bet_step == 0 || self.min_bet > self.max_bet {
            return invalid(format!(
                "bad bet ladder min={} max={} step={}",
                self.min_bet, self.max_bet, self.bet_step
            ));
        }

        Ok(())
    }
}

/// Accepted bet amounts: `min, min + step, ...` up to and including `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetLadder {
    pub min: u64,
    pub max: u64,
    pub step: u64,
}

impl BetLadder {
    /// Whether `bet` sits on the ladder
    pub fn contains(&self, bet: f64) -> bool {
        if !bet.is_finite() || bet.fract() != 0.0 || bet < self.min as f64 || bet > self.max as f64 {
            return false;
        }
        let bet = bet as u64;
        self.step > 0 && (bet - self.min) % self.step == 0
    }

    /// All rungs, lowest first
    pub fn bets(&self) -> impl Iterator<Item = u64> + '_ {
        (self.min..=self.max).step_by(self.step.max(1) as usize)
    }

    /// Nearest rung at or below `bet`, clamped to the ladder
    pub fn floor(&self, bet: f64) -> u64 {
        if !bet.is_finite() || bet <= self.min as f64 {
            return self.min;
        }
        let top = self.bets().last().unwrap_or(self.min);
        let bet = (bet as u64).min(top);
        self.min + (bet - self.min) / self.step.max(1) * self.step
    }
}

impl Default for BetLadder {
    fn default() -> Self {
        GameConfig::default().bet_ladder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_bucket(), 10);
        assert_eq!(config.symbol_weights.iter().sum::<u32>(), 100);
    }

    #[test]
    fn test_rejects_bad_weight_sum() {
        let config = GameConfig::default().with_symbol_weights(vec![10; 9]);
        assert!(matches!(
            config.validate(),
            Err(ClusterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_scatter_only_weights() {
        let config = GameConfig::default().with_symbol_weights(vec![0, 0, 0, 0, 0, 0, 0, 0, 100]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_ragged_payout_table() {
        let mut config = GameConfig::default();
        config.payout_table[3].pop();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bias_out_of_range() {
        let config = GameConfig::default().with_biases(1.5, 0.2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_cascade_cap() {
        let config = GameConfig::default().with_max_cascade_steps(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bet_ladder() {
        let ladder = BetLadder::default();
        assert!(ladder.contains(200.0));
        assert!(ladder.contains(600.0));
        assert!(ladder.contains(5800.0));
        assert!(!ladder.contains(400.0));
        assert!(!ladder.contains(6000.0));
        assert!(!ladder.contains(600.5));
        assert!(!ladder.contains(-200.0));
        assert!(!ladder.contains(f64::NAN));

        let bets: Vec<u64> = ladder.bets().collect();
        assert_eq!(bets.first(), Some(&200));
        assert_eq!(bets.last(), Some(&5800));
        assert_eq!(bets.len(), 15);
    }

    #[test]
    fn test_bet_ladder_floor() {
        let ladder = BetLadder::default();
        assert_eq!(ladder.floor(100.0), 200);
        assert_eq!(ladder.floor(700.0), 600);
        assert_eq!(ladder.floor(99_999.0), 5800);
    }

    #[test]
    fn test_config_json_roundtrip_with_defaults() {
        let json = r#"{ "max_cascade_steps": 12, "refill_bias": 0.0 }"#;
        let config: GameConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_cascade_steps, 12);
        assert_eq!(config.refill_bias, 0.0);
        assert_eq!(config.grid_size, GRID_SIZE);
        assert!(config.validate().is_ok());
    }
}
