//! Slot engine: one player's view of the game
//!
//! Owns the config, the derived catalog, the RNG stream and the bonus state.
//! [`SlotEngine::spin`] is the full driver (generate, resolve, settle); the
//! remaining methods expose each stage on its own.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::bonus::{self, BonusEvent, BonusRules, BonusState, Settlement};
use crate::cascade::CascadeResolver;
use crate::catalog::SymbolCatalog;
use crate::config::{BetLadder, GameConfig};
use crate::error::{ClusterError, ClusterResult};
use crate::generator::GridGenerator;
use crate::grid::Grid;
use crate::reconcile::{Reconciliation, SpinReconciler};
use crate::spin::{SpinMode, SpinResult, SpinTally};

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub base_spins: u64,
    pub bonus_spins: u64,
    /// Sum of charged bets (bonus spins charge nothing)
    pub total_bet: f64,
    /// Sum of spin payouts, base and bonus
    pub total_win: f64,
    pub wins: u64,
    pub losses: u64,
    /// Spins with at least one cascade round
    pub cascade_chains: u64,
    pub longest_chain: u32,
    pub bonus_triggers: u64,
    pub retriggers: u64,
    pub max_win_ratio: f64,
}

impl SessionStats {
    /// Fold one resolved spin into the totals
    pub fn record(&mut self, result: &SpinResult, settlement: &Settlement) {
        self.record_tally(
            &result.tally(),
            result.mode,
            result.cascade_count() as u32,
            settlement,
        );
    }

    /// Fold a spin known only by its numbers (e.g. a reconciled client spin)
    pub fn record_tally(
        &mut self,
        tally: &SpinTally,
        mode: SpinMode,
        cascades: u32,
        settlement: &Settlement,
    ) {
        self.total_spins += 1;
        match mode {
            SpinMode::Base => self.base_spins += 1,
            SpinMode::Bonus => self.bonus_spins += 1,
        }
        self.total_bet += settlement.charged;
        self.total_win += tally.payout;

        if tally.payout > 0.0 {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        if cascades > 0 {
            self.cascade_chains += 1;
        }
        self.longest_chain = self.longest_chain.max(cascades);
        if tally.bet > 0.0 {
            self.max_win_ratio = self.max_win_ratio.max(tally.payout / tally.bet);
        }

        match settlement.event {
            BonusEvent::Entered { .. } => self.bonus_triggers += 1,
            BonusEvent::Continuing {
                retriggered: true, ..
            } => self.retriggers += 1,
            _ => {}
        }
    }

    /// Combine two independent sessions
    pub fn merge(&mut self, other: &SessionStats) {
        self.total_spins += other.total_spins;
        self.base_spins += other.base_spins;
        self.bonus_spins += other.bonus_spins;
        self.total_bet += other.total_bet;
        self.total_win += other.total_win;
        self.wins += other.wins;
        self.losses += other.losses;
        self.cascade_chains += other.cascade_chains;
        self.longest_chain = self.longest_chain.max(other.longest_chain);
        self.bonus_triggers += other.bonus_triggers;
        self.retriggers += other.retriggers;
        self.max_win_ratio = self.max_win_ratio.max(other.max_win_ratio);
    }

    /// Calculate RTP
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0.0 {
            (self.total_win / self.total_bet) * 100.0
        } else {
            0.0
        }
    }

    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.wins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// A resolved spin together with its money movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    pub result: SpinResult,
    pub settlement: Settlement,
}

/// Cascading cluster-pays engine
pub struct SlotEngine<R: RngCore = ChaCha8Rng> {
    /// Configuration
    config: GameConfig,
    /// Weights, payouts and tiers derived from the config
    catalog: SymbolCatalog,
    /// Bonus thresholds derived from the config
    rules: BonusRules,
    /// Random number generator
    rng: R,
    /// Free-spins state
    bonus: BonusState,
    /// Current session stats
    stats: SessionStats,
    /// Current spin count
    spin_count: u64,
}

impl SlotEngine<ChaCha8Rng> {
    /// Engine seeded from the OS
    pub fn new(config: GameConfig) -> ClusterResult<Self> {
        Self::with_rng(config, ChaCha8Rng::from_os_rng())
    }

    /// Engine with a reproducible stream
    pub fn seeded(config: GameConfig, seed: u64) -> ClusterResult<Self> {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Seed RNG for reproducible results
    pub fn seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }
}

impl<R: RngCore> SlotEngine<R> {
    /// Engine over a caller-supplied RNG. Fails on an invalid config.
    pub fn with_rng(config: GameConfig, rng: R) -> ClusterResult<Self> {
        let catalog = SymbolCatalog::from_config(&config)?;
        Ok(Self {
            rules: BonusRules::from_config(&config),
            catalog,
            config,
            rng,
            bonus: BonusState::Inactive,
            stats: SessionStats::default(),
            spin_count: 0,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    pub fn rules(&self) -> &BonusRules {
        &self.rules
    }

    pub fn bet_ladder(&self) -> BetLadder {
        self.config.bet_ladder()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Reset session stats
    pub fn reset_stats(&mut self) {
        self.stats = SessionStats::default();
        self.spin_count = 0;
    }

    pub fn spin_count(&self) -> u64 {
        self.spin_count
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STAGES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Fresh full grid from the engine's stream
    pub fn generate_grid(&mut self) -> Grid {
        GridGenerator::new(&self.config, &self.catalog, &mut self.rng).generate()
    }

    /// Resolve all cascades of `grid` at `bet`; refills draw from the engine's stream
    pub fn resolve_cascade(&mut self, grid: &Grid, bet: f64) -> ClusterResult<SpinResult> {
        CascadeResolver::new(&self.config, &self.catalog, &mut self.rng).resolve(grid, bet)
    }

    pub fn check_bonus_trigger(&self, grid: &Grid) -> bool {
        bonus::check_bonus_trigger(grid, &self.catalog, &self.rules)
    }

    pub fn check_retrigger(&self, grid: &Grid) -> bool {
        bonus::check_retrigger(grid, &self.catalog, &self.rules)
    }

    pub fn estimate_payout_bound(&self, grid: &Grid, bet: f64) -> ClusterResult<f64> {
        SpinReconciler::new(&self.config, &self.catalog).estimate_bound(grid, bet)
    }

    /// Declared payout clamped to the grid bound
    pub fn reconcile_payout(&self, grid: &Grid, bet: f64, declared: f64) -> ClusterResult<f64> {
        Ok(self.reconcile(grid, bet, declared)?.accepted)
    }

    /// Full reconciliation record
    pub fn reconcile(&self, grid: &Grid, bet: f64, declared: f64) -> ClusterResult<Reconciliation> {
        SpinReconciler::new(&self.config, &self.catalog).reconcile(grid, bet, declared)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPIN EXECUTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Play one spin
    ///
    /// Inside a bonus session the spin is free and played at the bet that
    /// triggered the session; `bet` is ignored.
    pub fn spin(&mut self, bet: f64) -> ClusterResult<SpinOutcome> {
        let (bet, mode) = match self.bonus.session_bet() {
            Some(session_bet) => (session_bet, SpinMode::Bonus),
            None => (bet, SpinMode::Base),
        };

        let grid = self.generate_grid();
        let result = self.resolve_cascade(&grid, bet)?.with_mode(mode);
        let settlement = self.bonus.settle(&result.tally(), &self.rules)?;

        self.spin_count += 1;
        self.stats.record(&result, &settlement);
        log::debug!(
            "spin {} ({:?}): bet {}, payout {:.2}, {} cascades, {:?}",
            self.spin_count,
            mode,
            bet,
            result.total_payout,
            result.cascade_count(),
            settlement.event
        );

        Ok(SpinOutcome { result, settlement })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BONUS STATE
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn bonus(&self) -> &BonusState {
        &self.bonus
    }

    /// Check if currently in free spins
    pub fn in_bonus(&self) -> bool {
        self.bonus.is_active()
    }

    /// Get remaining free spins
    pub fn free_spins_remaining(&self) -> u32 {
        self.bonus.remaining_spins()
    }

    /// Replace the bonus state, e.g. from a saved snapshot
    pub fn restore_bonus(&mut self, state: BonusState) {
        self.bonus = state;
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Export config as JSON
    pub fn export_config(&self) -> ClusterResult<String> {
        serde_json::to_string_pretty(&self.config)
            .map_err(|e| ClusterError::InvalidConfig(e.to_string()))
    }

    /// Import config from JSON; the current config stays on failure
    pub fn import_config(&mut self, json: &str) -> ClusterResult<()> {
        let config: GameConfig = serde_json::from_str(json)
            .map_err(|e| ClusterError::InvalidConfig(e.to_string()))?;
        let catalog = SymbolCatalog::from_config(&config)?;
        self.rules = BonusRules::from_config(&config);
        self.catalog = catalog;
        self.config = config;
        Ok(())
    }
}
