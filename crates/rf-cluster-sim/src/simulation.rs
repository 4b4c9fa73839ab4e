//! Parallel batch simulation
//!
//! The spin budget is split across workers; each worker owns a seeded
//! engine, plays its share and hands back its session stats, which are
//! merged into one report. The same seed and worker count always give the
//! same report.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use rf_cluster::{
    GameConfig, Grid, Reconciliation, SessionStats, SlotEngine, SpinOutcome, SpinReconciler,
    SymbolCatalog,
};

use crate::error::{SimError, SimResult};

/// Spacing between worker seeds (golden-ratio increment)
const WORKER_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Batch run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Total spins, bonus spins included
    pub spins: u64,
    /// Base-game bet, must sit on the bet ladder
    pub bet: f64,
    /// Master seed
    pub seed: u64,
    /// Worker count, 0 = one per CPU
    pub workers: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            spins: 100_000,
            bet: 600.0,
            seed: 0,
            workers: 0,
        }
    }
}

impl SimulationConfig {
    pub fn with_spins(mut self, spins: u64) -> Self {
        self.spins = spins;
        self
    }

    pub fn with_bet(mut self, bet: f64) -> Self {
        self.bet = bet;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Workers actually used
    pub fn effective_workers(&self) -> usize {
        let workers = if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        };
        workers.clamp(1, self.spins.max(1) as usize)
    }
}

/// Outcome of a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub settings: SimulationConfig,
    pub workers: usize,
    pub stats: SessionStats,
    /// Return to player, percent
    pub rtp: f64,
    /// Winning spins, percent
    pub hit_rate: f64,
    /// Base spins per bonus entry (0 when none triggered)
    pub bonus_frequency: f64,
    pub duration_ms: u64,
}

impl SimulationReport {
    fn new(settings: SimulationConfig, workers: usize, stats: SessionStats, duration_ms: u64) -> Self {
        let bonus_frequency = if stats.bonus_triggers > 0 {
            stats.base_spins as f64 / stats.bonus_triggers as f64
        } else {
            0.0
        };
        Self {
            rtp: stats.rtp(),
            hit_rate: stats.hit_rate(),
            bonus_frequency,
            settings,
            workers,
            stats,
            duration_ms,
        }
    }

    /// One-paragraph human summary
    pub fn summary(&self) -> String {
        format!(
            "{} spins ({} base, {} bonus) on {} workers in {} ms\n\
             RTP {:.2}%  hit rate {:.2}%  bonus every {:.1} base spins\n\
             longest cascade {}  max win {:.1}x bet  retriggers {}",
            self.stats.total_spins,
            self.stats.base_spins,
            self.stats.bonus_spins,
            self.workers,
            self.duration_ms,
            self.rtp,
            self.hit_rate,
            self.bonus_frequency,
            self.stats.longest_chain,
            self.stats.max_win_ratio,
            self.stats.retriggers
        )
    }
}

/// Runs batch simulations for one game config
pub struct Simulator {
    game: GameConfig,
}

impl Simulator {
    /// Fails on an invalid game config
    pub fn new(game: GameConfig) -> SimResult<Self> {
        game.validate()?;
        Ok(Self { game })
    }

    pub fn game(&self) -> &GameConfig {
        &self.game
    }

    /// Play the whole budget and merge worker stats
    pub fn run(&self, settings: &SimulationConfig) -> SimResult<SimulationReport> {
        self.check_bet(settings.bet)?;

        let workers = settings.effective_workers();
        let shares = split_budget(settings.spins, workers);
        log::info!(
            "simulating {} spins at bet {} on {} workers (seed {})",
            settings.spins,
            settings.bet,
            workers,
            settings.seed
        );

        let started = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| SimError::InvalidSettings(e.to_string()))?;

        let per_worker: Vec<SessionStats> = pool.install(|| {
            shares
                .par_iter()
                .enumerate()
                .map(|(worker, &spins)| self.run_worker(settings, worker, spins))
                .collect::<SimResult<Vec<_>>>()
        })?;

        let mut stats = SessionStats::default();
        for worker_stats in &per_worker {
            stats.merge(worker_stats);
        }

        let report = SimulationReport::new(
            settings.clone(),
            workers,
            stats,
            started.elapsed().as_millis() as u64,
        );
        log::info!("simulation done: RTP {:.2}%", report.rtp);
        Ok(report)
    }

    /// Play one seeded spin at an on-ladder bet
    pub fn spin_once(&self, bet: f64, seed: u64) -> SimResult<SpinOutcome> {
        self.check_bet(bet)?;
        let mut engine = SlotEngine::seeded(self.game.clone(), seed)?;
        Ok(engine.spin(bet)?)
    }

    /// Bound a declared payout for `grid`; no RNG involved
    pub fn reconcile(&self, grid: &Grid, bet: f64, declared: f64) -> SimResult<Reconciliation> {
        let catalog = SymbolCatalog::from_config(&self.game)?;
        Ok(SpinReconciler::new(&self.game, &catalog).reconcile(grid, bet, declared)?)
    }

    fn check_bet(&self, bet: f64) -> SimResult<()> {
        if !self.game.bet_ladder().contains(bet) {
            return Err(SimError::InvalidSettings(format!(
                "bet {} is not on the bet ladder",
                bet
            )));
        }
        Ok(())
    }

    fn run_worker(
        &self,
        settings: &SimulationConfig,
        worker: usize,
        spins: u64,
    ) -> SimResult<SessionStats> {
        let seed = settings
            .seed
            .wrapping_add((worker as u64).wrapping_mul(WORKER_SEED_STRIDE));
        let mut engine = SlotEngine::seeded(self.game.clone(), seed)?;
        for _ in 0..spins {
            engine.spin(settings.bet)?;
        }
        log::debug!("worker {} finished {} spins", worker, spins);
        Ok(engine.stats().clone())
    }
}

/// Split `total` into `parts` shares differing by at most one
pub fn split_budget(total: u64, parts: usize) -> Vec<u64> {
    let parts = parts.max(1) as u64;
    let base = total / parts;
    let extra = total % parts;
    (0..parts).map(|i| base + u64::from(i < extra)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_budget() {
        assert_eq!(split_budget(10, 3), vec![4, 3, 3]);
        assert_eq!(split_budget(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(split_budget(9, 0), vec![9]);
        assert_eq!(split_budget(1000, 7).iter().sum::<u64>(), 1000);
    }

    #[test]
    fn test_effective_workers() {
        let settings = SimulationConfig::default().with_spins(3).with_workers(8);
        assert_eq!(settings.effective_workers(), 3);
        assert!(SimulationConfig::default().effective_workers() >= 1);
    }

    #[test]
    fn test_run_counts_every_spin() {
        let sim = Simulator::new(GameConfig::default()).unwrap();
        let settings = SimulationConfig::default()
            .with_spins(500)
            .with_workers(4)
            .with_seed(11);
        let report = sim.run(&settings).unwrap();
        assert_eq!(report.stats.total_spins, 500);
        assert_eq!(report.workers, 4);
        assert!(report.rtp >= 0.0);
        assert!(report.summary().contains("500 spins"));
    }

    #[test]
    fn test_same_seed_same_report() {
        let sim = Simulator::new(GameConfig::default()).unwrap();
        let settings = SimulationConfig::default()
            .with_spins(300)
            .with_workers(3)
            .with_seed(5);
        let a = sim.run(&settings).unwrap();
        let b = sim.run(&settings).unwrap();
        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn test_off_ladder_bet_rejected() {
        let sim = Simulator::new(GameConfig::default()).unwrap();
        let settings = SimulationConfig::default().with_bet(250.0).with_spins(10);
        assert!(matches!(sim.run(&settings), Err(SimError::InvalidSettings(_))));
        assert!(matches!(sim.spin_once(250.0, 1), Err(SimError::InvalidSettings(_))));
        assert!(matches!(sim.spin_once(6000.0, 1), Err(SimError::InvalidSettings(_))));
    }

    #[test]
    fn test_spin_once_is_reproducible() {
        let sim = Simulator::new(GameConfig::default()).unwrap();
        let first = sim.spin_once(600.0, 11).unwrap();
        let second = sim.spin_once(600.0, 11).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.result.bet, 600.0);
    }

    #[test]
    fn test_reconcile_clamps_to_bound() {
        let sim = Simulator::new(GameConfig::default()).unwrap();
        let grid = Grid::from_rows(&vec![vec![7u8; 7]; 7]).unwrap();
        let reconciliation = sim.reconcile(&grid, 200.0, 1_000_000.0).unwrap();
        assert!(reconciliation.was_clamped());
        assert_eq!(reconciliation.accepted, reconciliation.bound);

        let honest = sim.reconcile(&grid, 200.0, 10.0).unwrap();
        assert_eq!(honest.accepted, 10.0);
        assert!(matches!(
            sim.reconcile(&grid, 200.0, -1.0),
            Err(SimError::Engine(_))
        ));
    }
}
