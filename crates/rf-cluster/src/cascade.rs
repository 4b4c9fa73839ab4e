//! Cascade resolution
//!
//! ```text
//! grid ──► detect ──► none? ──► done
//!            │
//!            └─► payout ──► clear ──► gravity ──► refill ──► (next round)
//! ```

use rand::RngCore;

use crate::catalog::SymbolCatalog;
use crate::cluster::{self, ClusterDetector};
use crate::config::GameConfig;
use crate::error::{ClusterError, ClusterResult};
use crate::generator::GridGenerator;
use crate::grid::Grid;
use crate::payout::{self, PayoutCalculator};
use crate::spin::{CascadeStep, SpinMode, SpinResult};

/// Drop every symbol in a column as far down as it goes, keeping relative order
///
/// Scans bottom to top; each non-empty cell moves to the lowest free row and
/// its origin becomes EMPTY. Cells never cross each other.
pub fn compact_column(grid: &mut Grid, col: usize) {
    let size = grid.size();
    let mut floor = size;
    for row in (0..size).rev() {
        if let Some(symbol) = grid.get(row, col) {
            floor -= 1;
            if floor != row {
                grid.set(floor, col, Some(symbol));
                grid.set(row, col, None);
            }
        }
    }
}

/// Gravity-drop every column
pub fn compact(grid: &mut Grid) {
    for col in 0..grid.size() {
        compact_column(grid, col);
    }
}

/// Runs detect → payout → clear → drop → refill until the grid is stable
pub struct CascadeResolver<'a, R: RngCore + ?Sized> {
    config: &'a GameConfig,
    catalog: &'a SymbolCatalog,
    detector: ClusterDetector,
    generator: GridGenerator<'a, R>,
}

impl<'a, R: RngCore + ?Sized> CascadeResolver<'a, R> {
    pub fn new(config: &'a GameConfig, catalog: &'a SymbolCatalog, rng: &'a mut R) -> Self {
        Self {
            config,
            catalog,
            detector: ClusterDetector::new(config),
            generator: GridGenerator::new(config, catalog, rng),
        }
    }

    /// Generator sharing this resolver's RNG stream
    pub fn generator(&mut self) -> &mut GridGenerator<'a, R> {
        &mut self.generator
    }

    /// Resolve a full grid into a [`SpinResult`]
    pub fn resolve(&mut self, initial: &Grid, bet: f64) -> ClusterResult<SpinResult> {
        initial.validate(self.config.grid_size, self.config.symbol_count, false)?;
        payout::validate_bet(bet)?;

        let payouts = PayoutCalculator::new(self.catalog);
        let mut grid = initial.clone();
        let mut steps: Vec<CascadeStep> = Vec::new();

        loop {
            let clusters = cluster::flatten(self.detector.find_clusters(&grid)?);
            if clusters.is_empty() {
                break;
            }
            if steps.len() as u32 >= self.config.max_cascade_steps {
                log::error!(
                    "cascade still matching after {} steps, aborting spin",
                    self.config.max_cascade_steps
                );
                return Err(ClusterError::CascadeLimit {
                    steps: self.config.max_cascade_steps,
                });
            }

            let wins = payouts.wins(&clusters, bet)?;
            let round_payout: f64 = wins.iter().map(|w| w.amount).sum();

            let mut cleared = grid.clone();
            for cell in clusters.iter().flat_map(|c| c.cells.iter()) {
                cleared.clear(*cell);
            }

            let mut refilled = cleared.clone();
            compact(&mut refilled);
            self.generator.refill(&mut refilled);

            log::debug!(
                "cascade step {}: {} clusters, {} cells, payout {:.2}",
                steps.len(),
                clusters.len(),
                cleared.empty_count(),
                round_payout
            );

            grid = refilled.clone();
            steps.push(CascadeStep {
                step_index: steps.len() as u32,
                clusters,
                wins,
                payout: round_payout,
                grid_after_clear: cleared,
                grid_after_refill: refilled,
            });
        }

        let total_payout: f64 = steps.iter().map(|s| s.payout).sum();
        let scatter_count = initial.count(self.catalog.scatter());

        Ok(SpinResult {
            initial_grid: initial.clone(),
            steps,
            final_grid: grid,
            bet,
            total_payout,
            win_ratio: total_payout / bet,
            scatter_count,
            bonus_triggered: scatter_count >= self.config.bonus_trigger_count,
            retriggered: scatter_count >= self.config.retrigger_count,
            mode: SpinMode::Base,
        })
    }
}
