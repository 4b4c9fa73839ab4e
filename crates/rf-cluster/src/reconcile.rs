//! Sanity bound for client-declared payouts
//!
//! The bound ignores connectivity: every symbol with at least `cluster_size`
//! copies anywhere on the grid is assumed to pay, scaled by its tier and by
//! how many clusters its count could cover (capped at 3).

use serde::{Deserialize, Serialize};

use crate::catalog::SymbolCatalog;
use crate::config::GameConfig;
use crate::error::{ClusterError, ClusterResult};
use crate::grid::Grid;
use crate::payout;

/// Most clusters a single symbol is credited with
const MAX_CLUSTER_FACTOR: f64 = 3.0;

/// Outcome of checking one declared payout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub declared: f64,
    pub bound: f64,
    /// `min(declared, bound)`
    pub accepted: f64,
}

impl Reconciliation {
    pub fn was_clamped(&self) -> bool {
        self.accepted < self.declared
    }
}

/// Clamps declared payouts to the grid's estimated ceiling
pub struct SpinReconciler<'a> {
    config: &'a GameConfig,
    catalog: &'a SymbolCatalog,
}

impl<'a> SpinReconciler<'a> {
    pub fn new(config: &'a GameConfig, catalog: &'a SymbolCatalog) -> Self {
        Self { config, catalog }
    }

    /// Upper estimate of what `grid` can pay at `bet`
    pub fn estimate_bound(&self, grid: &Grid, bet: f64) -> ClusterResult<f64> {
        grid.validate(self.config.grid_size, self.config.symbol_count, false)?;
        payout::validate_bet(bet)?;

        let cluster_size = self.catalog.cluster_size() as f64;
        Ok(self
            .catalog
            .symbols()
            .map(|symbol| (symbol, grid.count(symbol)))
            .filter(|(_, count)| *count >= self.catalog.cluster_size())
            .map(|(symbol, count)| {
                let clusters = (count as f64 / cluster_size).min(MAX_CLUSTER_FACTOR);
                bet * self.catalog.simplified_multiplier(symbol) * clusters
            })
            .sum())
    }

    /// Accept a declared payout, clamped to the bound
    pub fn reconcile(&self, grid: &Grid, bet: f64, declared: f64) -> ClusterResult<Reconciliation> {
        if !declared.is_finite() || declared < 0.0 {
            return Err(ClusterError::InvalidPayout(declared));
        }
        let bound = self.estimate_bound(grid, bet)?;
        let accepted = declared.min(bound);
        if accepted < declared {
            log::warn!(
                "declared payout {:.2} exceeds grid bound {:.2}, clamped",
                declared,
                bound
            );
        }
        Ok(Reconciliation {
            declared,
            bound,
            accepted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn setup() -> (GameConfig, SymbolCatalog) {
        let config = GameConfig::default();
        let catalog = SymbolCatalog::from_config(&config).unwrap();
        (config, catalog)
    }

    /// Columns cycle through symbols 0..7; each appears on exactly one column
    /// (7 cells), no scatter
    fn striped() -> Grid {
        let rows: Vec<Vec<u8>> = (0..7).map(|_| (0..7).map(|c| c as u8).collect()).collect();
        Grid::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_bound_on_striped_grid() {
        let (config, catalog) = setup();
        let reconciler = SpinReconciler::new(&config, &catalog);
        // Each of symbols 0..=6 counts 7: factor 1.4
        // tiers: 0.5 + 0.5 + 1 + 1 + 2 + 2 + 4 = 11
        let bound = reconciler.estimate_bound(&striped(), 200.0).unwrap();
        assert_relative_eq!(bound, 200.0 * 11.0 * 1.4, epsilon = 1e-9);
    }

    #[test]
    fn test_cluster_factor_is_capped() {
        let (config, catalog) = setup();
        let reconciler = SpinReconciler::new(&config, &catalog);
        let grid = Grid::from_rows(&vec![vec![6u8; 7]; 7]).unwrap();
        let bound = reconciler.estimate_bound(&grid, 200.0).unwrap();
        assert_relative_eq!(bound, 200.0 * 4.0 * 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_only_qualifying_symbols_count() {
        let (config, catalog) = setup();
        let reconciler = SpinReconciler::new(&config, &catalog);
        // First 36 cells cycle 0..9 (4 copies each), the rest are symbol 0
        let rows: Vec<Vec<u8>> = (0..7)
            .map(|r| {
                (0..7)
                    .map(|c| {
                        let i = r * 7 + c;
                        if i < 36 { (i % 9) as u8 } else { 0 }
                    })
                    .collect()
            })
            .collect();
        let grid = Grid::from_rows(&rows).unwrap();
        // symbol 0: 4 + 13 = 17 copies, symbols 1..=8: 4 copies each
        let bound = reconciler.estimate_bound(&grid, 200.0).unwrap();
        assert_relative_eq!(bound, 200.0 * 0.5 * 3.0, epsilon = 1e-9);

        let reconciled = reconciler.reconcile(&grid, 200.0, 0.0).unwrap();
        assert_eq!(reconciled.accepted, 0.0);
        assert!(!reconciled.was_clamped());
    }

    #[test]
    fn test_declared_above_bound_is_clamped() {
        let (config, catalog) = setup();
        let reconciler = SpinReconciler::new(&config, &catalog);
        let grid = striped();
        let bound = reconciler.estimate_bound(&grid, 600.0).unwrap();

        let result = reconciler.reconcile(&grid, 600.0, 1_000_000.0).unwrap();
        assert!(result.was_clamped());
        assert_relative_eq!(result.accepted, bound);

        let honest = reconciler.reconcile(&grid, 600.0, 120.0).unwrap();
        assert!(!honest.was_clamped());
        assert_eq!(honest.accepted, 120.0);
    }

    #[test]
    fn test_invalid_declared_payout() {
        let (config, catalog) = setup();
        let reconciler = SpinReconciler::new(&config, &catalog);
        for declared in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                reconciler.reconcile(&striped(), 200.0, declared),
                Err(ClusterError::InvalidPayout(_))
            ));
        }
    }

    #[test]
    fn test_scatter_counts_toward_bound() {
        let (config, catalog) = setup();
        let reconciler = SpinReconciler::new(&config, &catalog);
        let mut rows: Vec<Vec<u8>> = (0..7)
            .map(|r| (0..7).map(|c| ((r + c) % 2) as u8).collect())
            .collect();
        for col in 0..5 {
            rows[0][col] = 8;
        }
        let grid = Grid::from_rows(&rows).unwrap();
        let counts_0 = grid.count(crate::catalog::Symbol(0)) as f64;
        let counts_1 = grid.count(crate::catalog::Symbol(1)) as f64;
        let expected = 100.0 * 0.5 * (counts_0 / 5.0).min(3.0)
            + 100.0 * 0.5 * (counts_1 / 5.0).min(3.0)
            + 100.0 * 10.0 * 1.0;
        let bound = reconciler.estimate_bound(&grid, 100.0).unwrap();
        assert_relative_eq!(bound, expected, epsilon = 1e-9);
    }
}
