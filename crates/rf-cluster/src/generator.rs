//! Grid generation and cascade refill
//!
//! Fresh grids are filled row-major with an adjacency bias that makes clusters
//! form more often than independent draws would. Scatter placement is limited
//! to one per column and `bonus_trigger_count` per grid.

use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use crate::catalog::{Symbol, SymbolCatalog};
use crate::config::GameConfig;
use crate::grid::{Grid, Position};

/// Grid generator bound to a config, a catalog and an injected RNG
pub struct GridGenerator<'a, R: RngCore + ?Sized> {
    config: &'a GameConfig,
    catalog: &'a SymbolCatalog,
    rng: &'a mut R,
}

impl<'a, R: RngCore + ?Sized> GridGenerator<'a, R> {
    pub fn new(config: &'a GameConfig, catalog: &'a SymbolCatalog, rng: &'a mut R) -> Self {
        Self {
            config,
            catalog,
            rng,
        }
    }

    /// Produce a fresh full grid
    pub fn generate(&mut self) -> Grid {
        let size = self.config.grid_size;
        let mut grid = Grid::empty(size);
        let mut scatters = 0usize;
        let mut scatter_columns = vec![false; size];

        for row in 0..size {
            for col in 0..size {
                let mut symbol = self.pick_initial(&grid, row, col);

                if self.catalog.is_scatter(symbol)
                    && (scatters >= self.config.bonus_trigger_count || scatter_columns[col])
                {
                    symbol = self.catalog.sample_non_scatter(&mut *self.rng);
                }

                if self.catalog.is_scatter(symbol) {
                    scatters += 1;
                    scatter_columns[col] = true;
                }
                grid.set(row, col, Some(symbol));
            }
        }

        grid
    }

    /// Copy an already placed neighbor (up or left) or draw from the table
    fn pick_initial(&mut self, grid: &Grid, row: usize, col: usize) -> Symbol {
        let mut placed = Vec::with_capacity(2);
        if row > 0 {
            placed.extend(grid.get(row - 1, col));
        }
        if col > 0 {
            placed.extend(grid.get(row, col - 1));
        }
        self.biased_pick(&placed, self.config.neighbor_bias)
    }

    /// Symbol for an EMPTY cell during a cascade
    ///
    /// Only left/right neighbors are considered: cells above are not filled yet.
    pub fn refill_cell(&mut self, grid: &Grid, row: usize, col: usize) -> Symbol {
        let mut beside = Vec::with_capacity(2);
        if col > 0 {
            beside.extend(grid.get(row, col - 1));
        }
        beside.extend(grid.get(row, col + 1));

        let symbol = self.biased_pick(&beside, self.config.refill_bias);

        if self.config.suppress_refill_scatters && self.catalog.is_scatter(symbol) {
            let scatter = self.catalog.scatter();
            if grid.count(scatter) >= self.config.bonus_trigger_count
                || grid.count_in_column(col, scatter) > 0
            {
                return self.catalog.sample_non_scatter(&mut *self.rng);
            }
        }
        symbol
    }

    /// Refill every EMPTY cell of a grid, columns left to right, each top-down
    pub fn refill(&mut self, grid: &mut Grid) {
        let size = grid.size();
        for col in 0..size {
            for row in 0..size {
                if grid.at(Position::new(row, col)).is_none() {
                    let symbol = self.refill_cell(grid, row, col);
                    grid.set(row, col, Some(symbol));
                }
            }
        }
    }

    fn biased_pick(&mut self, candidates: &[Symbol], bias: f64) -> Symbol {
        if !candidates.is_empty() && self.rng.random_bool(bias) {
            if let Some(symbol) = candidates.choose(&mut *self.rng) {
                return *symbol;
            }
        }
        self.catalog.sample(&mut *self.rng)
    }
}
