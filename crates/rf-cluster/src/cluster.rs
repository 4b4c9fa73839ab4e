//! Cluster detection: 4-connected same-symbol components

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Symbol;
use crate::config::GameConfig;
use crate::error::ClusterResult;
use crate::grid::{Grid, Position};

/// A paying group of connected same-symbol cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Symbol shared by every cell
    pub symbol: Symbol,
    /// Member cells, row-major order
    pub cells: Vec<Position>,
}

impl Cluster {
    /// Number of cells
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Check membership
    pub fn contains(&self, pos: Position) -> bool {
        self.cells.binary_search(&pos).is_ok()
    }
}

/// Clusters grouped by symbol, iterated in symbol order
pub type ClusterMap = BTreeMap<Symbol, Vec<Cluster>>;

/// Flatten a cluster map into one list, symbol order then discovery order
pub fn flatten(map: ClusterMap) -> Vec<Cluster> {
    map.into_values().flatten().collect()
}

/// Finds every same-symbol component of at least `cluster_size` cells
#[derive(Debug, Clone, Copy)]
pub struct ClusterDetector {
    grid_size: usize,
    symbol_count: usize,
    cluster_size: usize,
}

impl ClusterDetector {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            grid_size: config.grid_size,
            symbol_count: config.symbol_count,
            cluster_size: config.cluster_size,
        }
    }

    /// Scan a grid. EMPTY cells never join or form a cluster.
    ///
    /// Smaller components are still flood-filled (so their cells are marked
    /// visited) and then dropped.
    pub fn find_clusters(&self, grid: &Grid) -> ClusterResult<ClusterMap> {
        grid.validate(self.grid_size, self.symbol_count, true)?;

        let size = grid.size();
        let mut visited = vec![false; size * size];
        let mut clusters = ClusterMap::new();
        let mut stack = Vec::new();

        for start in grid.positions() {
            let start_idx = start.row * size + start.col;
            if visited[start_idx] {
                continue;
            }
            visited[start_idx] = true;

            let Some(symbol) = grid.at(start) else {
                continue;
            };

            let mut cells = vec![start];
            stack.push(start);
            while let Some(pos) = stack.pop() {
                for next in grid.neighbors(pos) {
                    let idx = next.row * size + next.col;
                    if !visited[idx] && grid.at(next) == Some(symbol) {
                        visited[idx] = true;
                        cells.push(next);
                        stack.push(next);
                    }
                }
            }

            if cells.len() >= self.cluster_size {
                cells.sort_unstable();
                clusters
                    .entry(symbol)
                    .or_default()
                    .push(Cluster { symbol, cells });
            }
        }

        Ok(clusters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClusterError;

    fn detector() -> ClusterDetector {
        ClusterDetector::new(&GameConfig::default())
    }

    /// Checkerboard of 0/1: no two equal neighbors anywhere
    fn checkerboard() -> Vec<Vec<u8>> {
        (0..7)
            .map(|r| (0..7).map(|c| ((r + c) % 2) as u8).collect())
            .collect()
    }

    #[test]
    fn test_no_clusters_on_checkerboard() {
        let grid = Grid::from_rows(&checkerboard()).unwrap();
        assert!(detector().find_clusters(&grid).unwrap().is_empty());
    }

    #[test]
    fn test_block_cluster() {
        let mut rows = checkerboard();
        for row in rows.iter_mut().take(3) {
            for cell in row.iter_mut().take(3) {
                *cell = 3;
            }
        }
        let grid = Grid::from_rows(&rows).unwrap();
        let clusters = detector().find_clusters(&grid).unwrap();

        assert_eq!(clusters.len(), 1);
        let found = &clusters[&Symbol(3)];
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].size(), 9);
        assert!(found[0].contains(Position::new(2, 2)));
        assert!(!found[0].contains(Position::new(3, 3)));
    }

    #[test]
    fn test_four_cells_do_not_pay() {
        let mut rows = checkerboard();
        rows[0][0] = 5;
        rows[0][1] = 5;
        rows[0][2] = 5;
        rows[1][1] = 5;
        let grid = Grid::from_rows(&rows).unwrap();
        assert!(detector().find_clusters(&grid).unwrap().is_empty());
    }

    #[test]
    fn test_diagonal_is_not_connected() {
        let mut rows = checkerboard();
        for i in 0..7 {
            rows[i][i] = 6;
        }
        let grid = Grid::from_rows(&rows).unwrap();
        assert!(detector().find_clusters(&grid).unwrap().is_empty());
    }

    #[test]
    fn test_two_separate_clusters_same_symbol() {
        let mut rows = checkerboard();
        for col in 0..5 {
            rows[0][col] = 4;
            rows[6][col] = 4;
        }
        let grid = Grid::from_rows(&rows).unwrap();
        let clusters = detector().find_clusters(&grid).unwrap();
        let fours = &clusters[&Symbol(4)];
        assert_eq!(fours.len(), 2);
        assert!(fours.iter().all(|c| c.size() == 5));
        assert!(fours[0].cells.iter().all(|p| !fours[1].contains(*p)));
    }

    #[test]
    fn test_snake_shape_is_one_cluster() {
        let mut rows = checkerboard();
        let path = [(0, 0), (1, 0), (1, 1), (1, 2), (2, 2), (3, 2), (3, 3)];
        for (r, c) in path {
            rows[r][c] = 7;
        }
        let grid = Grid::from_rows(&rows).unwrap();
        let clusters = detector().find_clusters(&grid).unwrap();
        assert_eq!(clusters[&Symbol(7)][0].size(), path.len());
    }

    #[test]
    fn test_empty_cells_never_cluster() {
        let grid = Grid::empty(7);
        assert!(detector().find_clusters(&grid).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_wrong_dimensions() {
        let grid = Grid::from_rows(&[vec![0, 1], vec![1, 0]]).unwrap();
        assert!(matches!(
            detector().find_clusters(&grid),
            Err(ClusterError::InvalidGrid(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_symbol() {
        let mut rows = checkerboard();
        rows[3][3] = 9;
        let grid = Grid::from_rows(&rows).unwrap();
        assert!(detector().find_clusters(&grid).is_err());
    }
}
