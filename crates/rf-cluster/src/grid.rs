//! Square symbol grid with value semantics
//!
//! Cells hold `Some(symbol)` or `None` (EMPTY). Empty cells only exist between
//! clearing and refill inside a cascade round. Every snapshot is an owned copy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Symbol;
use crate::error::{ClusterError, ClusterResult};

/// A cell coordinate, row 0 is the top
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Row-major wire form: one inner vec per row, `null` for EMPTY
pub type GridRows = Vec<Vec<Option<u8>>>;

/// Fixed-size square grid
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "GridRows", into = "GridRows")]
pub struct Grid {
    size: usize,
    cells: Vec<Option<Symbol>>,
}

impl Grid {
    /// An all-EMPTY grid
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// Build a full grid from rows of symbol ids
    pub fn from_rows(rows: &[Vec<u8>]) -> ClusterResult<Self> {
        let rows: GridRows = rows
            .iter()
            .map(|row| row.iter().map(|&id| Some(id)).collect())
            .collect();
        Self::try_from(rows)
    }

    /// Edge length
    pub fn size(&self) -> usize {
        self.size
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.size && col < self.size).then_some(row * self.size + col)
    }

    /// Cell content, `None` for EMPTY or out of bounds
    pub fn get(&self, row: usize, col: usize) -> Option<Symbol> {
        self.index(row, col)
            .and_then(|i| self.cells.get(i).copied())
            .flatten()
    }

    /// Cell content at a position
    pub fn at(&self, pos: Position) -> Option<Symbol> {
        self.get(pos.row, pos.col)
    }

    /// Overwrite a cell; out-of-bounds writes are ignored
    pub fn set(&mut self, row: usize, col: usize, cell: Option<Symbol>) {
        if let Some(slot) = self.index(row, col).and_then(|i| self.cells.get_mut(i)) {
            *slot = cell;
        }
    }

    /// Mark a cell EMPTY
    pub fn clear(&mut self, pos: Position) {
        self.set(pos.row, pos.col, None);
    }

    /// All positions, row-major
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.size).flat_map(move |row| (0..self.size).map(move |col| Position::new(row, col)))
    }

    /// In-bounds 4-directional neighbors (up, down, left, right)
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        let Position { row, col } = pos;
        [
            row.checked_sub(1).map(|r| Position::new(r, col)),
            (row + 1 < self.size).then(|| Position::new(row + 1, col)),
            col.checked_sub(1).map(|c| Position::new(row, c)),
            (col + 1 < self.size).then(|| Position::new(row, col + 1)),
        ]
        .into_iter()
        .flatten()
    }

    /// Occurrences of a symbol anywhere on the grid
    pub fn count(&self, symbol: Symbol) -> usize {
        self.cells.iter().filter(|c| **c == Some(symbol)).count()
    }

    /// Occurrences of a symbol in one column
    pub fn count_in_column(&self, col: usize, symbol: Symbol) -> usize {
        (0..self.size)
            .filter(|&row| self.get(row, col) == Some(symbol))
            .count()
    }

    /// Number of EMPTY cells
    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    /// True when no cell is EMPTY
    pub fn is_full(&self) -> bool {
        self.empty_count() == 0
    }

    /// One column, top to bottom
    pub fn column(&self, col: usize) -> Vec<Option<Symbol>> {
        (0..self.size).map(|row| self.get(row, col)).collect()
    }

    /// Row-major copy as raw ids
    pub fn to_rows(&self) -> GridRows {
        self.cells
            .chunks(self.size.max(1))
            .map(|row| row.iter().map(|c| c.map(Symbol::id)).collect())
            .collect()
    }

    /// Check dimensions and symbol range; `allow_empty` admits mid-cascade grids
    pub fn validate(&self, size: usize, symbol_count: usize, allow_empty: bool) -> ClusterResult<()> {
        if self.size != size || self.cells.len() != size * size {
            return Err(ClusterError::InvalidGrid(format!(
                "expected {}x{} grid, got {}x{}",
                size, size, self.size, self.size
            )));
        }
        for pos in self.positions() {
            match self.at(pos) {
                Some(symbol) if symbol.index() >= symbol_count => {
                    return Err(ClusterError::InvalidGrid(format!(
                        "symbol {} at ({}, {}) outside 0..{}",
                        symbol, pos.row, pos.col, symbol_count
                    )));
                }
                None if !allow_empty => {
                    return Err(ClusterError::InvalidGrid(format!(
                        "empty cell at ({}, {})",
                        pos.row, pos.col
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Check scatter placement a generated grid obeys: at most one per
    /// column and at most `max_total` overall
    pub fn validate_scatters(&self, scatter: Symbol, max_total: usize) -> ClusterResult<()> {
        if let Some(col) = (0..self.size).find(|&col| self.count_in_column(col, scatter) > 1) {
            return Err(ClusterError::InvalidGrid(format!(
                "{} scatters in column {}",
                self.count_in_column(col, scatter),
                col
            )));
        }
        let total = self.count(scatter);
        if total > max_total {
            return Err(ClusterError::InvalidGrid(format!(
                "{} scatters, at most {} allowed",
                total, max_total
            )));
        }
        Ok(())
    }
}

impl TryFrom<GridRows> for Grid {
    type Error = ClusterError;

    fn try_from(rows: GridRows) -> ClusterResult<Self> {
        let size = rows.len();
        let mut grid = Self::empty(size);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != size {
                return Err(ClusterError::InvalidGrid(format!(
                    "row {} has {} cells, expected {}",
                    row,
                    values.len(),
                    size
                )));
            }
            for (col, id) in values.into_iter().enumerate() {
                grid.set(row, col, id.map(Symbol));
            }
        }
        Ok(grid)
    }
}

impl From<Grid> for GridRows {
    fn from(grid: Grid) -> Self {
        grid.to_rows()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size {
            for col in 0..self.size {
                if col > 0 {
                    write!(f, " ")?;
                }
                match self.get(row, col) {
                    Some(symbol) => write!(f, "{}", symbol)?,
                    None => write!(f, ".")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
