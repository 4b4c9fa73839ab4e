//! Spin results

use serde::{Deserialize, Serialize};

use crate::cluster::Cluster;
use crate::grid::Grid;
use crate::payout::ClusterWin;

/// Whether a spin was played in base game or inside a bonus session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinMode {
    #[default]
    Base,
    Bonus,
}

/// One clear-and-refill round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStep {
    /// Round index, 0-based
    pub step_index: u32,
    /// Clusters matched this round
    pub clusters: Vec<Cluster>,
    /// Per-cluster wins, same order as `clusters`
    pub wins: Vec<ClusterWin>,
    /// Round payout
    pub payout: f64,
    /// Grid with matched cells EMPTY, before gravity
    pub grid_after_clear: Grid,
    /// Grid after gravity and refill
    pub grid_after_refill: Grid,
}

impl CascadeStep {
    /// Cells removed this round
    pub fn cleared_cells(&self) -> usize {
        self.clusters.iter().map(Cluster::size).sum()
    }
}

/// Complete outcome of resolving one grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    /// Grid the spin started from
    pub initial_grid: Grid,
    /// Cascade rounds in order
    pub steps: Vec<CascadeStep>,
    /// Grid once no more clusters form
    pub final_grid: Grid,
    /// Bet the payouts are based on
    pub bet: f64,
    /// Sum of step payouts
    pub total_payout: f64,
    /// Win-to-bet ratio
    pub win_ratio: f64,
    /// Scatters on the initial grid
    pub scatter_count: usize,
    /// Initial grid meets the bonus entry threshold
    pub bonus_triggered: bool,
    /// Initial grid meets the retrigger threshold (only acted on inside bonus mode)
    pub retriggered: bool,
    /// Base or bonus spin
    #[serde(default)]
    pub mode: SpinMode,
}

impl SpinResult {
    /// Check if this is a win
    pub fn is_win(&self) -> bool {
        self.total_payout > 0.0
    }

    /// Number of cascade rounds
    pub fn cascade_count(&self) -> usize {
        self.steps.len()
    }

    /// Builder: tag the mode
    pub fn with_mode(mut self, mode: SpinMode) -> Self {
        self.mode = mode;
        self
    }

    /// Accounting view of this spin
    pub fn tally(&self) -> SpinTally {
        SpinTally {
            bet: self.bet,
            payout: self.total_payout,
            scatter_count: self.scatter_count,
        }
    }
}

/// The three numbers bonus bookkeeping and balance settlement need
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinTally {
    pub bet: f64,
    pub payout: f64,
    /// Scatters on the spin's initial grid
    pub scatter_count: usize,
}
