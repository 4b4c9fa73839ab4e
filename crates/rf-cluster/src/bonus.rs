//! Free-spins bonus state machine
//!
//! ```text
//!            ≥ trigger scatters on a base spin
//! Inactive ───────────────────────────────────► Active(free_spins, 0)
//!    ▲                                              │  each bonus spin:
//!    │                                              │    ≥ retrigger scatters → +retrigger_spins
//!    │                                              │    remaining -= 1, cumulative += payout
//!    └────────────── remaining == 0 ◄───────────────┘
//!                 (cumulative paid out)
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::SymbolCatalog;
use crate::config::GameConfig;
use crate::error::{ClusterError, ClusterResult};
use crate::grid::Grid;
use crate::spin::SpinTally;

/// Counts and thresholds driving the bonus machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusRules {
    pub trigger_count: usize,
    pub retrigger_count: usize,
    pub free_spins: u32,
    pub retrigger_spins: u32,
}

impl BonusRules {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            trigger_count: config.bonus_trigger_count,
            retrigger_count: config.retrigger_count,
            free_spins: config.free_spins,
            retrigger_spins: config.retrigger_spins,
        }
    }
}

impl Default for BonusRules {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

/// Running free-spins session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BonusSession {
    /// Free spins left to play
    pub remaining_spins: u32,
    /// Winnings held back until the session ends
    pub cumulative_payout: f64,
    pub spins_played: u32,
    pub retriggers: u32,
    /// Entry award plus every retrigger award
    pub awarded_spins: u32,
    /// Bet of the spin that opened the session; free spins are played at it
    pub trigger_bet: f64,
}

/// Bonus mode of one player
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BonusState {
    #[default]
    Inactive,
    Active(BonusSession),
}

/// What a spin did to the bonus machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BonusEvent {
    /// Base spin, no entry
    Idle,
    /// Base spin opened a session
    Entered { free_spins: u32 },
    /// Bonus spin played, session still running
    Continuing { remaining: u32, retriggered: bool },
    /// Last free spin played; `payout` is released to the balance.
    /// A retrigger adds spins, so the finishing spin is never a retrigger.
    Finished {
        payout: f64,
        spins_played: u32,
        retriggers: u32,
    },
}

/// Money movement of one spin after bonus bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Taken from the balance before the spin
    pub charged: f64,
    /// Added to the balance after the spin
    pub credited: f64,
    pub event: BonusEvent,
}

impl Settlement {
    /// Net balance change
    pub fn net(&self) -> f64 {
        self.credited - self.charged
    }
}

impl BonusState {
    pub fn is_active(&self) -> bool {
        matches!(self, BonusState::Active(_))
    }

    /// Free spins left, 0 when inactive
    pub fn remaining_spins(&self) -> u32 {
        match self {
            BonusState::Active(session) => session.remaining_spins,
            BonusState::Inactive => 0,
        }
    }

    /// Bet free spins are played at, if a session is running
    pub fn session_bet(&self) -> Option<f64> {
        match self {
            BonusState::Active(session) => Some(session.trigger_bet),
            BonusState::Inactive => None,
        }
    }

    /// Feed a base-game spin. Enters bonus mode on enough scatters.
    ///
    /// Must not be called while a session runs; bonus spins go through
    /// [`BonusState::apply_bonus_spin`].
    pub fn observe_base_spin(&mut self, tally: &SpinTally, rules: &BonusRules) -> BonusEvent {
        if self.is_active() || tally.scatter_count < rules.trigger_count {
            return BonusEvent::Idle;
        }

        log::info!(
            "bonus triggered by {} scatters: {} free spins at bet {}",
            tally.scatter_count,
            rules.free_spins,
            tally.bet
        );
        *self = BonusState::Active(BonusSession {
            remaining_spins: rules.free_spins,
            cumulative_payout: 0.0,
            spins_played: 0,
            retriggers: 0,
            awarded_spins: rules.free_spins,
            trigger_bet: tally.bet,
        });
        BonusEvent::Entered {
            free_spins: rules.free_spins,
        }
    }

    /// Feed a spin played inside the bonus session
    ///
    /// The retrigger award lands before the decrement, so retriggering on the
    /// last free spin keeps the session alive.
    pub fn apply_bonus_spin(
        &mut self,
        tally: &SpinTally,
        rules: &BonusRules,
    ) -> ClusterResult<BonusEvent> {
        let BonusState::Active(session) = self else {
            return Err(ClusterError::BonusInactive);
        };

        let retriggered = tally.scatter_count >= rules.retrigger_count;
        if retriggered {
            session.remaining_spins += rules.retrigger_spins;
            session.awarded_spins += rules.retrigger_spins;
            session.retriggers += 1;
            log::info!(
                "bonus retriggered: +{} spins, {} remaining",
                rules.retrigger_spins,
                session.remaining_spins
            );
        }

        session.remaining_spins = session.remaining_spins.saturating_sub(1);
        session.spins_played += 1;
        session.cumulative_payout += tally.payout;

        if session.remaining_spins > 0 {
            return Ok(BonusEvent::Continuing {
                remaining: session.remaining_spins,
                retriggered,
            });
        }

        let event = BonusEvent::Finished {
            payout: session.cumulative_payout,
            spins_played: session.spins_played,
            retriggers: session.retriggers,
        };
        log::info!(
            "bonus finished after {} spins ({} retriggers), paying {:.2}",
            session.spins_played,
            session.retriggers,
            session.cumulative_payout
        );
        *self = BonusState::Inactive;
        Ok(event)
    }

    /// Route a resolved spin through the machine and work out the money
    ///
    /// Base spins charge the bet and pay straight away. Bonus spins charge
    /// nothing and only pay, in one lump, when the session finishes.
    pub fn settle(&mut self, tally: &SpinTally, rules: &BonusRules) -> ClusterResult<Settlement> {
        if self.is_active() {
            let event = self.apply_bonus_spin(tally, rules)?;
            let credited = match event {
                BonusEvent::Finished { payout, .. } => payout,
                _ => 0.0,
            };
            return Ok(Settlement {
                charged: 0.0,
                credited,
                event,
            });
        }

        let event = self.observe_base_spin(tally, rules);
        Ok(Settlement {
            charged: tally.bet,
            credited: tally.payout,
            event,
        })
    }
}

/// Scatters anywhere on the grid
pub fn scatter_count(grid: &Grid, catalog: &SymbolCatalog) -> usize {
    grid.count(catalog.scatter())
}

/// Grid qualifies for bonus entry
pub fn check_bonus_trigger(grid: &Grid, catalog: &SymbolCatalog, rules: &BonusRules) -> bool {
    scatter_count(grid, catalog) >= rules.trigger_count
}

/// Grid qualifies for a retrigger (only meaningful inside a session)
pub fn check_retrigger(grid: &Grid, catalog: &SymbolCatalog, rules: &BonusRules) -> bool {
    scatter_count(grid, catalog) >= rules.retrigger_count
}
