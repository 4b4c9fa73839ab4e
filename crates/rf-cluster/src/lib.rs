//! # rf-cluster - Cascading Cluster-Pays Slot Engine
//!
//! Resolves spins on a square grid where groups of orthogonally connected,
//! identical symbols pay, vanish, and are replaced by gravity plus refill
//! until nothing more connects. Scatters open a free-spins bonus.
//!
//! ## Features
//!
//! - **Grid Generation**: weighted draws with neighbor bias, scatter placement limits
//! - **Cluster Detection**: 4-connected flood fill, minimum size threshold
//! - **Cascades**: clear, column gravity, biased refill, capped iteration count
//! - **Bonus Mode**: free spins with retriggers and deferred payout
//! - **Reconciliation**: sanity bound for client-declared payouts
//!
//! ## Architecture
//!
//! ```text
//! SlotEngine
//!     │
//!     ├── GameConfig ──► SymbolCatalog (weights, payout table, tiers)
//!     │
//!     ├── GridGenerator ──► Grid
//!     │                      │
//!     │                      v
//!     ├── CascadeResolver ── ClusterDetector → PayoutCalculator → compact → refill
//!     │                      │
//!     │                      v
//!     │                  SpinResult
//!     │                      │
//!     ├── BonusState ◄───────┘ (SpinTally → Settlement)
//!     │
//!     └── SpinReconciler (declared payout → min(declared, bound))
//! ```
//!
//! Randomness is injected: every component takes a `RngCore`, and
//! [`SlotEngine::seeded`] gives a reproducible `ChaCha8Rng` stream.

pub mod bonus;
pub mod cascade;
pub mod catalog;
pub mod cluster;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod grid;
pub mod payout;
pub mod reconcile;
pub mod spin;

pub use bonus::{BonusEvent, BonusRules, BonusSession, BonusState, Settlement};
pub use cascade::CascadeResolver;
pub use catalog::{Symbol, SymbolCatalog, SymbolTier};
pub use cluster::{Cluster, ClusterDetector, ClusterMap};
pub use config::*;
pub use engine::*;
pub use error::*;
pub use generator::GridGenerator;
pub use grid::{Grid, GridRows, Position};
pub use payout::{ClusterWin, PayoutCalculator};
pub use reconcile::{Reconciliation, SpinReconciler};
pub use spin::*;
