//! # rf-cluster-sim - Batch simulator for the cluster-pays engine
//!
//! Library half of the `rf-cluster-sim` binary: parallel RTP runs over
//! seeded engines, plus JSON/YAML game config files.
//!
//! ```text
//! SimulationConfig ──► Simulator ──► rayon workers (SlotEngine::seeded each)
//!                                        │
//!                                        v
//!                          SessionStats::merge ──► SimulationReport
//! ```

pub mod config_file;
pub mod error;
pub mod simulation;

pub use config_file::*;
pub use error::*;
pub use simulation::*;
