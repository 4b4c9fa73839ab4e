//! # rf-cluster-ledger - Account settlement for the cluster-pays engine
//!
//! Holds player balances and bonus sessions, and settles spins submitted
//! either authoritatively (the ledger generates and resolves the grid) or
//! declared by a client (replayed from a seed, or clamped to the grid's
//! payout bound).
//!
//! ## Architecture
//!
//! ```text
//! SpinLedger
//!     │
//!     ├── RwLock<HashMap<AccountId, Arc<Mutex<Account>>>>
//!     │        └── balance, BonusState, SessionStats, ChaCha8Rng
//!     │
//!     └── submit(SpinSubmission) ──► SpinReceipt
//! ```

pub mod account;
pub mod error;
pub mod ledger;
pub mod submission;

pub use account::{AccountId, AccountSnapshot};
pub use error::*;
pub use ledger::SpinLedger;
pub use submission::*;
