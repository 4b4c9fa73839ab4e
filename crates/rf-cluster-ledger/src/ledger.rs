//! Spin ledger
//!
//! ```text
//! submit(account, bet, submission)
//!     │  lock account
//!     ├── bet check (ladder, balance) unless a bonus session sets the bet
//!     ├── Authoritative ──► generate + resolve (account RNG)
//!     ├── Declared ──► grid shape + scatter placement check
//!     │     ├── seed ──► resolve with seed, payout must match, capped at grid bound
//!     │     └── no seed ──► reconcile: min(declared, grid bound)
//!     ├── bonus bookkeeping ──► Settlement
//!     └── balance -= charged, balance += credited
//!        unlock
//! ```
//!
//! Every step for one account runs under that account's lock; different
//! accounts settle in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use rf_cluster::bonus;
use rf_cluster::{
    BetLadder, BonusRules, BonusState, CascadeResolver, GameConfig, GridGenerator,
    Reconciliation, SpinMode, SpinReconciler, SpinResult, SpinTally, SymbolCatalog,
};

use crate::account::{Account, AccountId, AccountSnapshot};
use crate::error::{LedgerError, LedgerResult};
use crate::submission::{DeclaredSpin, SpinReceipt, SpinSubmission, TrustLevel};

/// Largest difference between declared and replayed payout still treated as equal
const REPLAY_TOLERANCE: f64 = 1e-6;

/// A spin resolved by one of the trust paths, not yet settled
struct Resolved {
    payout: f64,
    scatter_count: usize,
    cascades: u32,
    trust: TrustLevel,
    result: Option<SpinResult>,
    reconciliation: Option<Reconciliation>,
}

/// Thread-safe account ledger over one game configuration
pub struct SpinLedger {
    config: GameConfig,
    catalog: SymbolCatalog,
    rules: BonusRules,
    ladder: BetLadder,
    accounts: RwLock<HashMap<AccountId, Arc<Mutex<Account>>>>,
    /// Forks per-account streams at open time
    master_rng: Mutex<ChaCha8Rng>,
    next_account: AtomicU64,
    next_spin: AtomicU64,
}

impl SpinLedger {
    /// Ledger seeded from the OS
    pub fn new(config: GameConfig) -> LedgerResult<Self> {
        Self::with_rng(config, ChaCha8Rng::from_os_rng())
    }

    /// Ledger with reproducible account streams
    pub fn seeded(config: GameConfig, seed: u64) -> LedgerResult<Self> {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, rng: ChaCha8Rng) -> LedgerResult<Self> {
        let catalog = SymbolCatalog::from_config(&config)?;
        Ok(Self {
            rules: BonusRules::from_config(&config),
            ladder: config.bet_ladder(),
            catalog,
            config,
            accounts: RwLock::new(HashMap::new()),
            master_rng: Mutex::new(rng),
            next_account: AtomicU64::new(1),
            next_spin: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn bet_ladder(&self) -> BetLadder {
        self.ladder
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCOUNTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Open an account with a starting balance
    pub fn open_account(&self, initial_balance: f64) -> LedgerResult<AccountId> {
        if !initial_balance.is_finite() || initial_balance < 0.0 {
            return Err(LedgerError::InvalidAmount(initial_balance));
        }
        let id = self.next_account.fetch_add(1, Ordering::Relaxed);
        let stream_seed: u64 = self.master_rng.lock().random();
        let account = Account::new(id, initial_balance, ChaCha8Rng::seed_from_u64(stream_seed));

        self.accounts
            .write()
            .insert(id, Arc::new(Mutex::new(account)));
        log::debug!("opened account {} with balance {:.2}", id, initial_balance);
        Ok(id)
    }

    /// Add funds, returns the new balance
    pub fn deposit(&self, id: AccountId, amount: f64) -> LedgerResult<f64> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let account = self.account(id)?;
        let mut account = account.lock();
        account.balance += amount;
        Ok(account.balance)
    }

    pub fn balance(&self, id: AccountId) -> LedgerResult<f64> {
        Ok(self.account(id)?.lock().balance)
    }

    pub fn snapshot(&self, id: AccountId) -> LedgerResult<AccountSnapshot> {
        Ok(self.account(id)?.lock().snapshot())
    }

    /// Replace an account's bonus state, e.g. from a saved snapshot
    pub fn restore_bonus(&self, id: AccountId, state: BonusState) -> LedgerResult<()> {
        self.account(id)?.lock().bonus = state;
        Ok(())
    }

    pub fn account_count(&self) -> usize {
        self.accounts.read().len()
    }

    /// Sum of all balances
    pub fn total_balance(&self) -> f64 {
        let accounts: Vec<_> = self.accounts.read().values().cloned().collect();
        accounts.iter().map(|a| a.lock().balance).sum()
    }

    fn account(&self, id: AccountId) -> LedgerResult<Arc<Mutex<Account>>> {
        self.accounts
            .read()
            .get(&id)
            .cloned()
            .ok_or(LedgerError::UnknownAccount(id))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPINS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Settle one spin for an account
    ///
    /// During a bonus session the spin is free and played at the session's
    /// bet; `bet` is ignored. Fails without touching the account when the bet
    /// is off the ladder, the balance is short, the grid is invalid or a
    /// seeded replay disagrees with the declared payout.
    pub fn submit(
        &self,
        id: AccountId,
        bet: f64,
        submission: SpinSubmission,
    ) -> LedgerResult<SpinReceipt> {
        let account = self.account(id)?;
        let mut account = account.lock();

        let (bet, mode) = match account.bonus.session_bet() {
            Some(session_bet) => (session_bet, SpinMode::Bonus),
            None => {
                if !self.ladder.contains(bet) {
                    return Err(LedgerError::BetNotOnLadder(bet));
                }
                if account.balance < bet {
                    return Err(LedgerError::InsufficientBalance {
                        needed: bet,
                        available: account.balance,
                    });
                }
                (bet, SpinMode::Base)
            }
        };

        let resolved = match &submission {
            SpinSubmission::Authoritative => self.resolve_authoritative(&mut account.rng, bet)?,
            SpinSubmission::Declared(spin) => self.resolve_declared(id, spin, bet)?,
        };

        let tally = SpinTally {
            bet,
            payout: resolved.payout,
            scatter_count: resolved.scatter_count,
        };
        let settlement = account.bonus.settle(&tally, &self.rules)?;
        account.balance += settlement.net();
        account
            .stats
            .record_tally(&tally, mode, resolved.cascades, &settlement);

        let spin_id = self.next_spin.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "spin {} account {} ({:?}, {:?}): bet {}, payout {:.2}, balance {:.2}",
            spin_id,
            id,
            mode,
            resolved.trust,
            bet,
            resolved.payout,
            account.balance
        );

        Ok(SpinReceipt {
            spin_id,
            account: id,
            mode,
            trust: resolved.trust,
            bet,
            payout: resolved.payout,
            charged: settlement.charged,
            credited: settlement.credited,
            balance_after: account.balance,
            event: settlement.event,
            result: resolved.result.map(|r| r.with_mode(mode)),
            reconciliation: resolved.reconciliation,
        })
    }

    fn resolve_authoritative(&self, rng: &mut ChaCha8Rng, bet: f64) -> LedgerResult<Resolved> {
        let grid = GridGenerator::new(&self.config, &self.catalog, &mut *rng).generate();
        let result = CascadeResolver::new(&self.config, &self.catalog, rng).resolve(&grid, bet)?;
        Ok(Resolved {
            payout: result.total_payout,
            scatter_count: result.scatter_count,
            cascades: result.cascade_count() as u32,
            trust: TrustLevel::Authoritative,
            result: Some(result),
            reconciliation: None,
        })
    }

    fn resolve_declared(
        &self,
        id: AccountId,
        spin: &DeclaredSpin,
        bet: f64,
    ) -> LedgerResult<Resolved> {
        let grid = &spin.initial_grid;
        grid.validate(self.config.grid_size, self.config.symbol_count, false)?;
        grid.validate_scatters(self.catalog.scatter(), self.config.bonus_trigger_count)?;
        let reconciler = SpinReconciler::new(&self.config, &self.catalog);

        if let Some(seed) = spin.seed {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let result =
                CascadeResolver::new(&self.config, &self.catalog, &mut rng).resolve(grid, bet)?;
            if (result.total_payout - spin.declared_payout).abs() > REPLAY_TOLERANCE {
                log::warn!(
                    "account {}: declared payout {:.2} but replay gives {:.2}",
                    id,
                    spin.declared_payout,
                    result.total_payout
                );
                return Err(LedgerError::ReplayMismatch {
                    declared: spin.declared_payout,
                    replayed: result.total_payout,
                });
            }
            // A matching replay still pays at most the grid bound
            let reconciliation = reconciler.reconcile(grid, bet, result.total_payout)?;
            return Ok(Resolved {
                payout: reconciliation.accepted,
                scatter_count: result.scatter_count,
                cascades: result.cascade_count() as u32,
                trust: TrustLevel::Replayed,
                result: Some(result),
                reconciliation: Some(reconciliation),
            });
        }

        log::warn!(
            "account {}: unseeded declared spin, payout accepted up to grid bound",
            id
        );
        let reconciliation = reconciler.reconcile(grid, bet, spin.declared_payout)?;
        Ok(Resolved {
            payout: reconciliation.accepted,
            scatter_count: bonus::scatter_count(grid, &self.catalog),
            cascades: 0,
            trust: TrustLevel::Reconciled,
            result: None,
            reconciliation: Some(reconciliation),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rf_cluster::{BonusEvent, BonusSession, ClusterError, Grid, Symbol};

    fn ledger() -> SpinLedger {
        SpinLedger::seeded(GameConfig::default(), 7).unwrap()
    }

    fn checkerboard() -> Grid {
        let rows: Vec<Vec<u8>> = (0..7)
            .map(|r| (0..7).map(|c| ((r + c) % 2) as u8).collect())
            .collect();
        Grid::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_open_and_deposit() {
        let ledger = ledger();
        let id = ledger.open_account(1000.0).unwrap();
        assert_eq!(ledger.balance(id).unwrap(), 1000.0);
        assert_eq!(ledger.deposit(id, 500.0).unwrap(), 1500.0);
        assert_eq!(ledger.account_count(), 1);

        assert_eq!(
            ledger.deposit(id, -5.0),
            Err(LedgerError::InvalidAmount(-5.0))
        );
        assert_eq!(ledger.balance(99), Err(LedgerError::UnknownAccount(99)));
        assert!(ledger.open_account(f64::NAN).is_err());
    }

    #[test]
    fn test_bet_must_be_on_ladder() {
        let ledger = ledger();
        let id = ledger.open_account(100_000.0).unwrap();
        for bet in [0.0, 100.0, 400.0, 6000.0, 6200.0, 600.5] {
            assert_eq!(
                ledger.submit(id, bet, SpinSubmission::Authoritative),
                Err(LedgerError::BetNotOnLadder(bet))
            );
        }
        assert_eq!(ledger.balance(id).unwrap(), 100_000.0);
        assert!(ledger.submit(id, 5800.0, SpinSubmission::Authoritative).is_ok());
    }

    #[test]
    fn test_insufficient_balance_rejected() {
        let ledger = ledger();
        let id = ledger.open_account(100.0).unwrap();
        assert_eq!(
            ledger.submit(id, 200.0, SpinSubmission::Authoritative),
            Err(LedgerError::InsufficientBalance {
                needed: 200.0,
                available: 100.0
            })
        );
        assert_eq!(ledger.balance(id).unwrap(), 100.0);
    }

    #[test]
    fn test_authoritative_spin_settles_balance() {
        let ledger = ledger();
        let id = ledger.open_account(10_000.0).unwrap();
        let receipt = ledger.submit(id, 600.0, SpinSubmission::Authoritative).unwrap();

        assert_eq!(receipt.trust, TrustLevel::Authoritative);
        assert_eq!(receipt.charged, 600.0);
        assert_eq!(receipt.credited, receipt.payout);
        assert_relative_eq!(receipt.balance_after, 10_000.0 - 600.0 + receipt.payout);
        assert_eq!(ledger.balance(id).unwrap(), receipt.balance_after);
        assert!(receipt.result.is_some());
    }

    #[test]
    fn test_unseeded_declared_payout_is_clamped() {
        let ledger = ledger();
        let id = ledger.open_account(1000.0).unwrap();
        let receipt = ledger
            .submit(
                id,
                200.0,
                SpinSubmission::Declared(DeclaredSpin {
                    initial_grid: checkerboard(),
                    declared_payout: 1_000_000.0,
                    seed: None,
                }),
            )
            .unwrap();

        let reconciliation = receipt.reconciliation.unwrap();
        assert!(reconciliation.was_clamped());
        assert_eq!(receipt.trust, TrustLevel::Reconciled);
        assert_eq!(receipt.payout, reconciliation.bound);
        assert_relative_eq!(ledger.balance(id).unwrap(), 800.0 + reconciliation.bound);
    }

    #[test]
    fn test_seeded_declared_spin_replays() {
        let ledger = ledger();
        let id = ledger.open_account(1000.0).unwrap();
        let config = GameConfig::default();
        let catalog = SymbolCatalog::from_config(&config).unwrap();

        // Client side: generate and resolve with its own seed
        let mut client_rng = ChaCha8Rng::seed_from_u64(4242);
        let grid = GridGenerator::new(&config, &catalog, &mut client_rng).generate();
        let mut refill_rng = ChaCha8Rng::seed_from_u64(17);
        let client = CascadeResolver::new(&config, &catalog, &mut refill_rng)
            .resolve(&grid, 200.0)
            .unwrap();

        let honest = DeclaredSpin {
            initial_grid: grid.clone(),
            declared_payout: client.total_payout,
            seed: Some(17),
        };
        let receipt = ledger
            .submit(id, 200.0, SpinSubmission::Declared(honest))
            .unwrap();
        let bound = SpinReconciler::new(&config, &catalog)
            .estimate_bound(&grid, 200.0)
            .unwrap();
        assert_eq!(receipt.trust, TrustLevel::Replayed);
        assert_eq!(receipt.payout, client.total_payout.min(bound));
        assert_eq!(receipt.reconciliation.unwrap().declared, client.total_payout);

        let inflated = DeclaredSpin {
            initial_grid: grid,
            declared_payout: client.total_payout + 100.0,
            seed: Some(17),
        };
        let before = ledger.balance(id).unwrap();
        assert!(matches!(
            ledger.submit(id, 200.0, SpinSubmission::Declared(inflated)),
            Err(LedgerError::ReplayMismatch { .. })
        ));
        assert_eq!(ledger.balance(id).unwrap(), before);
    }

    #[test]
    fn test_seeded_declared_spin_capped_at_bound() {
        let ledger = ledger();
        let id = ledger.open_account(1000.0).unwrap();
        let config = GameConfig::default();
        let catalog = SymbolCatalog::from_config(&config).unwrap();
        let grid = Grid::from_rows(&vec![vec![7u8; 7]; 7]).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let replay = CascadeResolver::new(&config, &catalog, &mut rng)
            .resolve(&grid, 200.0)
            .unwrap();
        let bound = SpinReconciler::new(&config, &catalog)
            .estimate_bound(&grid, 200.0)
            .unwrap();

        let receipt = ledger
            .submit(
                id,
                200.0,
                SpinSubmission::Declared(DeclaredSpin {
                    initial_grid: grid,
                    declared_payout: replay.total_payout,
                    seed: Some(1),
                }),
            )
            .unwrap();

        assert_eq!(receipt.trust, TrustLevel::Replayed);
        assert!(receipt.credited <= bound);
        assert_eq!(receipt.payout, replay.total_payout.min(bound));
        let reconciliation = receipt.reconciliation.unwrap();
        assert_eq!(reconciliation.bound, bound);
        assert_relative_eq!(ledger.balance(id).unwrap(), 800.0 + receipt.payout);
    }

    #[test]
    fn test_declared_grid_with_impossible_scatters_rejected() {
        let ledger = ledger();
        let id = ledger.open_account(1000.0).unwrap();
        let scatter = Symbol(GameConfig::default().scatter_symbol);
        let declare = |grid: Grid, seed: Option<u64>| {
            SpinSubmission::Declared(DeclaredSpin {
                initial_grid: grid,
                declared_payout: 0.0,
                seed,
            })
        };

        let mut stacked = checkerboard();
        for row in 0..4 {
            stacked.set(row, 0, Some(scatter));
        }
        let mut crowded = checkerboard();
        for col in 0..5 {
            crowded.set(col, col, Some(scatter));
        }

        for grid in [stacked, crowded] {
            for seed in [None, Some(3)] {
                let result = ledger.submit(id, 200.0, declare(grid.clone(), seed));
                assert!(matches!(
                    result,
                    Err(LedgerError::Engine(ClusterError::InvalidGrid(_)))
                ));
            }
        }
        assert_eq!(ledger.balance(id).unwrap(), 1000.0);
        assert!(!ledger.snapshot(id).unwrap().in_bonus());

        // One scatter in each of four columns is a legal trigger
        let mut spread = checkerboard();
        for col in 0..4 {
            spread.set(col, col, Some(scatter));
        }
        let receipt = ledger.submit(id, 200.0, declare(spread, None)).unwrap();
        assert!(matches!(receipt.event, BonusEvent::Entered { .. }));
        assert!(ledger.snapshot(id).unwrap().in_bonus());
    }

    #[test]
    fn test_invalid_declared_grid_leaves_balance() {
        let ledger = ledger();
        let id = ledger.open_account(1000.0).unwrap();
        let bad = Grid::from_rows(&[vec![0, 1], vec![1, 0]]).unwrap();
        let result = ledger.submit(
            id,
            200.0,
            SpinSubmission::Declared(DeclaredSpin {
                initial_grid: bad,
                declared_payout: 10.0,
                seed: None,
            }),
        );
        assert!(matches!(result, Err(LedgerError::Engine(_))));
        assert_eq!(ledger.balance(id).unwrap(), 1000.0);
    }

    #[test]
    fn test_bonus_spins_are_free_and_pay_at_end() {
        let ledger = ledger();
        let id = ledger.open_account(0.0).unwrap();
        ledger
            .restore_bonus(
                id,
                BonusState::Active(BonusSession {
                    remaining_spins: 3,
                    awarded_spins: 10,
                    trigger_bet: 600.0,
                    ..Default::default()
                }),
            )
            .unwrap();

        // Zero balance is fine: free spins charge nothing
        let mut held = 0.0;
        loop {
            let receipt = ledger.submit(id, 200.0, SpinSubmission::Authoritative).unwrap();
            assert_eq!(receipt.mode, SpinMode::Bonus);
            assert_eq!(receipt.bet, 600.0);
            assert_eq!(receipt.charged, 0.0);
            held += receipt.payout;
            if let BonusEvent::Finished { payout, .. } = receipt.event {
                assert_relative_eq!(payout, held, epsilon = 1e-9);
                assert_relative_eq!(receipt.credited, held, epsilon = 1e-9);
                break;
            }
            assert_eq!(receipt.credited, 0.0);
        }
        assert_relative_eq!(ledger.balance(id).unwrap(), held, epsilon = 1e-9);
        assert!(!ledger.snapshot(id).unwrap().in_bonus());
    }
}
