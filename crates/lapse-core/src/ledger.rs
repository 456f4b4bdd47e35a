//! The expiring ledger: mint, burn, transfer and sweep over a
//! [`BatchStore`], kept in step with an injected [`TokenLedger`].
//!
//! ## Operation shape
//!
//! Every mutating entry point follows the same three steps:
//!
//! 1. **Stage**: read the clock once, copy the affected batch lists and the
//!    supply totals, then sweep, plan, consume and insert on the copies. Any
//!    `InsufficientValidBalance` or `SupplyOverflow` surfaces here, before
//!    anything is visible.
//! 2. **External**: apply the token-ledger mutations. If a later call fails,
//!    the earlier one is reversed with its exact inverse.
//! 3. **Commit**: write the staged lists and supply totals back.
//!
//! ## Laziness
//!
//! Expired value is only retired when an operation sweeps the account
//! (burn, transfer from it, or an explicit [`ExpiringLedger::sweep`]).
//! Mints and read views never sweep, so `raw_balance` may exceed
//! `live_balance` by exactly `expired_balance` until the next sweep.

use chrono::{DateTime, Duration, Utc};
use lapse_token::{AccessControl, BaseLedger, OwnerGate, TokenLedger};
use lapse_types::{
    AccountId, Batch, BurnReceipt, Clock, Expiry, LapseError, LedgerConfig, MintReceipt, Result,
    TransferReceipt,
};
use rust_decimal::Decimal;

use crate::batch_list::BatchList;
use crate::batch_store::BatchStore;
use crate::conservation::SupplyConservation;

/// Ledger wired to the in-memory collaborators.
pub type InMemoryLedger<C> = ExpiringLedger<BaseLedger, OwnerGate, C>;

/// Balance ledger whose every credited amount carries an expiry.
///
/// The token ledger is expected to be dedicated to this ledger: the
/// conservation audit assumes every unit of its supply was minted here.
pub struct ExpiringLedger<L, A, C> {
    store: BatchStore,
    token: L,
    access: A,
    clock: C,
    config: LedgerConfig,
    supply: SupplyConservation,
}

impl<C: Clock> InMemoryLedger<C> {
    /// Fresh ledger with an empty [`BaseLedger`], an [`OwnerGate`] owned by
    /// `owner`, and the default configuration.
    #[must_use]
    pub fn in_memory(owner: AccountId, clock: C) -> Self {
        Self {
            store: BatchStore::new(),
            token: BaseLedger::new(),
            access: OwnerGate::new(owner),
            clock,
            config: LedgerConfig::default(),
            supply: SupplyConservation::new(),
        }
    }
}

impl<L: TokenLedger, A: AccessControl, C: Clock> ExpiringLedger<L, A, C> {
    /// Build a ledger from its collaborators.
    ///
    /// # Errors
    /// Returns `Configuration` if `config` fails validation.
    pub fn new(token: L, access: A, clock: C, config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: BatchStore::new(),
            token,
            access,
            clock,
            config,
            supply: SupplyConservation::new(),
        })
    }

    // =================================================================
    // Mutating operations
    // =================================================================

    /// Create `amount` of value for `account`, expiring per `expiry`.
    ///
    /// Privileged. Does not sweep `account`. A zero amount succeeds without
    /// creating a batch.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not privileged
    /// - `InvalidAmount` for a negative amount
    /// - `InvalidExpiry` unless the resolved expiry is strictly after now
    /// - `SupplyOverflow` if the account, the supply or lifetime minting
    ///   would exceed `Decimal::MAX`
    pub fn mint(
        &mut self,
        caller: AccountId,
        account: AccountId,
        amount: Decimal,
        expiry: impl Into<Expiry>,
    ) -> Result<MintReceipt> {
        self.access.require_authorized(caller)?;
        ensure_non_negative(amount)?;

        let now = self.clock.now();
        let expires_at = expiry.into().resolve(now, self.config.default_expiry());
        if expires_at <= now {
            return Err(LapseError::InvalidExpiry { expires_at, now });
        }

        let mut receipt = MintReceipt {
            account,
            amount,
            expires_at,
            merged: false,
        };
        if amount.is_zero() {
            return Ok(receipt);
        }

        let mut staged = self.store.staged(account);
        receipt.merged = staged.insert(amount, expires_at)?;
        let mut supply = self.supply.clone();
        supply.record_mint(amount)?;

        self.token.credit_supply_and_balance(account, amount)?;

        self.store.commit(account, staged);
        self.supply = supply;
        self.warn_if_bloated(account);

        tracing::info!(
            account = %account,
            amount = %amount,
            expires_at = %expires_at,
            merged = receipt.merged,
            "Minted"
        );
        Ok(receipt)
    }

    /// Destroy `amount` of `account`'s live value.
    ///
    /// Sweeps `account` first, then consumes live batches in storage order.
    ///
    /// # Errors
    /// - `InvalidAmount` for a negative amount
    /// - `InsufficientValidBalance` if live holdings are short; nothing changes
    pub fn burn(&mut self, account: AccountId, amount: Decimal) -> Result<BurnReceipt> {
        ensure_non_negative(amount)?;
        let now = self.clock.now();

        let mut staged = self.store.staged(account);
        let reclaimed = staged.sweep(now);
        staged.consume(amount, now)?;
        let mut supply = self.supply.clone();
        supply.record_burn(amount)?;
        supply.record_reclaim(reclaimed)?;

        self.token.debit_supply_and_balance(account, amount)?;
        if let Err(err) = self.retire_expired(account, reclaimed) {
            let reversal = self.token.credit_supply_and_balance(account, amount);
            report_reversal("burn", reversal);
            return Err(err);
        }

        self.store.commit(account, staged);
        self.supply = supply;

        tracing::info!(
            account = %account,
            burned = %amount,
            reclaimed = %reclaimed,
            "Burned"
        );
        Ok(BurnReceipt {
            account,
            burned: amount,
            reclaimed,
        })
    }

    /// Move `amount` of live value from `from` to `to`, each moved portion
    /// keeping its original expiry.
    ///
    /// Sweeps `from` (not `to`), plans fragments over `from`'s live batches,
    /// debits them, and credits the fragments to `to` with merge-on-insert.
    ///
    /// # Errors
    /// - `InvalidAmount` for a negative amount
    /// - `InsufficientValidBalance` if `from`'s live holdings are short;
    ///   nothing changes
    /// - `SupplyOverflow` if `to`'s holdings would exceed `Decimal::MAX`
    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<TransferReceipt> {
        ensure_non_negative(amount)?;
        let now = self.clock.now();

        // Plan
        let mut source = self.store.staged(from);
        let reclaimed = source.sweep(now);
        let fragments = source.plan(amount, now)?;
        for fragment in &fragments {
            tracing::debug!(
                from = %from,
                amount = %fragment.amount,
                expires_at = %fragment.expires_at,
                "Fragment planned"
            );
        }

        // Debit
        let debited = source.consume(amount, now)?;
        if debited != fragments {
            return Err(LapseError::Internal(format!(
                "transfer debit diverged from plan for {from}: planned {} fragments, debited {}",
                fragments.len(),
                debited.len()
            )));
        }

        // Credit
        let self_transfer = from == to;
        let mut target = if self_transfer {
            BatchList::new()
        } else {
            self.store.staged(to)
        };
        {
            let dest = if self_transfer { &mut source } else { &mut target };
            for fragment in &fragments {
                dest.insert(fragment.amount, fragment.expires_at)?;
            }
        }
        let mut supply = self.supply.clone();
        supply.record_reclaim(reclaimed)?;

        self.token.move_balance(from, to, amount)?;
        if let Err(err) = self.retire_expired(from, reclaimed) {
            let reversal = self.token.move_balance(to, from, amount);
            report_reversal("transfer", reversal);
            return Err(err);
        }

        self.store.commit(from, source);
        if !self_transfer {
            self.store.commit(to, target);
            self.warn_if_bloated(to);
        }
        self.supply = supply;

        tracing::info!(
            from = %from,
            to = %to,
            amount = %amount,
            fragments = fragments.len(),
            reclaimed = %reclaimed,
            "Transferred"
        );
        Ok(TransferReceipt {
            from,
            to,
            amount,
            fragments,
            reclaimed,
        })
    }

    /// Retire `account`'s expired value now. Callable by anyone.
    ///
    /// Returns the amount reclaimed (zero if nothing had expired).
    ///
    /// # Errors
    /// Only if the token ledger rejects the reclamation.
    pub fn sweep(&mut self, account: AccountId) -> Result<Decimal> {
        let now = self.clock.now();
        self.sweep_at(account, now)
    }

    /// Sweep every account in `accounts` against a single clock reading.
    /// Returns the total reclaimed.
    ///
    /// # Errors
    /// Stops at the first account whose reclamation the token ledger
    /// rejects; accounts swept before it stay swept.
    pub fn sweep_accounts(
        &mut self,
        accounts: impl IntoIterator<Item = AccountId>,
    ) -> Result<Decimal> {
        let now = self.clock.now();
        let mut total = Decimal::ZERO;
        for account in accounts {
            // Bounded by the checked lifetime reclaimed total.
            total += self.sweep_at(account, now)?;
        }
        Ok(total)
    }

    /// Change the lifetime used by `Expiry::Default` mints. Privileged.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not privileged
    /// - `Configuration` unless `lifetime` is at least one second
    pub fn set_default_expiry(&mut self, caller: AccountId, lifetime: Duration) -> Result<()> {
        self.access.require_authorized(caller)?;
        let secs = u64::try_from(lifetime.num_seconds())
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                LapseError::Configuration(format!(
                    "default expiry must be at least one second, got {lifetime}"
                ))
            })?;
        let previous = self.config.default_expiry_secs;
        self.config.default_expiry_secs = secs;
        tracing::info!(previous, current = secs, "Default expiry changed");
        Ok(())
    }

    fn sweep_at(&mut self, account: AccountId, now: DateTime<Utc>) -> Result<Decimal> {
        let mut staged = self.store.staged(account);
        let before = staged.len();
        let reclaimed = staged.sweep(now);
        if staged.len() == before {
            return Ok(Decimal::ZERO);
        }

        let mut supply = self.supply.clone();
        supply.record_reclaim(reclaimed)?;

        self.retire_expired(account, reclaimed)?;
        self.store.commit(account, staged);
        self.supply = supply;

        tracing::info!(
            account = %account,
            reclaimed = %reclaimed,
            removed = before - self.store.batch_count(account),
            "Swept expired batches"
        );
        Ok(reclaimed)
    }

    /// Remove `reclaimed` expired value from the token ledger, all or nothing.
    ///
    /// The part still attributed to `account`'s raw balance is debited from
    /// balance and supply; anything beyond it comes off supply alone.
    fn retire_expired(&mut self, account: AccountId, reclaimed: Decimal) -> Result<()> {
        if reclaimed.is_zero() {
            return Ok(());
        }
        let attributed = self.token.balance_of(account).min(reclaimed);
        let unattributed = reclaimed - attributed;

        if attributed > Decimal::ZERO {
            self.token.debit_supply_and_balance(account, attributed)?;
        }
        if unattributed > Decimal::ZERO {
            tracing::warn!(
                account = %account,
                unattributed = %unattributed,
                "Expired value exceeds raw balance; retiring remainder from supply only"
            );
            if let Err(err) = self.token.debit_supply(unattributed) {
                let reversal = if attributed > Decimal::ZERO {
                    self.token.credit_supply_and_balance(account, attributed)
                } else {
                    Ok(())
                };
                report_reversal("reclaim", reversal);
                return Err(err);
            }
        }
        Ok(())
    }

    fn warn_if_bloated(&self, account: AccountId) {
        let count = self.store.batch_count(account);
        if count > self.config.batch_warn_threshold {
            tracing::warn!(
                account = %account,
                batches = count,
                threshold = self.config.batch_warn_threshold,
                "Account batch list is growing; consider sweeping"
            );
        }
    }

    // =================================================================
    // Read views (never mutate, never sweep)
    // =================================================================

    #[must_use]
    pub fn live_balance(&self, account: AccountId) -> Decimal {
        self.live_balance_at(account, self.clock.now())
    }

    #[must_use]
    pub fn live_balance_at(&self, account: AccountId, now: DateTime<Utc>) -> Decimal {
        self.store.live_balance(account, now)
    }

    /// Expired value still sitting in `account`'s batches, awaiting a sweep.
    #[must_use]
    pub fn expired_balance(&self, account: AccountId) -> Decimal {
        self.expired_balance_at(account, self.clock.now())
    }

    #[must_use]
    pub fn expired_balance_at(&self, account: AccountId, now: DateTime<Utc>) -> Decimal {
        self.store.expired_balance(account, now)
    }

    #[must_use]
    pub fn next_expiry(&self, account: AccountId) -> Option<DateTime<Utc>> {
        self.next_expiry_at(account, self.clock.now())
    }

    #[must_use]
    pub fn next_expiry_at(&self, account: AccountId, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.store.next_expiry(account, now)
    }

    /// Whether any of `account`'s live value expires within `window` from now.
    #[must_use]
    pub fn expires_within(&self, account: AccountId, window: Duration) -> bool {
        let now = self.clock.now();
        let horizon = now
            .checked_add_signed(window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.expires_within_at(account, now, horizon)
    }

    #[must_use]
    pub fn expires_within_at(
        &self,
        account: AccountId,
        now: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> bool {
        self.store.expires_within(account, now, horizon)
    }

    /// Snapshot of `account`'s batches in storage order.
    #[must_use]
    pub fn list_batches(&self, account: AccountId) -> Vec<Batch> {
        self.store.list_batches(account)
    }

    /// Accounts with expired value awaiting a sweep.
    #[must_use]
    pub fn accounts_with_expired(&self) -> Vec<AccountId> {
        self.store.accounts_with_expired(self.clock.now())
    }

    /// The token ledger's raw balance, which includes unswept expired value.
    #[must_use]
    pub fn raw_balance(&self, account: AccountId) -> Decimal {
        self.token.balance_of(account)
    }

    #[must_use]
    pub fn total_supply(&self) -> Decimal {
        self.token.total_supply()
    }

    #[must_use]
    pub fn default_expiry(&self) -> Duration {
        self.config.default_expiry()
    }

    /// Check that batch state and the token ledger agree.
    ///
    /// Every account holding batches must have a raw balance equal to its
    /// batch total (live plus expired), and every raw holder must hold
    /// batches.
    ///
    /// # Errors
    /// Returns `ConservationViolation` describing the first mismatch found.
    pub fn verify_conservation(&self) -> Result<()> {
        self.supply.verify(self.token.total_supply())?;
        let stored = self
            .store
            .total_amount()
            .ok_or_else(|| LapseError::ConservationViolation {
                reason: "stored batch total exceeds Decimal::MAX".into(),
            })?;
        self.supply.verify(stored)?;

        for (account, list) in self.store.iter() {
            let raw = self.token.balance_of(*account);
            let held = list.total();
            if raw != held {
                return Err(LapseError::ConservationViolation {
                    reason: format!("{account}: raw balance {raw} != batch total {held}"),
                });
            }
        }
        for (account, raw) in self.token.holders() {
            if self.store.get(account).is_none() {
                return Err(LapseError::ConservationViolation {
                    reason: format!("{account}: raw balance {raw} with no batches"),
                });
            }
        }
        Ok(())
    }

    // =================================================================
    // Accessors
    // =================================================================

    #[must_use]
    pub fn store(&self) -> &BatchStore {
        &self.store
    }

    #[must_use]
    pub fn token(&self) -> &L {
        &self.token
    }

    /// Direct access to the token ledger. Mutations made through it bypass
    /// batch bookkeeping and will show up in `verify_conservation`.
    pub fn token_mut(&mut self) -> &mut L {
        &mut self.token
    }

    #[must_use]
    pub fn access(&self) -> &A {
        &self.access
    }

    pub fn access_mut(&mut self) -> &mut A {
        &mut self.access
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    #[must_use]
    pub fn supply(&self) -> &SupplyConservation {
        &self.supply
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

fn report_reversal(operation: &'static str, outcome: Result<()>) {
    match outcome {
        Ok(()) => tracing::warn!(operation, "Token ledger step reversed"),
        Err(err) => tracing::error!(
            operation,
            error = %err,
            "Failed to reverse token ledger step; ledger needs reconciliation"
        ),
    }
}

fn ensure_non_negative(amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(LapseError::InvalidAmount { amount });
    }
    Ok(())
}
