//! Per-account batch storage.
//!
//! Maps each account to its [`BatchList`]. An account whose list becomes
//! empty is dropped from the map, so it is indistinguishable from one that
//! never held anything.
//!
//! Multi-step operations work on a *staged* copy of a list
//! ([`BatchStore::staged`]) and write it back with [`BatchStore::commit`]
//! only once every precondition has passed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lapse_types::{AccountId, Batch, Result};
use rust_decimal::Decimal;

use crate::batch_list::BatchList;

/// All accounts' batch lists.
#[derive(Debug, Clone, Default)]
pub struct BatchStore {
    accounts: HashMap<AccountId, BatchList>,
}

impl BatchStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
        }
    }

    /// Add `amount` at `expires_at` to `account`, merging on equal expiry.
    /// Returns `true` if a merge happened.
    ///
    /// # Errors
    /// Returns `SupplyOverflow` (store unchanged) if `account`'s total would
    /// exceed `Decimal::MAX`.
    pub fn insert(
        &mut self,
        account: AccountId,
        amount: Decimal,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let list = self.accounts.entry(account).or_default();
        let merged = match list.insert(amount, expires_at) {
            Ok(merged) => merged,
            Err(err) => {
                if list.is_empty() {
                    self.accounts.remove(&account);
                }
                return Err(err);
            }
        };
        tracing::debug!(
            account = %account,
            amount = %amount,
            expires_at = %expires_at,
            merged,
            "Batch inserted"
        );
        Ok(merged)
    }

    /// Swap-remove the batch at `index` of `account`'s list.
    ///
    /// # Panics
    /// Panics if the account holds no batches or `index` is out of range.
    pub fn remove_at(&mut self, account: AccountId, index: usize) -> Batch {
        let list = self
            .accounts
            .get_mut(&account)
            .unwrap_or_else(|| panic!("remove_at on account {account} with no batches"));
        let removed = list.remove_at(index);
        if list.is_empty() {
            self.accounts.remove(&account);
        }
        removed
    }

    /// Remove `account`'s expired batches and return the reclaimed total.
    ///
    /// The caller must retire the returned amount from any parallel supply
    /// accounting.
    pub fn sweep(&mut self, account: AccountId, now: DateTime<Utc>) -> Decimal {
        let Some(list) = self.accounts.get_mut(&account) else {
            return Decimal::ZERO;
        };
        let reclaimed = list.sweep(now);
        if list.is_empty() {
            self.accounts.remove(&account);
        }
        reclaimed
    }

    /// A private copy of `account`'s list (empty if none).
    #[must_use]
    pub fn staged(&self, account: AccountId) -> BatchList {
        self.accounts.get(&account).cloned().unwrap_or_default()
    }

    /// Replace `account`'s list with `list`. An empty list removes the account.
    pub fn commit(&mut self, account: AccountId, list: BatchList) {
        if list.is_empty() {
            self.accounts.remove(&account);
        } else {
            self.accounts.insert(account, list);
        }
    }

    /// `account`'s list, if it holds any batches.
    #[must_use]
    pub fn get(&self, account: AccountId) -> Option<&BatchList> {
        self.accounts.get(&account)
    }

    /// Snapshot of `account`'s batches in storage order.
    #[must_use]
    pub fn list_batches(&self, account: AccountId) -> Vec<Batch> {
        self.get(account)
            .map(|list| list.as_slice().to_vec())
            .unwrap_or_default()
    }

    /// Number of batches stored for `account`.
    #[must_use]
    pub fn batch_count(&self, account: AccountId) -> usize {
        self.get(account).map_or(0, BatchList::len)
    }

    #[must_use]
    pub fn live_balance(&self, account: AccountId, now: DateTime<Utc>) -> Decimal {
        self.get(account)
            .map_or(Decimal::ZERO, |list| list.live_balance(now))
    }

    #[must_use]
    pub fn expired_balance(&self, account: AccountId, now: DateTime<Utc>) -> Decimal {
        self.get(account)
            .map_or(Decimal::ZERO, |list| list.expired_balance(now))
    }

    #[must_use]
    pub fn next_expiry(&self, account: AccountId, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.get(account).and_then(|list| list.next_expiry(now))
    }

    #[must_use]
    pub fn expires_within(
        &self,
        account: AccountId,
        now: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> bool {
        self.get(account)
            .is_some_and(|list| list.expires_within(now, horizon))
    }

    /// Accounts holding at least one expired batch, sorted for stable output.
    #[must_use]
    pub fn accounts_with_expired(&self, now: DateTime<Utc>) -> Vec<AccountId> {
        let mut accounts: Vec<AccountId> = self
            .accounts
            .iter()
            .filter(|(_, list)| list.has_expired(now))
            .map(|(account, _)| *account)
            .collect();
        accounts.sort();
        accounts
    }

    /// Iterate over accounts and their lists (unspecified order).
    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &BatchList)> {
        self.accounts.iter()
    }

    /// Number of accounts holding batches.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Sum of every stored amount, expired or not. `None` if the sum is not
    /// representable.
    #[must_use]
    pub fn total_amount(&self) -> Option<Decimal> {
        self.accounts
            .values()
            .try_fold(Decimal::ZERO, |sum, list| sum.checked_add(list.total()))
    }
}
