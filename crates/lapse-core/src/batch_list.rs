//! One account's expiry batches.
//!
//! A [`BatchList`] is an indexed growable array of [`Batch`]es with three
//! structural rules:
//!
//! 1. **Merge on insert**: no two batches share an `expires_at`.
//! 2. **Swap-remove**: removal moves the last batch into the hole, so list
//!    order is insertion order only until the first removal.
//! 3. **Index-order consumption**: burns and transfers scan from index 0,
//!    skip expired batches, and take from each live batch until satisfied.
//!
//! Consumption order is observable (it decides which expiries a transfer
//! hands over), so the list is deliberately *not* kept sorted.
//!
//! The sum of all batch amounts never exceeds `Decimal::MAX`; insert refuses
//! anything that would break this, so the balance views can sum freely.

use chrono::{DateTime, Utc};
use lapse_types::{Batch, LapseError, Result, TransferFragment};
use rust_decimal::Decimal;

/// Per-account batch collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchList {
    batches: Vec<Batch>,
}

impl BatchList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            batches: Vec::new(),
        }
    }

    /// Number of stored batches, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// The batches in their current storage order.
    #[must_use]
    pub fn as_slice(&self) -> &[Batch] {
        &self.batches
    }

    /// Add `amount` at `expires_at`, merging into an existing batch with the
    /// same expiry. Returns `true` if a merge happened.
    ///
    /// O(n) in list length.
    ///
    /// # Errors
    /// Returns `SupplyOverflow` (leaving the list unchanged) if the list
    /// total would exceed `Decimal::MAX`.
    pub fn insert(&mut self, amount: Decimal, expires_at: DateTime<Utc>) -> Result<bool> {
        self.total()
            .checked_add(amount)
            .ok_or(LapseError::SupplyOverflow)?;
        if let Some(existing) = self
            .batches
            .iter_mut()
            .find(|b| b.expires_at == expires_at)
        {
            existing.amount = existing
                .amount
                .checked_add(amount)
                .ok_or(LapseError::SupplyOverflow)?;
            return Ok(true);
        }
        self.batches.push(Batch::new(amount, expires_at));
        Ok(false)
    }

    /// Remove the batch at `index` by swapping the last batch into its place.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn remove_at(&mut self, index: usize) -> Batch {
        assert!(
            index < self.batches.len(),
            "remove_at index {index} out of range for {} batches",
            self.batches.len()
        );
        self.batches.swap_remove(index)
    }

    /// Remove every batch with `expires_at <= now` and return their total.
    ///
    /// After a removal the same index is checked again, because swap-remove
    /// just moved an unchecked batch there. Idempotent for a fixed `now`.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> Decimal {
        let mut reclaimed = Decimal::ZERO;
        let mut i = 0;
        while i < self.batches.len() {
            if self.batches[i].is_expired(now) {
                reclaimed += self.remove_at(i).amount;
            } else {
                i += 1;
            }
        }
        reclaimed
    }

    /// Greedily allocate `amount` from live batches in index order without
    /// mutating anything.
    ///
    /// # Errors
    /// Returns `InsufficientValidBalance` if live batches cannot cover `amount`.
    pub fn plan(&self, amount: Decimal, now: DateTime<Utc>) -> Result<Vec<TransferFragment>> {
        let mut fragments = Vec::new();
        let mut remaining = amount;
        for batch in &self.batches {
            if remaining <= Decimal::ZERO {
                break;
            }
            if batch.is_expired(now) || batch.amount.is_zero() {
                continue;
            }
            let take = remaining.min(batch.amount);
            fragments.push(TransferFragment {
                amount: take,
                expires_at: batch.expires_at,
            });
            remaining -= take;
        }
        if remaining > Decimal::ZERO {
            return Err(LapseError::InsufficientValidBalance {
                needed: amount,
                available: self.live_balance(now),
            });
        }
        Ok(fragments)
    }

    /// Take `amount` out of live batches in index order and return what was
    /// taken from each.
    ///
    /// The walk visits batches in the same order as [`plan`](Self::plan);
    /// emptied batches are only swap-removed once the walk is over, so the
    /// returned fragments match the plan for the same list state.
    ///
    /// # Errors
    /// Returns `InsufficientValidBalance` (leaving the list unchanged) if
    /// live batches cannot cover `amount`.
    pub fn consume(&mut self, amount: Decimal, now: DateTime<Utc>) -> Result<Vec<TransferFragment>> {
        let available = self.live_balance(now);
        if available < amount {
            return Err(LapseError::InsufficientValidBalance {
                needed: amount,
                available,
            });
        }

        let mut taken = Vec::new();
        let mut remaining = amount;
        for batch in &mut self.batches {
            if remaining <= Decimal::ZERO {
                break;
            }
            if batch.is_expired(now) || batch.amount.is_zero() {
                continue;
            }
            let take = remaining.min(batch.amount);
            batch.amount -= take;
            remaining -= take;
            tracing::debug!(
                take = %take,
                left = %batch.amount,
                expires_at = %batch.expires_at,
                "Batch consumed"
            );
            taken.push(TransferFragment {
                amount: take,
                expires_at: batch.expires_at,
            });
        }

        self.drop_empty(now);
        Ok(taken)
    }

    /// Swap-remove live batches whose amount reached zero.
    fn drop_empty(&mut self, now: DateTime<Utc>) {
        let mut i = 0;
        while i < self.batches.len() {
            let batch = &self.batches[i];
            if batch.amount.is_zero() && batch.is_live(now) {
                self.remove_at(i);
            } else {
                i += 1;
            }
        }
    }

    // ----- read views (never mutate, never sweep) -----

    /// Sum of amounts with `expires_at > now`.
    #[must_use]
    pub fn live_balance(&self, now: DateTime<Utc>) -> Decimal {
        self.batches
            .iter()
            .filter(|b| b.is_live(now))
            .map(|b| b.amount)
            .sum()
    }

    /// Sum of amounts with `expires_at <= now`.
    #[must_use]
    pub fn expired_balance(&self, now: DateTime<Utc>) -> Decimal {
        self.batches
            .iter()
            .filter(|b| b.is_expired(now))
            .map(|b| b.amount)
            .sum()
    }

    /// Sum of all stored amounts regardless of expiry.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.batches.iter().map(|b| b.amount).sum()
    }

    /// Earliest expiry among live batches, `None` if nothing is live.
    #[must_use]
    pub fn next_expiry(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.batches
            .iter()
            .filter(|b| b.is_live(now))
            .map(|b| b.expires_at)
            .min()
    }

    /// `true` iff a positive amount expires in `(now, horizon]`.
    #[must_use]
    pub fn expires_within(&self, now: DateTime<Utc>, horizon: DateTime<Utc>) -> bool {
        let expiring: Decimal = self
            .batches
            .iter()
            .filter(|b| b.expires_at > now && b.expires_at <= horizon)
            .map(|b| b.amount)
            .sum();
        expiring > Decimal::ZERO
    }

    /// Whether any stored batch has expired by `now`.
    #[must_use]
    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        self.batches.iter().any(|b| b.is_expired(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn days(n: i64) -> DateTime<Utc> {
        t0() + Duration::days(n)
    }

    fn list(items: &[(i64, i64)]) -> BatchList {
        let mut list = BatchList::new();
        for &(amount, day) in items {
            list.insert(dec(amount), days(day)).unwrap();
        }
        list
    }

    fn pairs(list: &BatchList) -> Vec<(Decimal, DateTime<Utc>)> {
        list.as_slice()
            .iter()
            .map(|b| (b.amount, b.expires_at))
            .collect()
    }

    // --- insert ---

    #[test]
    fn insert_merges_same_expiry() {
        let mut l = BatchList::new();
        assert!(!l.insert(dec(100), days(30)).unwrap());
        assert!(l.insert(dec(50), days(30)).unwrap());
        assert_eq!(pairs(&l), vec![(dec(150), days(30))]);
    }

    #[test]
    fn insert_overflow_leaves_list_unchanged() {
        let mut l = list(&[(1, 5)]);
        l.insert(Decimal::MAX - Decimal::ONE, days(9)).unwrap();
        let before = l.clone();

        // Overflow through a merge and through a new expiry.
        let merged = l.insert(Decimal::ONE, days(5));
        assert!(matches!(merged, Err(LapseError::SupplyOverflow)));
        let appended = l.insert(Decimal::ONE, days(20));
        assert!(matches!(appended, Err(LapseError::SupplyOverflow)));
        assert_eq!(l, before);
        assert_eq!(l.total(), Decimal::MAX);
    }

    #[test]
    fn insert_appends_new_expiry() {
        let l = list(&[(100, 30), (50, 10)]);
        assert_eq!(pairs(&l), vec![(dec(100), days(30)), (dec(50), days(10))]);
    }

    #[test]
    fn merge_is_order_independent() {
        let a = list(&[(7, 5), (3, 5)]);
        let b = list(&[(3, 5), (7, 5)]);
        assert_eq!(a, b);
    }

    // --- remove_at ---

    #[test]
    fn remove_at_swaps_last_in() {
        let mut l = list(&[(1, 1), (2, 2), (3, 3)]);
        let removed = l.remove_at(0);
        assert_eq!(removed.amount, dec(1));
        assert_eq!(pairs(&l), vec![(dec(3), days(3)), (dec(2), days(2))]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn remove_at_out_of_range_panics() {
        let mut l = list(&[(1, 1)]);
        l.remove_at(1);
    }

    // --- sweep ---

    #[test]
    fn sweep_rechecks_swapped_in_batch() {
        // Both index 0 and the last batch are expired: after removing index 0
        // the expired last batch lands at index 0 and must be removed too.
        let mut l = list(&[(10, 1), (20, 30), (30, 2)]);
        let reclaimed = l.sweep(days(5));
        assert_eq!(reclaimed, dec(40));
        assert_eq!(pairs(&l), vec![(dec(20), days(30))]);
    }

    #[test]
    fn sweep_at_exact_expiry_reclaims() {
        let mut l = list(&[(10, 3)]);
        assert_eq!(l.sweep(days(3)), dec(10));
        assert!(l.is_empty());
    }

    #[test]
    fn sweep_is_idempotent() {
        let mut l = list(&[(10, 1), (20, 30), (30, 2), (5, 40)]);
        l.sweep(days(5));
        let after_first = l.clone();
        assert_eq!(l.sweep(days(5)), Decimal::ZERO);
        assert_eq!(l, after_first);
    }

    // --- plan ---

    #[test]
    fn plan_takes_partial_first_batch() {
        let l = list(&[(60, 10), (50, 30)]);
        let plan = l.plan(dec(40), t0()).unwrap();
        assert_eq!(
            plan,
            vec![TransferFragment {
                amount: dec(40),
                expires_at: days(10)
            }]
        );
        // plan never mutates
        assert_eq!(pairs(&l), vec![(dec(60), days(10)), (dec(50), days(30))]);
    }

    #[test]
    fn plan_spans_batches_in_index_order() {
        let l = list(&[(60, 30), (50, 10)]);
        let plan = l.plan(dec(70), t0()).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].expires_at, days(30));
        assert_eq!(plan[0].amount, dec(60));
        assert_eq!(plan[1].expires_at, days(10));
        assert_eq!(plan[1].amount, dec(10));
    }

    #[test]
    fn plan_skips_expired() {
        let l = list(&[(100, 1), (50, 30)]);
        let plan = l.plan(dec(20), days(2)).unwrap();
        assert_eq!(plan[0].expires_at, days(30));
    }

    #[test]
    fn plan_insufficient_reports_live_only() {
        let l = list(&[(100, 1), (50, 30)]);
        let err = l.plan(dec(60), days(2)).unwrap_err();
        match err {
            LapseError::InsufficientValidBalance { needed, available } => {
                assert_eq!(needed, dec(60));
                assert_eq!(available, dec(50));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn plan_zero_amount_is_empty() {
        let l = list(&[(10, 5)]);
        assert!(l.plan(Decimal::ZERO, t0()).unwrap().is_empty());
    }

    // --- consume ---

    #[test]
    fn consume_matches_plan_across_removals() {
        // Index 0 is emptied; if it were swap-removed mid-walk the batch at
        // day 3 would jump ahead of day 2.
        let mut l = list(&[(10, 1), (10, 2), (10, 3)]);
        let plan = l.plan(dec(15), t0()).unwrap();
        let taken = l.consume(dec(15), t0()).unwrap();
        assert_eq!(plan, taken);
        assert_eq!(pairs(&l), vec![(dec(10), days(3)), (dec(5), days(2))]);
    }

    #[test]
    fn consume_leaves_expired_untouched() {
        let mut l = list(&[(100, 1), (50, 30)]);
        l.consume(dec(20), days(2)).unwrap();
        assert_eq!(pairs(&l), vec![(dec(100), days(1)), (dec(30), days(30))]);
    }

    #[test]
    fn consume_insufficient_leaves_list_unchanged() {
        let mut l = list(&[(100, 1), (50, 30)]);
        let before = l.clone();
        let err = l.consume(dec(51), days(2)).unwrap_err();
        assert!(matches!(err, LapseError::InsufficientValidBalance { .. }));
        assert_eq!(l, before);
    }

    #[test]
    fn consume_exact_balance_empties_live() {
        let mut l = list(&[(10, 5), (20, 6)]);
        l.consume(dec(30), t0()).unwrap();
        assert!(l.is_empty());
    }

    // --- views ---

    #[test]
    fn views_split_on_expiry() {
        let l = list(&[(100, 1), (50, 30), (25, 10)]);
        let now = days(1);
        assert_eq!(l.live_balance(now), dec(75));
        assert_eq!(l.expired_balance(now), dec(100));
        assert_eq!(l.total(), dec(175));
        assert_eq!(l.next_expiry(now), Some(days(10)));
        assert!(l.has_expired(now));
    }

    #[test]
    fn next_expiry_none_when_nothing_live() {
        let l = list(&[(100, 1)]);
        assert_eq!(l.next_expiry(days(1)), None);
        assert_eq!(BatchList::new().next_expiry(t0()), None);
    }

    #[test]
    fn expires_within_window_is_half_open() {
        let l = list(&[(100, 10)]);
        assert!(l.expires_within(t0(), days(10)), "horizon is inclusive");
        assert!(!l.expires_within(t0(), days(9)));
        assert!(!l.expires_within(days(10), days(20)), "now is exclusive");
    }

    #[test]
    fn expires_within_ignores_zero_amounts() {
        let l = list(&[(0, 10)]);
        assert!(!l.expires_within(t0(), days(20)));
    }
}
