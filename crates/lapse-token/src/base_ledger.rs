//! In-memory base-token ledger.
//!
//! Tracks total supply and a raw balance per account. All mutations are
//! atomic: either the full operation succeeds or the ledger is unchanged.

use std::collections::HashMap;

use lapse_types::{AccountId, LapseError, Result};
use rust_decimal::Decimal;

use crate::token_ledger::TokenLedger;

/// Total supply plus a per-account raw balance table.
///
/// Accounts whose balance drops to zero are removed from the table, so an
/// emptied account looks exactly like one that never existed.
#[derive(Debug, Clone, Default)]
pub struct BaseLedger {
    /// Per-account raw balances.
    balances: HashMap<AccountId, Decimal>,
    /// Total issued amount.
    supply: Decimal,
}

impl BaseLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
            supply: Decimal::ZERO,
        }
    }

    /// Number of accounts with a non-zero balance.
    #[must_use]
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Sum of all per-account balances, or `None` if it is not
    /// representable. Equal to `total_supply` unless a supply-only debit has
    /// been issued.
    #[must_use]
    pub fn sum_of_balances(&self) -> Option<Decimal> {
        self.balances
            .values()
            .try_fold(Decimal::ZERO, |sum, balance| sum.checked_add(*balance))
    }

    fn set_balance(&mut self, account: AccountId, balance: Decimal) {
        if balance.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, balance);
        }
    }
}

fn ensure_non_negative(amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(LapseError::InvalidAmount { amount });
    }
    Ok(())
}

impl TokenLedger for BaseLedger {
    fn credit_supply_and_balance(&mut self, account: AccountId, amount: Decimal) -> Result<()> {
        ensure_non_negative(amount)?;
        let balance = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or(LapseError::SupplyOverflow)?;
        let supply = self
            .supply
            .checked_add(amount)
            .ok_or(LapseError::SupplyOverflow)?;
        self.set_balance(account, balance);
        self.supply = supply;
        Ok(())
    }

    fn debit_supply_and_balance(&mut self, account: AccountId, amount: Decimal) -> Result<()> {
        ensure_non_negative(amount)?;
        let balance = self.balance_of(account);
        if balance < amount {
            return Err(LapseError::BalanceUnderflow { account });
        }
        if self.supply < amount {
            return Err(LapseError::SupplyUnderflow);
        }
        self.set_balance(account, balance - amount);
        self.supply -= amount;
        Ok(())
    }

    fn debit_supply(&mut self, amount: Decimal) -> Result<()> {
        ensure_non_negative(amount)?;
        if self.supply < amount {
            return Err(LapseError::SupplyUnderflow);
        }
        self.supply -= amount;
        Ok(())
    }

    fn move_balance(&mut self, from: AccountId, to: AccountId, amount: Decimal) -> Result<()> {
        ensure_non_negative(amount)?;
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(LapseError::BalanceUnderflow { account: from });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LapseError::SupplyOverflow)?;
        self.set_balance(from, from_balance - amount);
        self.set_balance(to, to_balance);
        Ok(())
    }

    fn balance_of(&self, account: AccountId) -> Decimal {
        self.balances.get(&account).copied().unwrap_or(Decimal::ZERO)
    }

    fn total_supply(&self) -> Decimal {
        self.supply
    }

    fn holders(&self) -> Vec<(AccountId, Decimal)> {
        let mut holders: Vec<_> = self
            .balances
            .iter()
            .map(|(account, balance)| (*account, *balance))
            .collect();
        holders.sort_by_key(|(account, _)| *account);
        holders
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn credit_increases_balance_and_supply() {
        let mut ledger = BaseLedger::new();
        let alice = AccountId::new();
        ledger.credit_supply_and_balance(alice, dec(1000)).unwrap();
        assert_eq!(ledger.balance_of(alice), dec(1000));
        assert_eq!(ledger.total_supply(), dec(1000));
    }

    #[test]
    fn credit_rejects_negative() {
        let mut ledger = BaseLedger::new();
        let err = ledger
            .credit_supply_and_balance(AccountId::new(), dec(-1))
            .unwrap_err();
        assert!(matches!(err, LapseError::InvalidAmount { .. }));
        assert_eq!(ledger.total_supply(), Decimal::ZERO);
    }

    #[test]
    fn debit_reduces_balance_and_supply() {
        let mut ledger = BaseLedger::new();
        let alice = AccountId::new();
        ledger.credit_supply_and_balance(alice, dec(1000)).unwrap();
        ledger.debit_supply_and_balance(alice, dec(400)).unwrap();
        assert_eq!(ledger.balance_of(alice), dec(600));
        assert_eq!(ledger.total_supply(), dec(600));
    }

    #[test]
    fn debit_insufficient_fails_unchanged() {
        let mut ledger = BaseLedger::new();
        let alice = AccountId::new();
        ledger.credit_supply_and_balance(alice, dec(100)).unwrap();
        let err = ledger.debit_supply_and_balance(alice, dec(200)).unwrap_err();
        assert!(matches!(err, LapseError::BalanceUnderflow { account } if account == alice));
        // Balance unchanged
        assert_eq!(ledger.balance_of(alice), dec(100));
        assert_eq!(ledger.total_supply(), dec(100));
    }

    #[test]
    fn debit_supply_leaves_balances() {
        let mut ledger = BaseLedger::new();
        let alice = AccountId::new();
        ledger.credit_supply_and_balance(alice, dec(100)).unwrap();
        ledger.debit_supply(dec(30)).unwrap();
        assert_eq!(ledger.total_supply(), dec(70));
        assert_eq!(ledger.balance_of(alice), dec(100));
        assert_eq!(ledger.sum_of_balances(), Some(dec(100)));
    }

    #[test]
    fn credit_overflow_fails_unchanged() {
        let mut ledger = BaseLedger::new();
        let alice = AccountId::new();
        let bob = AccountId::new();
        ledger.credit_supply_and_balance(alice, Decimal::MAX).unwrap();

        let err = ledger.credit_supply_and_balance(bob, Decimal::ONE).unwrap_err();
        assert!(matches!(err, LapseError::SupplyOverflow));
        assert_eq!(ledger.balance_of(bob), Decimal::ZERO);
        assert_eq!(ledger.total_supply(), Decimal::MAX);

        let err = ledger.credit_supply_and_balance(alice, Decimal::ONE).unwrap_err();
        assert!(matches!(err, LapseError::SupplyOverflow));
        assert_eq!(ledger.balance_of(alice), Decimal::MAX);
    }

    #[test]
    fn move_overflow_fails_unchanged() {
        let mut ledger = BaseLedger::new();
        let alice = AccountId::new();
        let bob = AccountId::new();
        ledger.credit_supply_and_balance(alice, Decimal::MAX).unwrap();
        ledger.debit_supply(dec(1)).unwrap();
        ledger.credit_supply_and_balance(bob, dec(1)).unwrap();

        let err = ledger.move_balance(alice, bob, Decimal::MAX).unwrap_err();
        assert!(matches!(err, LapseError::SupplyOverflow));
        assert_eq!(ledger.balance_of(alice), Decimal::MAX);
        assert_eq!(ledger.balance_of(bob), dec(1));
        assert_eq!(ledger.sum_of_balances(), None);
    }

    #[test]
    fn holders_are_sorted_and_skip_empty() {
        let mut ledger = BaseLedger::new();
        let a = AccountId::deterministic("holders", 0);
        let b = AccountId::deterministic("holders", 1);
        let c = AccountId::deterministic("holders", 2);
        ledger.credit_supply_and_balance(a, dec(1)).unwrap();
        ledger.credit_supply_and_balance(b, dec(2)).unwrap();
        ledger.credit_supply_and_balance(c, dec(3)).unwrap();
        ledger.debit_supply_and_balance(b, dec(2)).unwrap();

        let mut expected = vec![(a, dec(1)), (c, dec(3))];
        expected.sort_by_key(|(account, _)| *account);
        assert_eq!(ledger.holders(), expected);
    }

    #[test]
    fn debit_supply_underflow() {
        let mut ledger = BaseLedger::new();
        let err = ledger.debit_supply(dec(1)).unwrap_err();
        assert!(matches!(err, LapseError::SupplyUnderflow));
    }

    #[test]
    fn move_balance_between_accounts() {
        let mut ledger = BaseLedger::new();
        let alice = AccountId::new();
        let bob = AccountId::new();
        ledger.credit_supply_and_balance(alice, dec(100)).unwrap();
        ledger.move_balance(alice, bob, dec(40)).unwrap();
        assert_eq!(ledger.balance_of(alice), dec(60));
        assert_eq!(ledger.balance_of(bob), dec(40));
        assert_eq!(ledger.total_supply(), dec(100));
    }

    #[test]
    fn move_balance_insufficient_fails_unchanged() {
        let mut ledger = BaseLedger::new();
        let alice = AccountId::new();
        let bob = AccountId::new();
        ledger.credit_supply_and_balance(alice, dec(10)).unwrap();
        assert!(ledger.move_balance(alice, bob, dec(11)).is_err());
        assert_eq!(ledger.balance_of(alice), dec(10));
        assert_eq!(ledger.balance_of(bob), Decimal::ZERO);
    }

    #[test]
    fn move_to_self_is_noop() {
        let mut ledger = BaseLedger::new();
        let alice = AccountId::new();
        ledger.credit_supply_and_balance(alice, dec(10)).unwrap();
        ledger.move_balance(alice, alice, dec(10)).unwrap();
        assert_eq!(ledger.balance_of(alice), dec(10));
    }

    #[test]
    fn emptied_account_is_forgotten() {
        let mut ledger = BaseLedger::new();
        let alice = AccountId::new();
        ledger.credit_supply_and_balance(alice, dec(5)).unwrap();
        assert_eq!(ledger.holder_count(), 1);
        ledger.debit_supply_and_balance(alice, dec(5)).unwrap();
        assert_eq!(ledger.holder_count(), 0);
    }

    #[test]
    fn nonexistent_balance_is_zero() {
        let ledger = BaseLedger::new();
        assert_eq!(ledger.balance_of(AccountId::new()), Decimal::ZERO);
    }
}
