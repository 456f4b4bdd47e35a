//! The base-token bookkeeping seam.

use lapse_types::{AccountId, Result};
use rust_decimal::Decimal;

/// Supply and raw-balance bookkeeping the expiring ledger keeps in step
/// with its batches.
///
/// Every mutating method is all-or-nothing: on `Err` the implementation
/// must not have changed any state.
pub trait TokenLedger {
    /// Increase total supply and `account`'s raw balance.
    ///
    /// # Errors
    /// `SupplyOverflow` if either would exceed `Decimal::MAX`.
    fn credit_supply_and_balance(&mut self, account: AccountId, amount: Decimal) -> Result<()>;

    /// Decrease total supply and `account`'s raw balance.
    ///
    /// # Errors
    /// `BalanceUnderflow` or `SupplyUnderflow` if either would go negative.
    fn debit_supply_and_balance(&mut self, account: AccountId, amount: Decimal) -> Result<()>;

    /// Decrease total supply only.
    ///
    /// # Errors
    /// `SupplyUnderflow` if supply would go negative.
    fn debit_supply(&mut self, amount: Decimal) -> Result<()>;

    /// Move raw balance between accounts. Moving to self is a no-op.
    ///
    /// # Errors
    /// `BalanceUnderflow` if `from` holds less than `amount`,
    /// `SupplyOverflow` if `to`'s balance would exceed `Decimal::MAX`.
    fn move_balance(&mut self, from: AccountId, to: AccountId, amount: Decimal) -> Result<()>;

    /// Raw balance of `account` (zero for unknown accounts).
    fn balance_of(&self, account: AccountId) -> Decimal;

    /// Total issued amount.
    fn total_supply(&self) -> Decimal;

    /// Every account with a non-zero raw balance, sorted by account.
    fn holders(&self) -> Vec<(AccountId, Decimal)>;
}
