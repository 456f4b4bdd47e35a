//! Supply conservation invariant checker.
//!
//! Every unit of value enters through a mint and leaves through a burn or a
//! sweep reclamation:
//! ```text
//! total_supply == Σ(minted) - Σ(burned) - Σ(reclaimed)
//!              == Σ(all stored batch amounts, expired included)
//! ∀ account: balance_of(account) == live(account) + expired(account)
//! ```
//!
//! If this invariant ever breaks, batch state and the token ledger have
//! drifted apart and the ledger must not be trusted.
//!
//! Totals are cumulative and checked: once lifetime minting reaches
//! `Decimal::MAX`, further mints fail with `SupplyOverflow`. Burned and
//! reclaimed value always came out of minted value, so their sum stays
//! below `minted` and `expected_supply` cannot overflow.

use lapse_types::{LapseError, Result};
use rust_decimal::Decimal;

/// Tracks supply flows and validates conservation on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplyConservation {
    /// Total minted since genesis.
    minted: Decimal,
    /// Total burned at holders' request.
    burned: Decimal,
    /// Total expired value retired by sweeps.
    reclaimed: Decimal,
}

impl SupplyConservation {
    /// Create a new tracker with all totals at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            minted: Decimal::ZERO,
            burned: Decimal::ZERO,
            reclaimed: Decimal::ZERO,
        }
    }

    /// # Errors
    /// `SupplyOverflow` (totals unchanged) if the minted total would exceed
    /// `Decimal::MAX`.
    pub fn record_mint(&mut self, amount: Decimal) -> Result<()> {
        self.minted = checked_total(self.minted, amount)?;
        Ok(())
    }

    pub fn record_burn(&mut self, amount: Decimal) -> Result<()> {
        self.burned = checked_total(self.burned, amount)?;
        Ok(())
    }

    pub fn record_reclaim(&mut self, amount: Decimal) -> Result<()> {
        self.reclaimed = checked_total(self.reclaimed, amount)?;
        Ok(())
    }

    /// Expected total supply: minted - burned - reclaimed.
    #[must_use]
    pub fn expected_supply(&self) -> Decimal {
        self.minted - self.burned - self.reclaimed
    }

    /// Verify that `actual_supply` matches the expected supply.
    ///
    /// # Errors
    /// Returns [`LapseError::ConservationViolation`] if actual ≠ expected.
    pub fn verify(&self, actual_supply: Decimal) -> Result<()> {
        let expected = self.expected_supply();
        if actual_supply != expected {
            return Err(LapseError::ConservationViolation {
                reason: format!(
                    "actual supply {actual_supply} != expected {expected} \
                     (minted={}, burned={}, reclaimed={})",
                    self.minted, self.burned, self.reclaimed,
                ),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn total_minted(&self) -> Decimal {
        self.minted
    }

    #[must_use]
    pub fn total_burned(&self) -> Decimal {
        self.burned
    }

    #[must_use]
    pub fn total_reclaimed(&self) -> Decimal {
        self.reclaimed
    }
}

fn checked_total(total: Decimal, amount: Decimal) -> Result<Decimal> {
    total.checked_add(amount).ok_or(LapseError::SupplyOverflow)
}
