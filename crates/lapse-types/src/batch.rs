//! Batch value types.
//!
//! A [`Batch`] is an amount of ledger value tagged with a single expiry
//! instant. Batches carry no identity of their own: two batches of the same
//! account with the same `expires_at` are interchangeable and get merged on
//! insert.
//!
//! Liveness is strict on the expiry side:
//!
//! ```text
//!   live    ⇔  expires_at >  now
//!   expired ⇔  expires_at <= now
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount of value that stops being spendable at `expires_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Remaining amount. Never negative.
    pub amount: Decimal,
    /// Absolute instant after which the amount is no longer spendable.
    pub expires_at: DateTime<Utc>,
}

impl Batch {
    #[must_use]
    pub fn new(amount: Decimal, expires_at: DateTime<Utc>) -> Self {
        Self { amount, expires_at }
    }

    /// `true` while `now` is strictly before the expiry instant.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// `true` once `now` has reached the expiry instant.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_live(now)
    }
}

/// A portion of a sender's batch carried to the receiver during a transfer.
///
/// The fragment keeps the source batch's expiry, so value never gains
/// lifetime by changing hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFragment {
    pub amount: Decimal,
    pub expires_at: DateTime<Utc>,
}

impl From<TransferFragment> for Batch {
    fn from(fragment: TransferFragment) -> Self {
        Self::new(fragment.amount, fragment.expires_at)
    }
}
