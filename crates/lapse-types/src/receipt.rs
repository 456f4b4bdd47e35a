//! Operation receipts.
//!
//! Each mutating ledger operation returns a receipt describing what it
//! actually did, including value reclaimed by the sweep that ran first, so
//! callers never need a second read to learn the outcome.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, TransferFragment};

/// Outcome of a mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    pub account: AccountId,
    pub amount: Decimal,
    /// The resolved absolute expiry.
    pub expires_at: DateTime<Utc>,
    /// Whether the amount joined an existing batch with the same expiry.
    pub merged: bool,
}

/// Outcome of a burn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnReceipt {
    pub account: AccountId,
    /// Live value destroyed at the caller's request.
    pub burned: Decimal,
    /// Expired value retired by the sweep that preceded the burn.
    pub reclaimed: Decimal,
}

/// Outcome of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Decimal,
    /// The portions moved, each keeping its source batch's expiry.
    pub fragments: Vec<TransferFragment>,
    /// Expired value retired from `from` by the sweep that preceded planning.
    pub reclaimed: Decimal,
}

impl TransferReceipt {
    /// Sum of fragment amounts. Always equals `amount`.
    #[must_use]
    pub fn fragment_total(&self) -> Decimal {
        self.fragments.iter().map(|f| f.amount).sum()
    }
}
