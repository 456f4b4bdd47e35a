//! # lapse-core
//!
//! Core engine for the **Lapse** expiring-balance ledger.
//!
//! Every credited amount carries an expiry. Value stops being spendable the
//! moment its expiry passes and is retired from circulation lazily, when the
//! owning account is next swept.
//!
//! - [`BatchList`]: one account's `(amount, expiry)` batches with
//!   merge-on-insert and swap-remove
//! - [`BatchStore`]: per-account batch lists with staged copies for
//!   all-or-nothing operations
//! - [`ExpiringLedger`]: mint, burn, transfer and sweep kept in step with an
//!   injected token ledger
//! - [`SupplyConservation`]: minted − burned − reclaimed audit
//!
//! ## Batch Lifecycle
//!
//! ```text
//!   mint ──▶ ┌──────────┐  expiry passes  ┌──────────┐  sweep  ┌───────────┐
//!            │   LIVE   │────────────────▶│ EXPIRED  │────────▶│ RECLAIMED │
//! transfer ─▶│ spendable│                 │ visible, │         │ supply ↓  │
//!  (fragment)└──────────┘                 │ unspent  │         └───────────┘
//!                 │ burn / transfer       └──────────┘
//!                 ▼
//!            consumed (amount → 0, batch removed)
//! ```

pub mod batch_list;
pub mod batch_store;
pub mod conservation;
pub mod ledger;

pub use batch_list::BatchList;
pub use batch_store::BatchStore;
pub use conservation::SupplyConservation;
pub use ledger::{ExpiringLedger, InMemoryLedger};
