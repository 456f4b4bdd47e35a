//! # lapse-token
//!
//! **Collaborator plane**: the base fungible-token bookkeeping and the
//! privileged-caller gate that the expiring ledger calls into.
//!
//! ## Architecture
//!
//! The expiring ledger owns batch state only. Everything a plain token
//! would track lives behind two seams:
//! 1. **TokenLedger**: total supply plus a raw balance per account
//! 2. **AccessControl**: decides who may mint and reconfigure
//!
//! Each seam ships with an in-memory implementation ([`BaseLedger`],
//! [`OwnerGate`]) that is complete enough for production use in a single
//! process and for driving the core in tests.
//!
//! ```text
//! ExpiringLedger ──credit/debit/move──▶ TokenLedger
//!                ──require_authorized─▶ AccessControl
//! ```

pub mod access;
pub mod base_ledger;
pub mod token_ledger;

pub use access::{AccessControl, OwnerGate};
pub use base_ledger::BaseLedger;
pub use token_ledger::TokenLedger;
