//! # lapse-types
//!
//! Shared types, errors, and configuration for the **Lapse** expiring-balance
//! ledger.
//!
//! This crate is the leaf dependency of the workspace. Every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`]
//! - **Batch model**: [`Batch`], [`TransferFragment`]
//! - **Expiry selection**: [`Expiry`]
//! - **Receipts**: [`MintReceipt`], [`BurnReceipt`], [`TransferReceipt`]
//! - **Time source**: [`Clock`], [`SystemClock`] (and `ManualClock` behind `test-helpers`)
//! - **Configuration**: [`LedgerConfig`]
//! - **Errors**: [`LapseError`] with `LP_ERR_` prefix codes
//! - **Constants**: system-wide defaults

pub mod batch;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod expiry;
pub mod ids;
pub mod receipt;

// Re-export all primary types at crate root for ergonomic imports:
//   use lapse_types::{AccountId, Batch, Expiry, LapseError, ...};

pub use batch::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use expiry::*;
pub use ids::*;
pub use receipt::*;

// Constants are accessed via `lapse_types::constants::FOO`
// (not re-exported to avoid name collisions).
