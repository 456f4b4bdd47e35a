//! System-wide constants for the Lapse ledger.

/// Default lifetime of minted value when the caller does not choose one
/// (30 days, in seconds).
pub const DEFAULT_EXPIRY_SECS: u64 = 30 * 24 * 60 * 60;

/// Batch-list length above which an account is logged as bloated.
pub const DEFAULT_BATCH_WARN_THRESHOLD: usize = 256;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Lapse";
