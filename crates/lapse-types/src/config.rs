//! Ledger configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{LapseError, Result, constants};

/// Tunables for an expiring ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Lifetime given to minted value when the mint uses `Expiry::Default`.
    pub default_expiry_secs: u64,
    /// Batch-list length above which an account is logged as bloated.
    pub batch_warn_threshold: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_expiry_secs: constants::DEFAULT_EXPIRY_SECS,
            batch_warn_threshold: constants::DEFAULT_BATCH_WARN_THRESHOLD,
        }
    }
}

impl LedgerConfig {
    /// Parse and validate a JSON config document. Missing fields take
    /// their defaults.
    ///
    /// # Errors
    /// Returns `Configuration` if the document is malformed or invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| LapseError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// Returns `Configuration` for a zero default expiry, a default expiry
    /// too large to represent, or a zero warn threshold.
    pub fn validate(&self) -> Result<()> {
        if self.default_expiry_secs == 0 {
            return Err(LapseError::Configuration(
                "default_expiry_secs must be > 0".into(),
            ));
        }
        if i64::try_from(self.default_expiry_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .is_none()
        {
            return Err(LapseError::Configuration(format!(
                "default_expiry_secs {} is out of range",
                self.default_expiry_secs
            )));
        }
        if self.batch_warn_threshold == 0 {
            return Err(LapseError::Configuration(
                "batch_warn_threshold must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// The default lifetime as a `chrono::Duration`. Saturates for values
    /// that `validate` would reject.
    #[must_use]
    pub fn default_expiry(&self) -> Duration {
        i64::try_from(self.default_expiry_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }
}
