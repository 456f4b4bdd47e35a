//! Error types for the Lapse ledger.
//!
//! All errors use the `LP_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Expiry errors
//! - 2xx: Balance errors
//! - 3xx: Access-control errors
//! - 4xx: Invariant errors
//! - 9xx: General / internal errors

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::AccountId;

/// Central error enum for all Lapse operations.
#[derive(Debug, Error)]
pub enum LapseError {
    // =================================================================
    // Expiry Errors (1xx)
    // =================================================================
    /// A mint asked for an expiry that is not strictly in the future.
    #[error("LP_ERR_100: Invalid expiry: {expires_at} is not after {now}")]
    InvalidExpiry {
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    // =================================================================
    // Balance Errors (2xx)
    // =================================================================
    /// Burn or transfer asked for more than the live (non-expired) holdings.
    #[error("LP_ERR_200: Insufficient valid balance: need {needed}, have {available}")]
    InsufficientValidBalance { needed: Decimal, available: Decimal },

    /// A negative amount was passed to a mutating operation.
    #[error("LP_ERR_201: Invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    /// The token ledger's raw balance for an account would go negative.
    #[error("LP_ERR_202: Balance underflow for {account}")]
    BalanceUnderflow { account: AccountId },

    /// The token ledger's total supply would go negative.
    #[error("LP_ERR_203: Supply underflow")]
    SupplyUnderflow,

    /// An amount, balance, supply or running total would exceed `Decimal::MAX`.
    #[error("LP_ERR_204: Supply overflow")]
    SupplyOverflow,

    // =================================================================
    // Access-Control Errors (3xx)
    // =================================================================
    /// A privileged operation was attempted by a non-privileged caller.
    #[error("LP_ERR_300: Unauthorized caller: {caller}")]
    Unauthorized { caller: AccountId },

    // =================================================================
    // Invariant Errors (4xx)
    // =================================================================
    /// Batch state and token-ledger state disagree. Critical safety alert.
    #[error("LP_ERR_400: Conservation violation: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("LP_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("LP_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config document, out-of-range values).
    #[error("LP_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LapseError>;

impl From<serde_json::Error> for LapseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let now = Utc::now();
        let err = LapseError::InvalidExpiry {
            expires_at: now,
            now,
        };
        let msg = format!("{err}");
        assert!(msg.starts_with("LP_ERR_100"), "Got: {msg}");
    }

    #[test]
    fn insufficient_valid_balance_display() {
        let err = LapseError::InsufficientValidBalance {
            needed: Decimal::new(100, 0),
            available: Decimal::new(50, 0),
        };
        let msg = format!("{err}");
        assert!(msg.contains("LP_ERR_200"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn unauthorized_names_caller() {
        let caller = AccountId::deterministic("mallory", 0);
        let msg = format!("{}", LapseError::Unauthorized { caller });
        assert!(msg.contains("LP_ERR_300"));
        assert!(msg.contains(&caller.to_string()));
    }

    #[test]
    fn serde_json_error_converts() {
        let err: LapseError = serde_json::from_str::<u64>("not json").unwrap_err().into();
        assert!(matches!(err, LapseError::Serialization(_)));
    }

    #[test]
    fn all_errors_have_lp_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(LapseError::InvalidAmount {
                amount: Decimal::NEGATIVE_ONE,
            }),
            Box::new(LapseError::BalanceUnderflow {
                account: AccountId::new(),
            }),
            Box::new(LapseError::SupplyUnderflow),
            Box::new(LapseError::SupplyOverflow),
            Box::new(LapseError::ConservationViolation {
                reason: "test".into(),
            }),
            Box::new(LapseError::Internal("test".into())),
            Box::new(LapseError::Configuration("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("LP_ERR_"),
                "Error missing LP_ERR_ prefix: {msg}"
            );
        }
    }
}
