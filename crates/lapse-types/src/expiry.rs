//! How a mint chooses the expiry of the value it creates.

use chrono::{DateTime, Duration, Utc};

/// Expiry selection for a mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// An absolute instant.
    At(DateTime<Utc>),
    /// A lifetime measured from the operation's `now`.
    After(Duration),
    /// The ledger's configured default lifetime.
    Default,
}

impl Expiry {
    /// Resolve to an absolute instant.
    ///
    /// Saturates at the maximum representable instant instead of overflowing.
    #[must_use]
    pub fn resolve(self, now: DateTime<Utc>, default: Duration) -> DateTime<Utc> {
        match self {
            Self::At(at) => at,
            Self::After(lifetime) => now
                .checked_add_signed(lifetime)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            Self::Default => now
                .checked_add_signed(default)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

impl From<DateTime<Utc>> for Expiry {
    fn from(at: DateTime<Utc>) -> Self {
        Self::At(at)
    }
}

impl From<Duration> for Expiry {
    fn from(lifetime: Duration) -> Self {
        Self::After(lifetime)
    }
}
