//! Time source seam.
//!
//! The ledger never calls `Utc::now()` directly. It asks an injected
//! [`Clock`] once per operation and threads that single reading through
//! sweep, planning and consumption, so one call can never observe two
//! different "now"s.

use chrono::{DateTime, Utc};

/// Supplies the current instant. Readings must be non-decreasing.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Manually driven clock for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
pub use manual::ManualClock;

#[cfg(any(test, feature = "test-helpers"))]
mod manual {
    use std::sync::atomic::{AtomicI64, Ordering};

    use chrono::{DateTime, Duration, Utc};

    use super::Clock;

    /// A clock that only moves when told to. Millisecond resolution.
    #[derive(Debug)]
    pub struct ManualClock {
        millis: AtomicI64,
    }

    impl ManualClock {
        #[must_use]
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                millis: AtomicI64::new(start.timestamp_millis()),
            }
        }

        /// Clock starting at the current wall-clock instant (truncated to ms).
        #[must_use]
        pub fn starting_now() -> Self {
            Self::new(Utc::now())
        }

        /// Move the clock to `instant`. Moving backwards is a test bug.
        pub fn set(&self, instant: DateTime<Utc>) {
            let target = instant.timestamp_millis();
            let previous = self.millis.swap(target, Ordering::SeqCst);
            assert!(target >= previous, "ManualClock must not move backwards");
        }

        /// Advance the clock by `by`.
        pub fn advance(&self, by: Duration) {
            assert!(by >= Duration::zero(), "ManualClock must not move backwards");
            self.millis
                .fetch_add(by.num_milliseconds(), Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            let millis = self.millis.load(Ordering::SeqCst);
            DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::MAX_UTC)
        }
    }
}
