// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for cache TTLs and result timestamps

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// A clock that provides monotonic time for TTL arithmetic and wall time for
/// result metadata and persisted entries.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
    fn utc(&self) -> DateTime<Utc>;

    fn epoch_ms(&self) -> u64 {
        u64::try_from(self.utc().timestamp_millis()).unwrap_or(0)
    }
}

/// Real system clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::Clock;
    use chrono::{DateTime, Utc};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    struct FakeTime {
        instant: Instant,
        utc: DateTime<Utc>,
    }

    /// Fake clock for testing TTL expiry without sleeping.
    ///
    /// Both the monotonic and the wall-clock readings move together.
    #[derive(Clone)]
    pub struct FakeClock {
        time: Arc<Mutex<FakeTime>>,
    }

    impl FakeClock {
        pub fn new() -> Self {
            let utc = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default();
            Self { time: Arc::new(Mutex::new(FakeTime { instant: Instant::now(), utc })) }
        }

        /// Advance both readings by the given duration
        pub fn advance(&self, duration: Duration) {
            let mut time = self.time.lock();
            time.instant += duration;
            time.utc += chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
        }
    }

    impl Default for FakeClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.time.lock().instant
        }

        fn utc(&self) -> DateTime<Utc> {
            self.time.lock().utc
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeClock;

/// Milliseconds in a duration, saturating at `u64::MAX`.
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
