//! Fixed clock for deterministic tests.

use crate::environment::Clock;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

/// Fixed clock for deterministic tests.
///
/// Returns the same time until advanced. Clones share the same time, so a
/// test can move the clock of an environment it has already built.
///
/// # Example
///
/// ```
/// use dmutils_auth::environment::Clock;
/// use dmutils_auth::mocks::FixedClock;
/// use chrono::Duration;
///
/// let clock = FixedClock::at("2025-01-01T00:00:00Z");
/// let before = clock.now();
/// clock.advance(Duration::days(1));
/// assert_eq!(clock.now() - before, Duration::days(1));
/// ```
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    /// Create a new fixed clock with the given time.
    #[must_use]
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time: Arc::new(Mutex::new(time)),
        }
    }

    /// Create a fixed clock from an RFC 3339 timestamp.
    ///
    /// # Panics
    ///
    /// Panics if `rfc3339` does not parse; only meant for literals in tests.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn at(rfc3339: &str) -> Self {
        Self::new(
            DateTime::parse_from_rfc3339(rfc3339)
                .expect("test timestamp should parse")
                .with_timezone(&Utc),
        )
    }

    /// Move the clock forward (or backward, for negative durations).
    pub fn advance(&self, by: Duration) {
        let mut time = self.time.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *time += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.time.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
