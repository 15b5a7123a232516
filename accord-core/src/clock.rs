//! Injectable clock, so engines never call `Utc::now()` directly and
//! timeout/deadline logic can be driven deterministically in tests.

use chrono::{DateTime, Utc};
use std::sync::Arc;

pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock whose value is set explicitly by tests, so round-timeout and
/// access-expiry logic can be exercised without real delays.
#[derive(Debug, Clone)]
pub struct TestClock {
    now: Arc<parking_lot::Mutex<DateTime<Utc>>>,
}

impl TestClock {
    pub fn at(initial: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(parking_lot::Mutex::new(initial)),
        }
    }

    pub fn set(&self, value: DateTime<Utc>) {
        *self.now.lock() = value;
    }

    pub fn advance(&self, duration: chrono::Duration) {
        let mut guard = self.now.lock();
        *guard = *guard + duration;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

pub type SharedClock = Arc<dyn Clock>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances_explicitly() {
        let start = Utc::now();
        let clock = TestClock::at(start);
        assert_eq!(clock.now(), start);
        clock.advance(chrono::Duration::seconds(30));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(30));
    }
}
