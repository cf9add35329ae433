//! Time source used by the reconnect spacing and the dampener

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration);
}

/// Wall clock with real sleeps
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Convert a config duration for timestamp arithmetic, saturating on overflow
pub fn delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
pub(crate) mod manual {
    use super::*;
    use std::sync::Mutex;

    /// Clock that only moves when told to; `sleep` advances it instantly
    pub struct ManualClock {
        now: Mutex<DateTime<Utc>>,
        sleeps: Mutex<Vec<Duration>>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                now: Mutex::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap()),
                sleeps: Mutex::new(Vec::new()),
            }
        }

        pub fn advance(&self, duration: Duration) {
            let mut now = self.now.lock().unwrap();
            *now = *now + delta(duration);
        }

        pub fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
            self.advance(duration);
        }
    }
}
