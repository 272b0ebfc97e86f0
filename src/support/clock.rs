//! Passive clock abstraction
//!
//! Every timestamp the system generates (BootNotification response,
//! Heartbeat, Transaction.Begin/End synthesis) goes through [`Clock`] so
//! tests can pin time.

use std::sync::RwLock;

use chrono::{DateTime, SecondsFormat, Utc};

/// Passive time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current time formatted as RFC3339 with second precision, the format
    /// used on the OCPP wire.
    fn now_rfc3339(&self) -> String {
        self.now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests.
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().expect("clock lock poisoned") = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().expect("clock lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_settable() {
        let t0 = "2023-06-15T15:06:00+01:00".parse::<DateTime<Utc>>().unwrap();
        let clock = FixedClock::new(t0);
        assert_eq!(clock.now(), t0);

        let t1 = t0 + chrono::Duration::seconds(30);
        clock.set(t1);
        assert_eq!(clock.now(), t1);
    }

    #[test]
    fn rfc3339_has_second_precision() {
        let t0 = "2023-06-15T14:06:00Z".parse::<DateTime<Utc>>().unwrap();
        let clock = FixedClock::new(t0);
        assert_eq!(clock.now_rfc3339(), "2023-06-15T14:06:00Z");
    }
}
