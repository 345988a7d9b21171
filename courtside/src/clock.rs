//! Injected time source for match timestamps.

use chrono::{DateTime, Utc};

/// A monotonic wall-clock that stamps match starts and ends.
///
/// The engine never reads the system time directly so tests can
/// substitute a deterministic clock.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The default clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
