//! Time sources for archive timestamps

use chrono::{DateTime, TimeZone, Utc};

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Current instant as Unix seconds, clamped at zero
    fn unix_seconds(&self) -> u64 {
        self.now().timestamp().max(0) as u64
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock stuck at a single instant
///
/// Useful for reproducible archives and tests.
#[derive(Debug, Clone, Copy)]
pub struct FrozenClock(DateTime<Utc>);

impl FrozenClock {
    /// Clock stuck at `instant`
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    /// Clock stuck at the given Unix timestamp in seconds
    ///
    /// Timestamps chrono cannot represent fall back to the epoch.
    pub fn at_unix(seconds: i64) -> Self {
        let instant = Utc
            .timestamp_opt(seconds, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Self(instant)
    }
}

impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
