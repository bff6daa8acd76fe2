//! Time utilities.

use chrono::{FixedOffset, Timelike, Utc};

/// Wall clock reporting nanoseconds since local midnight in a fixed UTC
/// offset, the timestamp unit used by every outbound message.
#[derive(Debug, Clone, Copy)]
pub struct MidnightClock {
    offset: FixedOffset,
}

impl MidnightClock {
    /// Build a clock for the given UTC offset in hours (east positive).
    ///
    /// Offsets outside ±23 hours fall back to UTC.
    pub fn from_offset_hours(hours: i32) -> Self {
        let offset = FixedOffset::east_opt(hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
        Self { offset }
    }

    /// Nanoseconds elapsed since local midnight:
    /// `(((H*60 + M)*60 + S)*10^6 + micros)*10^3`.
    pub fn nanoseconds_since_midnight(&self) -> u64 {
        let now = Utc::now().with_timezone(&self.offset);
        let mut timestamp = u64::from(now.hour());
        timestamp = timestamp * 60 + u64::from(now.minute());
        timestamp = timestamp * 60 + u64::from(now.second());
        timestamp = timestamp * 1_000_000 + u64::from(now.nanosecond() / 1_000);
        timestamp * 1_000
    }
}
