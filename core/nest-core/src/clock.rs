//! Time sources for expiry and session-window evaluation.
//!
//! Business logic never reads the wall clock directly; it asks a [`Clock`].
//! Production uses [`SystemClock`]; tests drive [`ManualClock`] across
//! midnight and interval boundaries without sleeping.

use std::sync::Mutex;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Offset, TimeZone, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Offset of the user's calendar at `at`. Calendar-day rollover is computed
    /// in this offset, so it must follow the device's local time zone.
    fn utc_offset(&self, at: DateTime<Utc>) -> FixedOffset {
        Local.from_utc_datetime(&at.naive_utc()).offset().fix()
    }

    /// Local calendar date of `at`.
    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.utc_offset(at)).date_naive()
    }
}

/// Wall-clock time in the process's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock with a fixed UTC offset.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    offset: FixedOffset,
}

impl ManualClock {
    /// Creates a clock pinned at `now`, observing calendar days in UTC.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_offset(now, Utc.fix())
    }

    pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now: Mutex::new(now),
            offset,
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn utc_offset(&self, _at: DateTime<Utc>) -> FixedOffset {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advance() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance(Duration::minutes(90));
        assert_eq!(clock.now(), start + Duration::minutes(90));
    }

    #[test]
    fn test_local_date_respects_offset() {
        // 02:00 UTC is still the previous evening in UTC-5.
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 2, 0, 0).unwrap();
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let clock = ManualClock::with_offset(at, offset);
        assert_eq!(
            clock.local_date(at),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
    }
}
