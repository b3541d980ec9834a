//! Clock input and the event-loop seam.
//!
//! All deferred work in the crate (day/night recheck, scroll-idle debounce,
//! frame coalescing, blob drift, toast expiry) goes through [`Scheduler`].
//! The browser implementation maps onto `setTimeout`, `setInterval`, and
//! `requestAnimationFrame`; tests use `testing::ManualScheduler`.

#[cfg(test)]
#[path = "schedule_test.rs"]
mod schedule_test;

use crate::dispose::Disposer;

const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_HOUR: i64 = 3_600_000;

/// A point in time plus the local UTC offset in effect at that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp {
    /// Milliseconds since the Unix epoch (UTC).
    pub epoch_ms: i64,
    /// Minutes east of UTC (UTC+8 is `480`).
    pub utc_offset_minutes: i32,
}

impl Timestamp {
    #[must_use]
    pub fn new(epoch_ms: i64, utc_offset_minutes: i32) -> Self {
        Self { epoch_ms, utc_offset_minutes }
    }

    /// A UTC timestamp on the first epoch day at `hour:minute`.
    #[must_use]
    pub fn at_hour(hour: u8, minute: u8) -> Self {
        Self::new(i64::from(hour) * MS_PER_HOUR + i64::from(minute) * MS_PER_MINUTE, 0)
    }

    /// Hour of day (0–23) on the local wall clock.
    #[must_use]
    pub fn local_hour(self) -> u8 {
        let local_ms = self.epoch_ms + i64::from(self.utc_offset_minutes) * MS_PER_MINUTE;
        // rem_euclid keeps pre-epoch values in range; the result is always 0..24.
        u8::try_from(local_ms.div_euclid(MS_PER_HOUR).rem_euclid(24)).unwrap_or(0)
    }

    #[must_use]
    pub fn plus_ms(self, ms: i64) -> Self {
        Self { epoch_ms: self.epoch_ms + ms, ..self }
    }
}

/// Single-threaded event-loop services.
///
/// Callbacks run later on the same thread, never re-entrantly from inside the
/// registering call. Dropping the returned [`Disposer`] cancels the callback
/// if it has not run yet (or stops an interval).
pub trait Scheduler {
    fn now(&self) -> Timestamp;

    fn set_timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Disposer;

    fn set_interval(&self, period_ms: u32, task: Box<dyn FnMut()>) -> Disposer;

    /// Run `task` before the next repaint with a high-resolution timestamp.
    fn request_frame(&self, task: Box<dyn FnOnce(f64)>) -> Disposer;
}
