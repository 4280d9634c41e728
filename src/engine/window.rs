//! Deal-cycle window arithmetic.
//!
//! A chain's active window is the most recent 7-day span that started on the
//! chain's start weekday at or before "now", measured from local midnight.
//! Pure date math: no wall-clock reads, no IO.

use crate::domain::{StartDay, TimeMs};
use chrono::{Datelike, Duration, FixedOffset, TimeZone, Utc};

/// Length of a deal cycle in milliseconds.
pub const CYCLE_LEN_MS: i64 = 7 * 86_400_000;

/// The active deal window for some instant: `[start, start + 7d - 1ms]`,
/// inclusive at both ends with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleWindow {
    start_ms: i64,
    end_ms: i64,
}

impl CycleWindow {
    /// Compute the window active at `now` for a cycle starting on `start_day`.
    ///
    /// `offset` fixes what "local midnight" means. Returns None when `now`
    /// is outside chrono's representable range; callers treat that as
    /// "no window" and fail closed.
    pub fn containing(now: TimeMs, start_day: StartDay, offset: FixedOffset) -> Option<Self> {
        let now_utc = Utc.timestamp_millis_opt(now.as_ms()).single()?;
        let today = now_utc.with_timezone(&offset).date_naive();

        // Both indices are Sunday-based 0-6, so the most recent start
        // weekday at or before today is a plain modular step back.
        let today_idx = today.weekday().num_days_from_sunday();
        let start_idx = start_day.calendar_index();
        let days_back = (today_idx + 7 - start_idx) % 7;

        let start_date = today.checked_sub_signed(Duration::days(days_back as i64))?;
        let start_local = start_date.and_hms_opt(0, 0, 0)?;
        // FixedOffset has no gaps or folds, so local midnight always maps
        // to exactly one instant.
        let start = offset.from_local_datetime(&start_local).single()?;

        let start_ms = start.timestamp_millis();
        Some(CycleWindow {
            start_ms,
            end_ms: start_ms + CYCLE_LEN_MS - 1,
        })
    }

    /// True iff `t` falls within the window (inclusive both ends).
    pub fn contains(&self, t: TimeMs) -> bool {
        let ms = t.as_ms();
        ms >= self.start_ms && ms <= self.end_ms
    }

    /// Window start in milliseconds (cycle start, local midnight).
    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    /// Window end in milliseconds (start + 6d 23:59:59.999).
    pub fn end_ms(&self) -> i64 {
        self.end_ms
    }
}
