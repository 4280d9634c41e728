//! Deal cycle configuration: the recurring weekly promo window of a chain.

use serde::{Deserialize, Serialize};

/// Weekday a chain's deal cycle begins, 1 = Monday .. 7 = Sunday.
///
/// Values outside 1-7 never construct; reference data carrying a bad start
/// day simply yields no cycle, and downstream evaluation fails closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct StartDay(u8);

impl StartDay {
    /// Create a StartDay, rejecting anything outside 1-7.
    pub fn new(day: u8) -> Option<Self> {
        (1..=7).contains(&day).then_some(StartDay(day))
    }

    /// Create a StartDay from a wider integer (e.g. a database column).
    pub fn from_i64(day: i64) -> Option<Self> {
        u8::try_from(day).ok().and_then(Self::new)
    }

    /// The raw 1-7 value.
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// The 0-6 Sunday-based calendar index (7 = Sunday wraps to 0).
    ///
    /// Matches chrono's `num_days_from_sunday` numbering so window math can
    /// compare weekday indices directly.
    pub fn calendar_index(&self) -> u32 {
        (self.0 % 7) as u32
    }
}

impl TryFrom<u8> for StartDay {
    type Error = String;

    fn try_from(day: u8) -> Result<Self, Self::Error> {
        StartDay::new(day).ok_or_else(|| format!("start day must be 1-7, got {}", day))
    }
}

impl From<StartDay> for u8 {
    fn from(day: StartDay) -> u8 {
        day.0
    }
}

/// A chain's recurring weekly deal window, defined by its start weekday.
///
/// Cycles are contiguous 7-day windows with no gaps or overlaps; exactly one
/// start day exists per chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealCycle {
    pub start_day: StartDay,
}

impl DealCycle {
    /// Create a DealCycle with the given start day.
    pub fn new(start_day: StartDay) -> Self {
        DealCycle { start_day }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_day_accepts_1_through_7() {
        for day in 1..=7u8 {
            assert!(StartDay::new(day).is_some(), "day {} should be valid", day);
        }
    }

    #[test]
    fn test_start_day_rejects_out_of_range() {
        assert!(StartDay::new(0).is_none());
        assert!(StartDay::new(8).is_none());
        assert!(StartDay::from_i64(-1).is_none());
        assert!(StartDay::from_i64(255).is_none());
    }

    #[test]
    fn test_calendar_index_sunday_wraps_to_zero() {
        // 1 = Monday maps to calendar index 1, 7 = Sunday wraps to 0.
        assert_eq!(StartDay::new(1).unwrap().calendar_index(), 1);
        assert_eq!(StartDay::new(4).unwrap().calendar_index(), 4);
        assert_eq!(StartDay::new(6).unwrap().calendar_index(), 6);
        assert_eq!(StartDay::new(7).unwrap().calendar_index(), 0);
    }

    #[test]
    fn test_start_day_serde_rejects_invalid() {
        let ok: Result<StartDay, _> = serde_json::from_str("4");
        assert_eq!(ok.unwrap().as_u8(), 4);

        let bad: Result<StartDay, _> = serde_json::from_str("9");
        assert!(bad.is_err());
    }

    #[test]
    fn test_deal_cycle_roundtrip() {
        let cycle = DealCycle::new(StartDay::new(4).unwrap());
        let json = serde_json::to_string(&cycle).unwrap();
        let back: DealCycle = serde_json::from_str(&json).unwrap();
        assert_eq!(cycle, back);
    }
}
