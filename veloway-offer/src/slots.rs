use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use veloway_core::{CoreError, CoreResult};

/// A half-open `[start, end)` interval of wall-clock time. An interval whose
/// end is earlier than its start spans midnight: the end is treated as
/// belonging to the next day for duration, containment and overlap checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse a `HH:MM` pair. Malformed input is a validation error, surfaced
    /// before anything is mutated.
    pub fn parse(start: &str, end: &str) -> CoreResult<Self> {
        Ok(Self {
            start: parse_time(start)?,
            end: parse_time(end)?,
        })
    }

    /// Minutes from midnight, with the end pushed forward 24h when the
    /// interval wraps.
    fn span_minutes(&self) -> (i64, i64) {
        let start = i64::from(self.start.num_seconds_from_midnight()) / 60;
        let mut end = i64::from(self.end.num_seconds_from_midnight()) / 60;
        if end < start {
            end += 24 * 60;
        }
        (start, end)
    }

    pub fn duration_hours(&self) -> f64 {
        let (start, end) = self.span_minutes();
        (end - start) as f64 / 60.0
    }

    /// Two intervals overlap iff `startA < endB && startB < endA`, after
    /// midnight-wrap adjustment on both sides.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        let (start_a, end_a) = self.span_minutes();
        let (start_b, end_b) = other.span_minutes();
        start_a < end_b && start_b < end_a
    }

    /// Whether this interval lies entirely within the given window.
    pub fn within(&self, window: &TimeSlot) -> bool {
        let (start, end) = self.span_minutes();
        let (window_start, window_end) = window.span_minutes();
        start >= window_start && end <= window_end
    }
}

fn parse_time(value: &str) -> CoreResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| CoreError::validation(format!("malformed time '{value}', expected HH:MM")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(start: &str, end: &str) -> TimeSlot {
        TimeSlot::parse(start, end).unwrap()
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(TimeSlot::parse("9am", "11:00").is_err());
        assert!(TimeSlot::parse("09:00", "25:61").is_err());
    }

    #[test]
    fn test_overlap() {
        // The classic double-booking case
        assert!(slot("09:00", "11:00").overlaps(&slot("10:00", "12:00")));
        // Back-to-back slots share only the boundary instant
        assert!(!slot("09:00", "10:00").overlaps(&slot("10:00", "11:00")));
        assert!(!slot("09:00", "10:00").overlaps(&slot("12:00", "13:00")));
    }

    #[test]
    fn test_overlap_across_midnight() {
        // 22:00-02:00 wraps; a late-evening slot inside it collides
        assert!(slot("22:00", "02:00").overlaps(&slot("23:00", "23:30")));
        // An early-morning slot on the same date sits before the wrapped
        // interval starts
        assert!(!slot("23:00", "01:00").overlaps(&slot("00:30", "02:00")));
    }

    #[test]
    fn test_within_window() {
        let window = slot("08:00", "20:00");
        assert!(slot("09:00", "11:00").within(&window));
        assert!(!slot("07:00", "09:00").within(&window));
        assert!(!slot("19:00", "21:00").within(&window));
    }

    #[test]
    fn test_within_overnight_window() {
        let window = slot("22:00", "06:00");
        assert_eq!(window.duration_hours(), 8.0);
        assert!(slot("23:00", "01:00").within(&window));
        assert!(!slot("07:00", "09:00").within(&window));
    }

    #[test]
    fn test_duration() {
        assert_eq!(slot("09:00", "11:30").duration_hours(), 2.5);
        assert_eq!(slot("23:00", "01:00").duration_hours(), 2.0);
    }
}
