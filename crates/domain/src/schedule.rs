//! Weekly heating schedule entries.
//!
//! An entry is active on its configured weekdays within `[start, end)`.
//! Windows may wrap past midnight, in which case the tail spills into the
//! following day. Entries for one zone must not overlap; insertion order is
//! observable because simultaneously active entries resolve to the
//! most-recently-defined one.

use chrono::{Datelike, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::Timestamp;
use crate::zone::PresetMode;

const MINUTES_PER_DAY: u32 = 24 * 60;
const MINUTES_PER_WEEK: u32 = 7 * MINUTES_PER_DAY;

/// What an active schedule entry resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleTarget {
    /// A fixed target temperature in °C.
    Temperature(f64),
    /// A preset reference, resolved through the zone/global preset tables.
    Preset(PresetMode),
}

/// One window of a zone's weekly schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub days: Vec<Weekday>,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub target: ScheduleTarget,
}

impl ScheduleEntry {
    /// Whether this entry is active at the given instant.
    ///
    /// Same-day windows match `start <= t < end` on a configured day.
    /// Wrapping windows (`end <= start`) match from `start` on a configured
    /// day through `end` on the following day.
    #[must_use]
    pub fn is_active_at(&self, at: Timestamp) -> bool {
        let minute = minute_of_week(at.weekday(), at.time());
        self.week_segments()
            .iter()
            .any(|&(from, to)| minute >= from && minute < to)
    }

    /// Expand into non-wrapping `[from, to)` minute-of-week segments.
    fn week_segments(&self) -> Vec<(u32, u32)> {
        let start = minute_of_day(self.start);
        let end = minute_of_day(self.end);
        let mut segments = Vec::with_capacity(self.days.len() * 2);
        for day in &self.days {
            let base = day.num_days_from_monday() * MINUTES_PER_DAY;
            if start < end {
                segments.push((base + start, base + end));
            } else {
                // Wraps past midnight: tail lands on the next day.
                segments.push((base + start, base + MINUTES_PER_DAY));
                let next = (base + MINUTES_PER_DAY) % MINUTES_PER_WEEK;
                segments.push((next, next + end));
            }
        }
        segments
    }

    /// Whether two entries are ever active at the same minute.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> Option<Weekday> {
        for &(a_from, a_to) in &self.week_segments() {
            for &(b_from, b_to) in &other.week_segments() {
                if a_from < b_to && b_from < a_to {
                    return Some(weekday_of_minute(a_from.max(b_from)));
                }
            }
        }
        None
    }

    /// Check entry-local invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyScheduleWindow`] when `start == end`,
    /// or [`ValidationError::ImplausibleTemperature`] for out-of-range fixed
    /// targets.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.start == self.end {
            return Err(ValidationError::EmptyScheduleWindow);
        }
        if let ScheduleTarget::Temperature(t) = self.target {
            if !(0.0..=35.0).contains(&t) {
                return Err(ValidationError::ImplausibleTemperature(t));
            }
        }
        Ok(())
    }
}

/// Find the entry governing `at`, if any.
///
/// Entries are scanned in insertion order and the **last** match wins, so
/// a more recently defined entry shadows an older one. This tie-break is
/// deliberate and relied upon by callers.
#[must_use]
pub fn active_entry(entries: &[ScheduleEntry], at: Timestamp) -> Option<&ScheduleEntry> {
    entries.iter().rfind(|e| e.is_active_at(at))
}

fn minute_of_day(t: NaiveTime) -> u32 {
    use chrono::Timelike;
    t.hour() * 60 + t.minute()
}

fn minute_of_week(day: Weekday, t: NaiveTime) -> u32 {
    day.num_days_from_monday() * MINUTES_PER_DAY + minute_of_day(t)
}

fn weekday_of_minute(minute: u32) -> Weekday {
    match (minute % MINUTES_PER_WEEK) / MINUTES_PER_DAY {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(days: Vec<Weekday>, start: &str, end: &str, temp: f64) -> ScheduleEntry {
        ScheduleEntry {
            days,
            start: start.parse().unwrap(),
            end: end.parse().unwrap(),
            target: ScheduleTarget::Temperature(temp),
        }
    }

    /// 2024-01-01 was a Monday.
    fn monday_at(hour: u32, minute: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    fn tuesday_at(hour: u32, minute: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 2, hour, minute, 0).unwrap()
    }

    #[test]
    fn should_be_active_inside_same_day_window() {
        let e = entry(vec![Weekday::Mon], "06:00:00", "09:00:00", 21.0);
        assert!(e.is_active_at(monday_at(7, 30)));
    }

    #[test]
    fn should_treat_window_as_half_open() {
        let e = entry(vec![Weekday::Mon], "06:00:00", "09:00:00", 21.0);
        assert!(e.is_active_at(monday_at(6, 0)));
        assert!(!e.is_active_at(monday_at(9, 0)));
    }

    #[test]
    fn should_not_be_active_on_unconfigured_day() {
        let e = entry(vec![Weekday::Mon], "06:00:00", "09:00:00", 21.0);
        assert!(!e.is_active_at(tuesday_at(7, 0)));
    }

    #[test]
    fn should_wrap_past_midnight_into_next_day() {
        let e = entry(vec![Weekday::Mon], "22:00:00", "06:00:00", 18.0);
        assert!(e.is_active_at(monday_at(23, 0)));
        assert!(e.is_active_at(tuesday_at(3, 0)));
        assert!(!e.is_active_at(tuesday_at(7, 0)));
        assert!(!e.is_active_at(monday_at(12, 0)));
    }

    #[test]
    fn should_detect_overlap_on_shared_day() {
        let a = entry(vec![Weekday::Mon], "06:00:00", "09:00:00", 21.0);
        let b = entry(vec![Weekday::Mon], "08:00:00", "10:00:00", 19.0);
        assert_eq!(a.overlaps(&b), Some(Weekday::Mon));
    }

    #[test]
    fn should_not_detect_overlap_on_disjoint_days() {
        let a = entry(vec![Weekday::Mon], "06:00:00", "09:00:00", 21.0);
        let b = entry(vec![Weekday::Tue], "06:00:00", "09:00:00", 21.0);
        assert!(a.overlaps(&b).is_none());
    }

    #[test]
    fn should_detect_overlap_through_midnight_wrap() {
        let a = entry(vec![Weekday::Mon], "22:00:00", "06:00:00", 18.0);
        let b = entry(vec![Weekday::Tue], "05:00:00", "08:00:00", 21.0);
        assert_eq!(a.overlaps(&b), Some(Weekday::Tue));
    }

    #[test]
    fn should_resolve_tie_to_most_recently_defined_entry() {
        let older = entry(vec![Weekday::Mon], "06:00:00", "12:00:00", 20.0);
        let newer = entry(vec![Weekday::Mon], "08:00:00", "10:00:00", 22.0);
        let entries = vec![older, newer.clone()];
        let winner = active_entry(&entries, monday_at(9, 0)).unwrap();
        assert_eq!(*winner, newer);
    }

    #[test]
    fn should_return_none_when_no_entry_is_active() {
        let entries = vec![entry(vec![Weekday::Mon], "06:00:00", "09:00:00", 21.0)];
        assert!(active_entry(&entries, monday_at(12, 0)).is_none());
    }

    #[test]
    fn should_reject_zero_length_window() {
        let e = entry(vec![Weekday::Mon], "06:00:00", "06:00:00", 21.0);
        assert_eq!(e.validate(), Err(ValidationError::EmptyScheduleWindow));
    }

    #[test]
    fn should_reject_implausible_temperature() {
        let e = entry(vec![Weekday::Mon], "06:00:00", "09:00:00", 90.0);
        assert!(matches!(
            e.validate(),
            Err(ValidationError::ImplausibleTemperature(_))
        ));
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let e = entry(vec![Weekday::Mon, Weekday::Fri], "06:00:00", "09:00:00", 21.0);
        let json = serde_json::to_string(&e).unwrap();
        let parsed: ScheduleEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, e);
    }
}
