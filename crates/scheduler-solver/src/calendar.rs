//! Calendar mapper
//!
//! A pure bijection between an elapsed-working-minutes offset and a real
//! calendar datetime, given a weekday → (open, close) working-hours table.
//! The engine's decision variables count only working minutes; mapping to
//! wall-clock time is entirely a post-processing concern, never coupled to
//! the solver itself.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

use scheduler_core::CalendarEntry;

/// Safety bound on how many calendar days we will walk forward looking for
/// a working day.
const MAX_DAY_STEPS: i64 = 365;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CalendarError {
    /// No working day was found within `MAX_DAY_STEPS` days of the anchor —
    /// either every weekday is closed, or the walk ran past the safety bound.
    #[error("no working day found within {MAX_DAY_STEPS} days")]
    NoWorkingDay,
}

/// A weekly working-hours table: `open_close[weekday - 1]` gives
/// `(open_minute, close_minute)` for ISO weekday `weekday` (1 = Monday).
/// Missing weekdays are non-working (`open == close == 0`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Calendar {
    open_close: [(u32, u32); 7],
}

impl Calendar {
    /// Build a calendar from loaded entries. Duplicate weekdays are an input
    /// error and are rejected by the validator before this type is built;
    /// this constructor trusts its input is already deduplicated.
    pub fn from_entries(entries: &[CalendarEntry]) -> Self {
        let mut open_close = [(0u32, 0u32); 7];
        for entry in entries {
            if (1..=7).contains(&entry.weekday) {
                open_close[(entry.weekday - 1) as usize] = (entry.open_minute, entry.close_minute);
            }
        }
        Self { open_close }
    }

    /// `(open_minute, close_minute)` for the given ISO weekday (1 = Monday).
    /// Non-working days (including weekdays outside `1..=7`) return `(0, 0)`.
    pub fn open_close(&self, weekday: u8) -> (u32, u32) {
        if (1..=7).contains(&weekday) {
            self.open_close[(weekday - 1) as usize]
        } else {
            (0, 0)
        }
    }

    fn is_working_day(&self, date: NaiveDate) -> bool {
        let (open, close) = self.open_close(date.weekday().number_from_monday() as u8);
        close > open
    }

    /// Minutes of working time available on `date` (`0` if non-working).
    fn day_capacity(&self, date: NaiveDate) -> i64 {
        let (open, close) = self.open_close(date.weekday().number_from_monday() as u8);
        (close.saturating_sub(open)) as i64
    }

    /// Map an elapsed-working-minutes offset to a real datetime, anchored at
    /// `anchor`. Walks forward day by day, attributing each working day's
    /// `(close - open)` minutes of capacity to the cumulative total; the
    /// result is `anchor + k days + (open + residual) minutes` where `k` is
    /// the number of working days consumed.
    ///
    /// `elapsed = 0` returns the first instant of the first working day on
    /// or after `anchor`.
    pub fn to_datetime(&self, elapsed_minutes: i64, anchor: NaiveDate) -> Result<NaiveDateTime, CalendarError> {
        let mut date = anchor;
        let mut remaining = elapsed_minutes;

        for _ in 0..MAX_DAY_STEPS {
            let capacity = self.day_capacity(date);
            if capacity == 0 {
                date = date
                    .checked_add_days(Days::new(1))
                    .ok_or(CalendarError::NoWorkingDay)?;
                continue;
            }

            if remaining <= capacity {
                let (open, _) = self.open_close(date.weekday().number_from_monday() as u8);
                let minute_of_day = open as i64 + remaining;
                return Ok(date.and_time(minute_of_day_to_time(minute_of_day)));
            }

            remaining -= capacity;
            date = date
                .checked_add_days(Days::new(1))
                .ok_or(CalendarError::NoWorkingDay)?;
        }

        Err(CalendarError::NoWorkingDay)
    }

    /// Inverse of [`Calendar::to_datetime`]: the elapsed-working-minutes
    /// offset that maps to `when`, anchored at `anchor`. `when` must fall on
    /// or after the first working instant at or after `anchor`.
    pub fn to_elapsed_minutes(&self, when: NaiveDateTime, anchor: NaiveDate) -> Result<i64, CalendarError> {
        let mut date = anchor;
        let mut elapsed: i64 = 0;

        for _ in 0..MAX_DAY_STEPS {
            let capacity = self.day_capacity(date);
            if capacity == 0 {
                date = date
                    .checked_add_days(Days::new(1))
                    .ok_or(CalendarError::NoWorkingDay)?;
                continue;
            }

            if date == when.date() {
                let (open, close) = self.open_close(date.weekday().number_from_monday() as u8);
                let minute_of_day = time_to_minute_of_day(when.time());
                let clamped = minute_of_day.clamp(open as i64, close as i64);
                return Ok(elapsed + (clamped - open as i64));
            }

            elapsed += capacity;
            date = date
                .checked_add_days(Days::new(1))
                .ok_or(CalendarError::NoWorkingDay)?;
        }

        Err(CalendarError::NoWorkingDay)
    }

    /// Find the first working day on or after `from`. Used by the model
    /// builder's elapsed-minute-zero anchor and rejected up front at `run`
    /// start if no weekday in the table is ever working.
    pub fn first_working_day_on_or_after(&self, from: NaiveDate) -> Result<NaiveDate, CalendarError> {
        let mut date = from;
        for _ in 0..MAX_DAY_STEPS {
            if self.is_working_day(date) {
                return Ok(date);
            }
            date = date
                .checked_add_days(Days::new(1))
                .ok_or(CalendarError::NoWorkingDay)?;
        }
        Err(CalendarError::NoWorkingDay)
    }
}

fn minute_of_day_to_time(minute_of_day: i64) -> NaiveTime {
    let minute_of_day = minute_of_day.clamp(0, 1439) as u32;
    NaiveTime::from_hms_opt(minute_of_day / 60, minute_of_day % 60, 0).unwrap()
}

fn time_to_minute_of_day(time: NaiveTime) -> i64 {
    (time.hour() * 60 + time.minute()) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mon_fri_9_to_5() -> Calendar {
        Calendar::from_entries(&[
            CalendarEntry { weekday: 1, open_minute: 8 * 60, close_minute: 17 * 60 },
            CalendarEntry { weekday: 2, open_minute: 8 * 60, close_minute: 17 * 60 },
            CalendarEntry { weekday: 3, open_minute: 8 * 60, close_minute: 17 * 60 },
            CalendarEntry { weekday: 4, open_minute: 8 * 60, close_minute: 17 * 60 },
            CalendarEntry { weekday: 5, open_minute: 8 * 60, close_minute: 17 * 60 },
        ])
    }

    #[test]
    fn zero_elapsed_is_first_working_instant() {
        let cal = mon_fri_9_to_5();
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let dt = cal.to_datetime(0, monday).unwrap();
        assert_eq!(dt, monday.and_hms_opt(8, 0, 0).unwrap());
    }

    #[test]
    fn within_day_mapping() {
        // Scenario S1: T1 0->120 minutes on Monday 08:00-17:00
        let cal = mon_fri_9_to_5();
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let start = cal.to_datetime(0, monday).unwrap();
        let end = cal.to_datetime(120, monday).unwrap();
        assert_eq!(start, monday.and_hms_opt(8, 0, 0).unwrap());
        assert_eq!(end, monday.and_hms_opt(10, 0, 0).unwrap());
    }

    #[test]
    fn wraps_into_next_working_day() {
        // Scenario S4: Mon 08:00-17:00 only (540 working minutes/day).
        let cal = Calendar::from_entries(&[CalendarEntry {
            weekday: 1,
            open_minute: 8 * 60,
            close_minute: 17 * 60,
        }]);
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        // 600 minutes: 540 consumed by Monday, 60 minutes into the next Monday.
        let end = cal.to_datetime(600, monday).unwrap();
        let next_monday = monday + chrono::Duration::weeks(1);
        assert_eq!(end, next_monday.and_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn no_working_day_is_an_error() {
        let cal = Calendar::from_entries(&[]);
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(cal.to_datetime(0, monday), Err(CalendarError::NoWorkingDay));
    }

    #[test]
    fn round_trip_within_day() {
        let cal = mon_fri_9_to_5();
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let dt = cal.to_datetime(150, monday).unwrap();
        let back = cal.to_elapsed_minutes(dt, monday).unwrap();
        assert_eq!(back, 150);
    }
}
