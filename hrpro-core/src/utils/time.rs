//! Working-day arithmetic
//!
//! A working day is any date that is not Saturday or Sunday. Holidays are
//! not modeled.

use chrono::{Datelike, NaiveDate, Weekday};
use shared::error::{AppError, AppResult};

pub fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Working days in the inclusive range `[start, end]`
///
/// Rejects `end < start` and ranges without a single working day.
pub fn working_days(start: NaiveDate, end: NaiveDate) -> AppResult<Vec<NaiveDate>> {
    if end < start {
        return Err(AppError::validation("end date must not be before start date"));
    }
    let days: Vec<NaiveDate> = start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| is_working_day(*day))
        .collect();
    if days.is_empty() {
        return Err(AppError::validation("date range contains no working days"));
    }
    Ok(days)
}

/// Count of [`working_days`]
pub fn working_days_between(start: NaiveDate, end: NaiveDate) -> AppResult<i32> {
    working_days(start, end).map(|days| days.len() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_weekend_is_skipped() {
        // Fri 2026-02-20 .. Tue 2026-02-24
        let days = working_days(d(2026, 2, 20), d(2026, 2, 24)).unwrap();
        assert_eq!(days, vec![d(2026, 2, 20), d(2026, 2, 23), d(2026, 2, 24)]);
        assert_eq!(working_days_between(d(2026, 2, 20), d(2026, 2, 24)).unwrap(), 3);
    }

    #[test]
    fn test_single_day() {
        assert_eq!(working_days_between(d(2026, 2, 23), d(2026, 2, 23)).unwrap(), 1);
    }

    #[test]
    fn test_weekend_only_range_rejected() {
        let err = working_days(d(2026, 2, 21), d(2026, 2, 22)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_reversed_range_rejected() {
        let err = working_days(d(2026, 2, 24), d(2026, 2, 20)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
