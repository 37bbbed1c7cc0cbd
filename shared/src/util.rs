use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;

use crate::error::{AppError, AppResult};

/// Today's calendar date in UTC
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse a required ISO date (`YYYY-MM-DD`)
pub fn parse_iso_date(field: &str, raw: &str) -> AppResult<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::validation(format!("{field} is required")).with_detail("field", field));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        AppError::validation(format!("{field} must be an ISO date (YYYY-MM-DD)"))
            .with_detail("field", field)
    })
}

/// Parse an optional ISO date; blank counts as absent
pub fn parse_optional_iso_date(field: &str, raw: Option<&str>) -> AppResult<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_iso_date(field, value).map(Some),
    }
}

/// Parse an inclusive `[from, to]` range, both required, `from <= to`
pub fn parse_date_range(from: &str, to: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let from = parse_iso_date("date_from", from)?;
    let to = parse_iso_date("date_to", to)?;
    if from > to {
        return Err(AppError::validation("date_from must not be after date_to"));
    }
    Ok((from, to))
}

static MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})$").unwrap_or_else(|e| panic!("month pattern: {e}"))
});

/// Validate a payroll month (`YYYY-MM`, month 01..=12)
pub fn parse_month(raw: &str) -> AppResult<(i32, u32)> {
    let shape = || AppError::validation("month must be in YYYY-MM format");
    let caps = MONTH_RE.captures(raw.trim()).ok_or_else(shape)?;
    let year: i32 = caps[1].parse().map_err(|_| shape())?;
    let month: u32 = caps[2].parse().map_err(|_| shape())?;
    if !(1..=12).contains(&month) {
        return Err(AppError::validation("month must be between 01 and 12"));
    }
    Ok((year, month))
}

/// First day of the month containing `date`, and of the following month
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = date.with_day(1).unwrap_or(date);
    let next = if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
    };
    (start, next.unwrap_or(start))
}

/// Trim and drop empty strings
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
