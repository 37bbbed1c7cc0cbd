//! Attendance Model (daily marks and lunch)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Status shown for employees without a record on the day
pub const UNMARKED_STATUS: &str = "unmarked";

/// Upper bound for plate cost and staff contribution, in minor units
pub const MAX_LUNCH_AMOUNT: i64 = 1_000_000_000_000;

/// Plate cost in `1..=MAX_LUNCH_AMOUNT`, contribution in `0..=MAX_LUNCH_AMOUNT`
pub fn validate_lunch_amounts(plate_cost_amount: i64, staff_contribution_amount: i64) -> Result<(), AppError> {
    if !(1..=MAX_LUNCH_AMOUNT).contains(&plate_cost_amount) {
        return Err(AppError::validation(format!(
            "plate_cost_amount must be between 1 and {MAX_LUNCH_AMOUNT}"
        ))
        .with_detail("field", "plate_cost_amount"));
    }
    if !(0..=MAX_LUNCH_AMOUNT).contains(&staff_contribution_amount) {
        return Err(AppError::validation(format!(
            "staff_contribution_amount must be between 0 and {MAX_LUNCH_AMOUNT}"
        ))
        .with_detail("field", "staff_contribution_amount"));
    }
    Ok(())
}

/// Attendance status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Field,
    Absent,
    Leave,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 5] = [
        Self::Present,
        Self::Late,
        Self::Field,
        Self::Absent,
        Self::Leave,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Late => "late",
            Self::Field => "field",
            Self::Absent => "absent",
            Self::Leave => "leave",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = AppError;

    /// Trimmed, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                AppError::validation(format!(
                    "status must be one of present, late, field, absent, leave; got '{}'",
                    s.trim()
                ))
            })
    }
}

impl_text_column!(AttendanceStatus);

/// Attendance record, unique per (attendance_date, employee_id)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AttendanceRecord {
    pub id: i64,
    pub attendance_date: NaiveDate,
    pub employee_id: i64,
    pub status: AttendanceStatus,
    pub marked_by: Option<i64>,
    pub marked_at: DateTime<Utc>,
    /// Always true once written
    pub is_locked: bool,
    pub lock_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One employee's line on the daily sheet (left join on the day's record)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AttendanceDayRow {
    pub employee_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub department_name: Option<String>,
    pub attendance_id: Option<i64>,
    /// Record status or `"unmarked"`
    pub status: String,
    pub is_locked: bool,
    pub lock_reason: Option<String>,
    pub marked_by: Option<i64>,
    pub marked_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "db", sqlx(default))]
    pub can_edit: bool,
    #[cfg_attr(feature = "db", sqlx(default))]
    pub can_post_to_leave: bool,
}

/// Mark/override payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertAttendanceInput {
    /// ISO date (YYYY-MM-DD)
    pub date: String,
    pub employee_id: i64,
    pub status: String,
    pub reason: Option<String>,
}

/// Values written by an attendance upsert
#[derive(Debug, Clone)]
pub struct AttendanceWrite {
    pub attendance_date: NaiveDate,
    pub employee_id: i64,
    pub status: AttendanceStatus,
    pub marked_by: Option<i64>,
    pub lock_reason: Option<String>,
}

/// Date range query for the caller's own records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRangeQuery {
    pub start_date: String,
    pub end_date: String,
}

/// Result of posting an absence to leave
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostAbsentToLeaveResult {
    pub attendance: AttendanceRecord,
    pub leave_request_id: i64,
}

// ==================== Lunch ====================

/// Default plate cost (minor units) baked in on insert
pub const DEFAULT_PLATE_COST_AMOUNT: i64 = 12_000;
/// Default staff contribution (minor units) baked in on insert
pub const DEFAULT_STAFF_CONTRIBUTION_AMOUNT: i64 = 4_000;

/// Daily lunch row (visitors and pricing)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LunchDaily {
    pub attendance_date: NaiveDate,
    pub visitors_count: i32,
    pub plate_cost_amount: i64,
    pub staff_contribution_amount: i64,
    pub updated_by: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

/// Upsert visitors payload; amounts default from settings when absent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LunchVisitorsInput {
    pub date: String,
    pub visitors_count: i32,
    pub plate_cost_amount: Option<i64>,
    pub staff_contribution_amount: Option<i64>,
}

/// Lunch totals for one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LunchSummary {
    pub date: NaiveDate,
    /// present + late
    pub staff_present: i64,
    pub staff_field: i64,
    pub visitors: i64,
    pub plate_cost_amount: i64,
    pub staff_contribution_amount: i64,
    pub total_plates: i64,
    pub total_cost: i64,
    pub staff_contribution_total: i64,
    pub organization_balance: i64,
    pub can_edit_visitors: bool,
}

/// Lunch arithmetic inputs
#[derive(Debug, Clone, Copy)]
pub struct LunchCounts {
    pub staff_present: i64,
    pub staff_field: i64,
    pub visitors: i64,
    pub plate_cost_amount: i64,
    pub staff_contribution_amount: i64,
}

impl LunchSummary {
    /// Fails with a validation error when a total does not fit in `i64`
    pub fn compute(date: NaiveDate, counts: LunchCounts, can_edit_visitors: bool) -> Result<Self, AppError> {
        let overflow = || AppError::validation("lunch totals are out of range").with_detail("date", date.to_string());
        let total_plates = counts
            .staff_present
            .checked_add(counts.visitors)
            .ok_or_else(overflow)?;
        let total_cost = total_plates
            .checked_mul(counts.plate_cost_amount)
            .ok_or_else(overflow)?;
        let staff_contribution_total = counts
            .staff_present
            .checked_mul(counts.staff_contribution_amount)
            .ok_or_else(overflow)?;
        let organization_balance = total_cost
            .checked_sub(staff_contribution_total)
            .ok_or_else(overflow)?;
        Ok(Self {
            date,
            staff_present: counts.staff_present,
            staff_field: counts.staff_field,
            visitors: counts.visitors,
            plate_cost_amount: counts.plate_cost_amount,
            staff_contribution_amount: counts.staff_contribution_amount,
            total_plates,
            total_cost,
            staff_contribution_total,
            organization_balance,
            can_edit_visitors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_normalizes() {
        assert_eq!(
            " Present ".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::Present
        );
        assert_eq!("LEAVE".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Leave);
        assert!("unmarked".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn test_lunch_totals() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let summary = LunchSummary::compute(
            date,
            LunchCounts {
                staff_present: 8,
                staff_field: 3,
                visitors: 2,
                plate_cost_amount: 12_000,
                staff_contribution_amount: 4_000,
            },
            true,
        )
        .unwrap();
        assert_eq!(summary.total_plates, 10);
        assert_eq!(summary.total_cost, 120_000);
        assert_eq!(summary.staff_contribution_total, 32_000);
        assert_eq!(summary.organization_balance, 88_000);
    }

    #[test]
    fn test_lunch_totals_overflow_is_a_validation_error() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let err = LunchSummary::compute(
            date,
            LunchCounts {
                staff_present: 4,
                staff_field: 0,
                visitors: 3,
                plate_cost_amount: i64::MAX / 2,
                staff_contribution_amount: 0,
            },
            true,
        )
        .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_lunch_amount_bounds() {
        assert!(validate_lunch_amounts(12_000, 0).is_ok());
        assert!(validate_lunch_amounts(MAX_LUNCH_AMOUNT, MAX_LUNCH_AMOUNT).is_ok());
        assert!(validate_lunch_amounts(0, 0).is_err());
        assert!(validate_lunch_amounts(MAX_LUNCH_AMOUNT + 1, 0).is_err());
        assert!(validate_lunch_amounts(12_000, -1).is_err());
        assert!(validate_lunch_amounts(12_000, MAX_LUNCH_AMOUNT + 1).is_err());
    }
}
