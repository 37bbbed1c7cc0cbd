//! Leave Model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Leave type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LeaveType {
    pub id: i64,
    pub name: String,
    pub paid: bool,
    pub counts_toward_entitlement: bool,
    pub requires_attachment: bool,
    pub requires_approval: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update leave type payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveTypeInput {
    pub name: String,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub counts_toward_entitlement: bool,
    #[serde(default)]
    pub requires_attachment: bool,
    #[serde(default)]
    pub requires_approval: bool,
    pub active: Option<bool>,
}

/// Yearly entitlement, unique per (employee_id, year)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LeaveEntitlement {
    pub id: i64,
    pub employee_id: i64,
    pub year: i32,
    pub total_days: i32,
    pub reserved_days: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Entitlement upsert payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementInput {
    pub employee_id: i64,
    pub year: i32,
    pub total_days: i32,
    pub reserved_days: i32,
}

/// A date on which approved leave must not fall
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LeaveLockedDate {
    pub id: i64,
    pub locked_date: NaiveDate,
    pub reason: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Locked date upsert payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockedDateInput {
    pub date: String,
    pub reason: Option<String>,
}

/// Leave request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaveStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(AppError::validation(format!("unknown leave status '{other}'"))),
        }
    }
}

impl_text_column!(LeaveStatus);

/// Leave request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LeaveRequest {
    pub id: i64,
    pub employee_id: i64,
    pub leave_type_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Mon-Fri days in [start_date, end_date]
    pub working_days: i32,
    pub status: LeaveStatus,
    pub reason: Option<String>,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[cfg_attr(feature = "db", sqlx(default))]
    pub employee_name: Option<String>,
    #[cfg_attr(feature = "db", sqlx(default))]
    pub leave_type_name: Option<String>,
}

impl LeaveRequest {
    /// Inclusive range intersection
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}

/// Apply payload (employee is the caller)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyLeaveInput {
    pub leave_type_id: i64,
    pub start_date: String,
    pub end_date: String,
    pub reason: Option<String>,
}

/// Validated request row for inserts
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: i64,
    pub leave_type_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub working_days: i32,
    pub reason: Option<String>,
}

/// Status change written by approve/reject/cancel
#[derive(Debug, Clone)]
pub struct LeaveStatusChange {
    pub status: LeaveStatus,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    /// `None` keeps the stored reason
    pub reason: Option<String>,
}

/// Request list filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaveRequestFilter {
    pub status: Option<LeaveStatus>,
    /// Matches the start date's year
    pub year: Option<i32>,
    /// Ignored by list-my
    pub employee_id: Option<i64>,
}

/// Leave balance for one employee and year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalance {
    pub employee_id: i64,
    pub year: i32,
    pub total_days: i32,
    pub reserved_days: i32,
    pub approved_days: i32,
    pub pending_days: i32,
    pub available_days: i32,
}

impl LeaveBalance {
    /// `available = max(0, total - reserved - approved - pending)`
    pub fn compute(
        employee_id: i64,
        year: i32,
        total_days: i32,
        reserved_days: i32,
        approved_days: i32,
        pending_days: i32,
    ) -> Self {
        let available = total_days - reserved_days - approved_days - pending_days;
        Self {
            employee_id,
            year,
            total_days,
            reserved_days,
            approved_days,
            pending_days,
            available_days: available.max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_arithmetic() {
        let balance = LeaveBalance::compute(9, 2026, 25, 3, 5, 4);
        assert_eq!(balance.available_days, 13);
    }

    #[test]
    fn test_balance_never_negative() {
        let balance = LeaveBalance::compute(9, 2026, 5, 3, 5, 4);
        assert_eq!(balance.available_days, 0);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("approved".parse::<LeaveStatus>().unwrap(), LeaveStatus::Approved);
        assert_eq!("Canceled".parse::<LeaveStatus>().unwrap(), LeaveStatus::Cancelled);
        assert!("done".parse::<LeaveStatus>().is_err());
    }
}
