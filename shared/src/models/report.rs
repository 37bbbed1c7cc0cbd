//! Report Model
//!
//! Row and filter types for the five tabular reports.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::leave::LeaveStatus;
use super::pagination::PageRequest;
use super::payroll::PayrollStatus;

/// Maximum rows in any CSV export
pub const EXPORT_ROW_LIMIT: u64 = 50_000;

// ==================== Employees ====================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeReportFilter {
    pub department_id: Option<i64>,
    pub employment_status: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct EmployeeReportRow {
    pub employee_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub department_name: Option<String>,
    pub position: String,
    pub employment_status: String,
    pub date_of_hire: NaiveDate,
    /// `None` when redacted for the caller's role
    pub base_salary: Option<Decimal>,
}

// ==================== Leave ====================

/// Leave report filter (dates required, ISO)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaveReportFilter {
    pub date_from: String,
    pub date_to: String,
    pub status: Option<LeaveStatus>,
    pub employee_id: Option<i64>,
    pub leave_type_id: Option<i64>,
}

/// Leave filter with parsed dates
#[derive(Debug, Clone)]
pub struct LeaveReportRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub status: Option<LeaveStatus>,
    pub employee_id: Option<i64>,
    pub leave_type_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LeaveReportRow {
    pub request_id: i64,
    pub employee_id: i64,
    pub employee_name: String,
    pub leave_type_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub working_days: i32,
    pub status: LeaveStatus,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
}

// ==================== Attendance summary ====================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceReportFilter {
    pub date_from: String,
    pub date_to: String,
    pub department_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct AttendanceReportRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub department_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AttendanceSummaryRow {
    pub employee_id: i64,
    pub employee_name: String,
    pub department_name: Option<String>,
    pub present_count: i64,
    pub late_count: i64,
    pub field_count: i64,
    pub absent_count: i64,
    pub leave_count: i64,
    /// `max(0, total_days - marked rows)`; filled after the query
    #[cfg_attr(feature = "db", sqlx(default))]
    pub unmarked_count: i64,
}

impl AttendanceSummaryRow {
    pub fn marked(&self) -> i64 {
        self.present_count + self.late_count + self.field_count + self.absent_count + self.leave_count
    }
}

// ==================== Payroll batches ====================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayrollReportFilter {
    /// YYYY-MM, inclusive
    pub month_from: Option<String>,
    pub month_to: Option<String>,
    pub status: Option<PayrollStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PayrollBatchReportRow {
    pub batch_id: i64,
    pub month: String,
    pub status: PayrollStatus,
    pub entry_count: i64,
    pub total_gross: Decimal,
    pub total_net: Decimal,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub locked_at: Option<DateTime<Utc>>,
}

// ==================== Audit log ====================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditReportFilter {
    pub date_from: String,
    pub date_to: String,
    pub action_prefix: Option<String>,
    pub actor_user_id: Option<i64>,
    pub entity_type: Option<String>,
}

/// Report list request: filter plus page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportRequest<F> {
    pub filter: F,
    #[serde(default)]
    pub page: PageRequest,
}
