//! Dashboard Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::audit::AuditLog;
use super::payroll::PayrollStatus;

/// Role-scoped rollup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_employees: i64,
    pub active_employees: i64,
    pub inactive_employees: i64,
    pub pending_leave_requests: i64,
    /// By `approved_at` within the current UTC month
    pub approved_leave_this_month: i64,
    pub employees_on_leave_today: i64,
    pub department_headcounts: Vec<DepartmentHeadcount>,
    /// admin, hr_officer, finance_officer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payroll: Option<PayrollSnapshot>,
    /// admin only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_users: Option<i64>,
    /// admin only, 10 most recent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_audit: Option<Vec<AuditLog>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DepartmentHeadcount {
    pub department_id: Option<i64>,
    pub department_name: String,
    pub employee_count: i64,
}

/// Most recent batch by month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PayrollSnapshot {
    pub batch_id: i64,
    pub month: String,
    pub status: PayrollStatus,
    pub total_net: Decimal,
}

/// Employee counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct EmployeeCounts {
    pub total: i64,
    pub active: i64,
}
