//! Repository traits
//!
//! One trait per aggregate. Method names are unique across traits so every
//! call resolves unambiguously on `dyn Store`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::BoxFuture;
use serde_json::Value;
use shared::error::AppResult;
use shared::models::*;

use super::RepoResult;

// ── Users & tokens ──────────────────────────────────────────────────

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: i64) -> RepoResult<Option<User>>;
    /// Case-insensitive lookup
    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// `Duplicate` when the username is taken (case-insensitive)
    async fn create_user(&self, user: &NewUser) -> RepoResult<User>;
    async fn update_user(&self, id: i64, changes: &UserUpdate) -> RepoResult<User>;
    async fn set_user_password(&self, id: i64, password_hash: &str) -> RepoResult<()>;
    async fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> RepoResult<()>;
    async fn list_users(&self, q: Option<&str>, page: &PageRequest) -> RepoResult<(Vec<User>, u64)>;
    async fn count_active_users(&self) -> RepoResult<i64>;
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn create_refresh_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<RefreshToken>;
    /// Most recent row with this hash
    async fn find_refresh_token(&self, token_hash: &str) -> RepoResult<Option<RefreshToken>>;
    /// Revoke every unrevoked row with this hash; returns rows touched
    async fn revoke_refresh_tokens(&self, token_hash: &str, at: DateTime<Utc>) -> RepoResult<u64>;
}

// ── Organization ────────────────────────────────────────────────────

#[async_trait]
pub trait DepartmentStore: Send + Sync {
    async fn list_departments(
        &self,
        q: Option<&str>,
        page: &PageRequest,
    ) -> RepoResult<(Vec<Department>, u64)>;
    async fn find_department(&self, id: i64) -> RepoResult<Option<Department>>;
    async fn department_name_exists(&self, name: &str, exclude_id: Option<i64>) -> RepoResult<bool>;
    async fn create_department(&self, input: &DepartmentInput) -> RepoResult<Department>;
    async fn update_department(&self, id: i64, input: &DepartmentInput) -> RepoResult<Department>;
    async fn delete_department(&self, id: i64) -> RepoResult<bool>;
    async fn count_department_employees(&self, id: i64) -> RepoResult<i64>;
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn list_employees(&self, query: &EmployeeQuery) -> RepoResult<(Vec<Employee>, u64)>;
    async fn find_employee(&self, id: i64) -> RepoResult<Option<Employee>>;
    async fn create_employee(&self, data: &EmployeeData) -> RepoResult<Employee>;
    async fn update_employee(&self, id: i64, data: &EmployeeData) -> RepoResult<Employee>;
    async fn delete_employee(&self, id: i64) -> RepoResult<bool>;
    async fn set_contract_path(&self, id: i64, path: Option<&str>) -> RepoResult<Employee>;
}

// ── Attendance ──────────────────────────────────────────────────────

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// All employees (or one) left-joined on the day's records, by first/last name
    async fn list_attendance_for_day(
        &self,
        date: NaiveDate,
        employee_id: Option<i64>,
    ) -> RepoResult<Vec<AttendanceDayRow>>;
    async fn find_attendance(
        &self,
        date: NaiveDate,
        employee_id: i64,
    ) -> RepoResult<Option<AttendanceRecord>>;
    /// Insert a locked record; `Duplicate` if (date, employee) exists
    async fn insert_attendance(
        &self,
        write: &AttendanceWrite,
        at: DateTime<Utc>,
    ) -> RepoResult<AttendanceRecord>;
    /// Overwrite status/marker, keep locked, `lock_reason = COALESCE(new, old)`
    async fn update_attendance(
        &self,
        write: &AttendanceWrite,
        at: DateTime<Utc>,
    ) -> RepoResult<AttendanceRecord>;
    async fn list_attendance_range(
        &self,
        employee_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<AttendanceRecord>>;
    async fn count_attendance_with_status(
        &self,
        date: NaiveDate,
        statuses: &[AttendanceStatus],
    ) -> RepoResult<i64>;
    async fn find_lunch(&self, date: NaiveDate) -> RepoResult<Option<LunchDaily>>;
    async fn upsert_lunch(&self, lunch: &LunchDaily) -> RepoResult<LunchDaily>;
}

// ── Leave ───────────────────────────────────────────────────────────

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn list_leave_types(&self, include_inactive: bool) -> RepoResult<Vec<LeaveType>>;
    async fn find_leave_type(&self, id: i64) -> RepoResult<Option<LeaveType>>;
    /// Lowest-id active type
    async fn default_leave_type(&self) -> RepoResult<Option<LeaveType>>;
    async fn create_leave_type(&self, input: &LeaveTypeInput) -> RepoResult<LeaveType>;
    async fn update_leave_type(&self, id: i64, input: &LeaveTypeInput) -> RepoResult<LeaveType>;
    async fn set_leave_type_active(&self, id: i64, active: bool) -> RepoResult<LeaveType>;

    async fn list_locked_dates(&self, year: i32) -> RepoResult<Vec<LeaveLockedDate>>;
    async fn upsert_locked_date(
        &self,
        date: NaiveDate,
        reason: Option<&str>,
        created_by: Option<i64>,
    ) -> RepoResult<LeaveLockedDate>;
    async fn delete_locked_date(&self, date: NaiveDate) -> RepoResult<bool>;
    async fn locked_dates_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<NaiveDate>>;

    async fn find_entitlement(
        &self,
        employee_id: i64,
        year: i32,
    ) -> RepoResult<Option<LeaveEntitlement>>;
    async fn upsert_entitlement(&self, input: &EntitlementInput) -> RepoResult<LeaveEntitlement>;
    /// Sum of working days for entitlement-counting types, by start-date year
    async fn sum_leave_days(
        &self,
        employee_id: i64,
        year: i32,
        status: LeaveStatus,
    ) -> RepoResult<i32>;

    async fn find_overlapping_approved(
        &self,
        employee_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<i64>,
    ) -> RepoResult<Vec<LeaveRequest>>;
    async fn create_leave_request(&self, request: &NewLeaveRequest) -> RepoResult<LeaveRequest>;
    async fn find_leave_request(&self, id: i64) -> RepoResult<Option<LeaveRequest>>;
    async fn update_leave_status(
        &self,
        id: i64,
        change: &LeaveStatusChange,
    ) -> RepoResult<LeaveRequest>;
    async fn list_leave_requests(&self, filter: &LeaveRequestFilter)
    -> RepoResult<Vec<LeaveRequest>>;
}

// ── Payroll ─────────────────────────────────────────────────────────

/// Transaction-scoped payroll operations
#[async_trait]
pub trait PayrollTx: Send {
    async fn delete_entries_by_batch(&mut self, batch_id: i64) -> RepoResult<u64>;
    /// Employees whose normalized employment_status is `active`
    async fn list_active_employee_salaries(&mut self) -> RepoResult<Vec<ActiveEmployeeSalary>>;
    async fn create_entry(
        &mut self,
        batch_id: i64,
        employee_id: i64,
        amounts: &PayAmounts,
    ) -> RepoResult<PayrollEntry>;
    async fn commit(self: Box<Self>) -> RepoResult<()>;
    async fn rollback(self: Box<Self>) -> RepoResult<()>;
}

#[async_trait]
pub trait PayrollStore: Send + Sync {
    /// Newest month first
    async fn list_payroll_batches(&self) -> RepoResult<Vec<PayrollBatch>>;
    /// `Duplicate` when the month exists
    async fn create_payroll_batch(
        &self,
        month: &str,
        created_by: Option<i64>,
    ) -> RepoResult<PayrollBatch>;
    async fn find_payroll_batch(&self, id: i64) -> RepoResult<Option<PayrollBatch>>;
    async fn list_payroll_entries(&self, batch_id: i64) -> RepoResult<Vec<PayrollEntry>>;
    async fn find_payroll_entry(&self, id: i64) -> RepoResult<Option<PayrollEntry>>;
    async fn update_payroll_entry_amounts(
        &self,
        id: i64,
        amounts: &PayAmounts,
    ) -> RepoResult<PayrollEntry>;
    async fn set_payroll_batch_approved(
        &self,
        id: i64,
        approved_by: Option<i64>,
        at: DateTime<Utc>,
    ) -> RepoResult<PayrollBatch>;
    async fn set_payroll_batch_locked(&self, id: i64, at: DateTime<Utc>)
    -> RepoResult<PayrollBatch>;
    async fn begin_payroll_tx(&self) -> RepoResult<Box<dyn PayrollTx>>;
}

/// Run `f` in a payroll transaction: commit on `Ok`, roll back on `Err`.
pub async fn with_payroll_tx<S, T, F>(store: &S, f: F) -> AppResult<T>
where
    S: PayrollStore + ?Sized,
    T: Send,
    F: for<'a> FnOnce(&'a mut dyn PayrollTx) -> BoxFuture<'a, AppResult<T>> + Send,
{
    let mut tx = store.begin_payroll_tx().await?;
    match f(tx.as_mut()).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "Payroll transaction rollback failed");
            }
            Err(err)
        }
    }
}

// ── Audit & settings ────────────────────────────────────────────────

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert_audit_log(&self, log: &NewAuditLog) -> RepoResult<()>;
    /// Newest first
    async fn list_audit_logs(
        &self,
        filter: &AuditLogFilter,
        limit: u64,
        offset: u64,
    ) -> RepoResult<Vec<AuditLog>>;
    async fn count_audit_logs(&self, filter: &AuditLogFilter) -> RepoResult<u64>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn list_settings(&self) -> RepoResult<Vec<AppSetting>>;
    async fn upsert_setting(
        &self,
        key: SettingKey,
        value: &Value,
        updated_by: Option<i64>,
    ) -> RepoResult<()>;
}

// ── Read models ─────────────────────────────────────────────────────

#[async_trait]
pub trait DashboardStore: Send + Sync {
    async fn employee_counts(&self) -> RepoResult<EmployeeCounts>;
    async fn count_leave_requests_with_status(&self, status: LeaveStatus) -> RepoResult<i64>;
    /// Approved requests whose `approved_at` is in `[from, to)`
    async fn count_approved_leave_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepoResult<i64>;
    /// Distinct employees with an approved request covering `day`
    async fn count_employees_on_leave(&self, day: NaiveDate) -> RepoResult<i64>;
    /// Ordered by count desc, then name
    async fn department_headcounts(&self) -> RepoResult<Vec<DepartmentHeadcount>>;
    async fn latest_payroll_snapshot(&self) -> RepoResult<Option<PayrollSnapshot>>;
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn count_employee_report(&self, filter: &EmployeeReportFilter) -> RepoResult<u64>;
    async fn employee_report(
        &self,
        filter: &EmployeeReportFilter,
        limit: u64,
        offset: u64,
    ) -> RepoResult<Vec<EmployeeReportRow>>;

    async fn count_leave_report(&self, filter: &LeaveReportRange) -> RepoResult<u64>;
    async fn leave_report(
        &self,
        filter: &LeaveReportRange,
        limit: u64,
        offset: u64,
    ) -> RepoResult<Vec<LeaveReportRow>>;

    async fn count_attendance_summary(&self, filter: &AttendanceReportRange) -> RepoResult<u64>;
    /// Per-employee status counts in range; `unmarked_count` left at 0
    async fn attendance_summary(
        &self,
        filter: &AttendanceReportRange,
        limit: u64,
        offset: u64,
    ) -> RepoResult<Vec<AttendanceSummaryRow>>;

    async fn count_payroll_report(&self, filter: &PayrollReportFilter) -> RepoResult<u64>;
    async fn payroll_report(
        &self,
        filter: &PayrollReportFilter,
        limit: u64,
        offset: u64,
    ) -> RepoResult<Vec<PayrollBatchReportRow>>;
}

/// Every repository, as held by the services
pub trait Store:
    UserStore
    + RefreshTokenStore
    + DepartmentStore
    + EmployeeStore
    + AttendanceStore
    + LeaveStore
    + PayrollStore
    + AuditStore
    + SettingsStore
    + DashboardStore
    + ReportStore
{
}

impl<T> Store for T where
    T: UserStore
        + RefreshTokenStore
        + DepartmentStore
        + EmployeeStore
        + AttendanceStore
        + LeaveStore
        + PayrollStore
        + AuditStore
        + SettingsStore
        + DashboardStore
        + ReportStore
{
}
