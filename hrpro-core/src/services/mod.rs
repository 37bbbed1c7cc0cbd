//! Business services
//!
//! Each service owns a handle on the shared store, checks roles, validates
//! input, writes through the repository traits and emits audit events.
//!
//! | Service | Area |
//! |---------|------|
//! | [`AttendanceService`] | daily marks, overrides, lunch, post-to-leave |
//! | [`LeaveService`] | types, locked dates, entitlements, requests |
//! | [`PayrollService`] | batches, entries, CSV export |
//! | [`EmployeeService`] | employees and contract files |
//! | [`DepartmentService`] | departments |
//! | [`UserService`] | login accounts |
//! | [`SettingsService`] | company settings and logo |
//! | [`DashboardService`] | role-scoped rollup |
//! | [`ReportService`] | tabular reports and exports |
//! | [`AuditLogService`] | audit trail listing |

pub mod attendance;
pub mod audit_log;
pub mod dashboard;
pub mod departments;
pub mod employees;
pub mod leave;
pub mod payroll;
pub mod reports;
pub mod settings;
pub mod users;

pub use attendance::{AttendanceService, LeaveIntegration};
pub use audit_log::AuditLogService;
pub use dashboard::DashboardService;
pub use departments::DepartmentService;
pub use employees::EmployeeService;
pub use leave::LeaveService;
pub use payroll::PayrollService;
pub use reports::ReportService;
pub use settings::SettingsService;
pub use users::UserService;

/// Role sets for the gates; admin-class roles pass every gate implicitly
pub mod roles {
    use shared::models::Role;

    /// May write attendance, lunch visitors and post absences to leave
    pub const MARKABLE: &[Role] = &[Role::HrOfficer];
    /// May overwrite a locked attendance record
    pub const ATTENDANCE_OVERRIDE: &[Role] = &[Role::HrOfficer];
    /// See every employee on the daily sheet
    pub const ATTENDANCE_READERS: &[Role] = &[Role::HrOfficer, Role::FinanceOfficer, Role::Viewer];
    pub const LEAVE_MANAGERS: &[Role] = &[Role::HrOfficer];
    pub const PAYROLL: &[Role] = &[Role::FinanceOfficer];
    pub const EMPLOYEE_WRITERS: &[Role] = &[Role::HrOfficer];
    pub const EMPLOYEE_READERS: &[Role] = &[Role::HrOfficer, Role::FinanceOfficer, Role::Viewer];
    pub const DEPARTMENT_WRITERS: &[Role] = &[Role::HrOfficer];
    /// User administration, settings writes, audit listing
    pub const ADMIN_ONLY: &[Role] = &[];
    /// Payroll snapshot on the dashboard
    pub const PAYROLL_VIEWERS: &[Role] = &[Role::HrOfficer, Role::FinanceOfficer];
    /// Unredacted salaries in the employee report
    pub const SALARY_VIEWERS: &[Role] = &[Role::FinanceOfficer];
    /// Leave and attendance-summary reports
    pub const REPORT_READERS: &[Role] = &[Role::HrOfficer, Role::Viewer];
}
