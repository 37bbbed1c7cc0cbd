use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::audit::{AuditRecorder, StoreAuditRecorder};
use crate::auth::{AuthService, JwtService};
use crate::core::Config;
use crate::db::Store;
use crate::services::{
    AttendanceService, AuditLogService, DashboardService, DepartmentService, EmployeeService,
    LeaveService, PayrollService, ReportService, SettingsService, UserService,
};
use crate::storage::FileStore;

/// Knobs needed to build the services
#[derive(Debug, Clone)]
pub struct StateOptions {
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    /// File-store root for contracts and branding
    pub data_dir: PathBuf,
    pub operation_timeout: Duration,
}

impl StateOptions {
    /// `jwt_secret` is the resolved secret, not the optional env value
    pub fn from_config(config: &Config, jwt_secret: String) -> Self {
        Self {
            jwt_secret,
            access_token_ttl_minutes: config.access_token_ttl_minutes,
            refresh_token_ttl_hours: config.refresh_token_ttl_hours,
            bcrypt_cost: config.bcrypt_cost,
            data_dir: config.data_dir.clone(),
            operation_timeout: config.operation_timeout,
        }
    }
}

/// Application state - one instance of every service over a shared store
///
/// | Field | Service |
/// |-------|---------|
/// | auth | login, refresh, logout, me |
/// | attendance | daily sheet, overrides, lunch, post-to-leave |
/// | leave | types, locked dates, entitlements, requests |
/// | payroll | batches, entries, export |
/// | employees / departments / users / settings | administration |
/// | dashboard / reports / audit_log | read models |
///
/// Cloning is cheap; every service sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: Arc<AuthService>,
    pub attendance: Arc<AttendanceService>,
    pub leave: Arc<LeaveService>,
    pub payroll: Arc<PayrollService>,
    pub employees: Arc<EmployeeService>,
    pub departments: Arc<DepartmentService>,
    pub users: Arc<UserService>,
    pub settings: Arc<SettingsService>,
    pub dashboard: Arc<DashboardService>,
    pub reports: Arc<ReportService>,
    pub audit_log: Arc<AuditLogService>,
    pub operation_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, options: StateOptions) -> Self {
        let recorder: Arc<dyn AuditRecorder> = Arc::new(StoreAuditRecorder::new(store.clone()));
        let files = FileStore::new(options.data_dir.clone());

        let jwt = JwtService::new(&options.jwt_secret, options.access_token_ttl_minutes);
        let mut auth = AuthService::new(
            store.clone(),
            jwt,
            options.refresh_token_ttl_hours,
            options.bcrypt_cost,
        );
        auth.set_audit_recorder(recorder.clone());

        let mut leave = LeaveService::new(store.clone());
        leave.set_audit_recorder(recorder.clone());
        let leave = Arc::new(leave);

        // attendance posts absences through the leave engine
        let mut attendance = AttendanceService::new(store.clone());
        attendance.set_audit_recorder(recorder.clone());
        attendance.set_leave_integration(leave.clone());

        let mut payroll = PayrollService::new(store.clone());
        payroll.set_audit_recorder(recorder.clone());

        let mut employees = EmployeeService::new(store.clone(), files.clone());
        employees.set_audit_recorder(recorder.clone());

        let mut departments = DepartmentService::new(store.clone());
        departments.set_audit_recorder(recorder.clone());

        let mut users = UserService::new(store.clone(), options.bcrypt_cost);
        users.set_audit_recorder(recorder.clone());

        let mut settings = SettingsService::new(store.clone(), files);
        settings.set_audit_recorder(recorder.clone());

        let mut reports = ReportService::new(store.clone());
        reports.set_audit_recorder(recorder);

        tracing::debug!(data_dir = %options.data_dir.display(), "Services initialized");

        Self {
            auth: Arc::new(auth),
            attendance: Arc::new(attendance),
            leave,
            payroll: Arc::new(payroll),
            employees: Arc::new(employees),
            departments: Arc::new(departments),
            users: Arc::new(users),
            settings: Arc::new(settings),
            dashboard: Arc::new(DashboardService::new(store.clone())),
            reports: Arc::new(reports),
            audit_log: Arc::new(AuditLogService::new(store.clone())),
            store,
            operation_timeout: options.operation_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AuditStore, MemoryStore};
    use crate::services::test_support::claims;
    use shared::models::{AuditLogFilter, DepartmentInput};

    #[tokio::test]
    async fn test_services_share_store_and_recorder() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let state = AppState::new(
            store.clone(),
            StateOptions {
                jwt_secret: "state-test-secret-0123456789abcdef".into(),
                access_token_ttl_minutes: 15,
                refresh_token_ttl_hours: 24,
                bcrypt_cost: 4,
                data_dir: dir.path().to_path_buf(),
                operation_timeout: Duration::from_secs(5),
            },
        );

        state
            .departments
            .create(
                &claims(1, "admin"),
                DepartmentInput {
                    name: "ICT".into(),
                    description: None,
                },
            )
            .await
            .unwrap();
        let logs = store
            .list_audit_logs(&AuditLogFilter::default(), 10, 0)
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "department.create");
    }
}
