use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use shared::error::AppResult;
use shared::models::{AuditLogFilter, DashboardSummary, LeaveStatus, Role};
use shared::util::{month_bounds, today_utc};

use super::roles;
use crate::auth::Claims;
use crate::db::{AuditStore, DashboardStore, Store, UserStore};

/// Audit entries shown to admins
pub const RECENT_AUDIT_LIMIT: u64 = 10;

pub struct DashboardService {
    store: Arc<dyn Store>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Common counters for every role, payroll snapshot for payroll
    /// viewers, user and audit rollups for admins
    pub async fn summary(&self, claims: &Claims) -> AppResult<DashboardSummary> {
        self.summary_on(claims, today_utc()).await
    }

    pub(crate) async fn summary_on(&self, claims: &Claims, today: NaiveDate) -> AppResult<DashboardSummary> {
        let counts = self.store.employee_counts().await?;
        let pending = self.store.count_leave_requests_with_status(LeaveStatus::Pending).await?;

        let (month_start, next_month) = month_bounds(today);
        let approved_this_month = self
            .store
            .count_approved_leave_between(
                month_start.and_time(NaiveTime::MIN).and_utc(),
                next_month.and_time(NaiveTime::MIN).and_utc(),
            )
            .await?;
        let on_leave_today = self.store.count_employees_on_leave(today).await?;
        let department_headcounts = self.store.department_headcounts().await?;

        let role = claims.role();
        let payroll = if role.is_some_and(|r| r.is_admin_class() || roles::PAYROLL_VIEWERS.contains(&r)) {
            self.store.latest_payroll_snapshot().await?
        } else {
            None
        };

        let (active_users, recent_audit) = if role.as_ref().is_some_and(Role::is_admin_class) {
            let active = self.store.count_active_users().await?;
            let recent = self
                .store
                .list_audit_logs(&AuditLogFilter::default(), RECENT_AUDIT_LIMIT, 0)
                .await?;
            (Some(active), Some(recent))
        } else {
            (None, None)
        };

        Ok(DashboardSummary {
            total_employees: counts.total,
            active_employees: counts.active,
            inactive_employees: counts.total - counts.active,
            pending_leave_requests: pending,
            approved_leave_this_month: approved_this_month,
            employees_on_leave_today: on_leave_today,
            department_headcounts,
            payroll,
            active_users,
            recent_audit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{EmployeeStore, LeaveStore, MemoryStore, PayrollStore};
    use crate::services::test_support::{claims, date, employee_data, seed_employee};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;
    use shared::models::{LeaveStatusChange, LeaveTypeInput, NewAuditLog, NewLeaveRequest};

    async fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let asha = seed_employee(&store, "Asha", "Juma").await;
        seed_employee(&store, "Baraka", "Mwita").await;
        let mut former = employee_data("Chausiku", "Ally", Decimal::ONE);
        former.employment_status = "terminated".into();
        store.create_employee(&former).await.unwrap();

        let annual = store
            .create_leave_type(&LeaveTypeInput {
                name: "Annual".into(),
                paid: true,
                counts_toward_entitlement: true,
                requires_attachment: false,
                requires_approval: true,
                active: None,
            })
            .await
            .unwrap();
        let request = store
            .create_leave_request(&NewLeaveRequest {
                employee_id: asha.id,
                leave_type_id: annual.id,
                start_date: date("2026-03-09"),
                end_date: date("2026-03-11"),
                working_days: 3,
                reason: None,
            })
            .await
            .unwrap();
        store
            .update_leave_status(
                request.id,
                &LeaveStatusChange {
                    status: LeaveStatus::Approved,
                    approved_by: Some(1),
                    approved_at: Some(Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()),
                    reason: None,
                },
            )
            .await
            .unwrap();
        store
            .create_leave_request(&NewLeaveRequest {
                employee_id: asha.id,
                leave_type_id: annual.id,
                start_date: date("2026-04-06"),
                end_date: date("2026-04-06"),
                working_days: 1,
                reason: None,
            })
            .await
            .unwrap();

        store.create_payroll_batch("2026-02", Some(1)).await.unwrap();
        store
            .insert_audit_log(&NewAuditLog {
                actor_user_id: Some(1),
                action: "employee.create".into(),
                entity_type: "employee".into(),
                entity_id: Some(asha.id.to_string()),
                metadata: json!({}),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_common_counters() {
        let svc = DashboardService::new(seeded().await);
        let summary = svc.summary_on(&claims(9, "viewer"), date("2026-03-10")).await.unwrap();
        assert_eq!(summary.total_employees, 3);
        assert_eq!(summary.active_employees, 2);
        assert_eq!(summary.inactive_employees, 1);
        assert_eq!(summary.pending_leave_requests, 1);
        assert_eq!(summary.approved_leave_this_month, 1);
        assert_eq!(summary.employees_on_leave_today, 1);
        assert_eq!(summary.department_headcounts[0].employee_count, 3);

        let next_month = svc.summary_on(&claims(9, "viewer"), date("2026-04-01")).await.unwrap();
        assert_eq!(next_month.approved_leave_this_month, 0);
        assert_eq!(next_month.employees_on_leave_today, 0);
    }

    #[tokio::test]
    async fn test_role_scoped_sections() {
        let svc = DashboardService::new(seeded().await);
        let day = date("2026-03-10");

        let viewer = svc.summary_on(&claims(9, "viewer"), day).await.unwrap();
        assert!(viewer.payroll.is_none());
        assert!(viewer.active_users.is_none());
        assert!(viewer.recent_audit.is_none());

        let finance = svc.summary_on(&claims(8, "Finance Officer"), day).await.unwrap();
        assert_eq!(finance.payroll.unwrap().month, "2026-02");
        assert!(finance.recent_audit.is_none());

        let admin = svc.summary_on(&claims(1, "admin"), day).await.unwrap();
        assert!(admin.payroll.is_some());
        assert_eq!(admin.active_users, Some(0));
        assert_eq!(admin.recent_audit.unwrap().len(), 1);
    }
}
