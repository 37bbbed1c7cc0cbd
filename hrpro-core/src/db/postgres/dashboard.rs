//! Dashboard rollups

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::models::{DepartmentHeadcount, EmployeeCounts, LeaveStatus, PayrollSnapshot};

use super::PgStore;
use crate::db::{DashboardStore, RepoResult};

#[async_trait]
impl DashboardStore for PgStore {
    async fn employee_counts(&self) -> RepoResult<EmployeeCounts> {
        let counts = sqlx::query_as::<_, EmployeeCounts>(
            "SELECT COUNT(*) AS total, \
               COUNT(*) FILTER (WHERE lower(trim(employment_status)) = 'active') AS active \
             FROM employees",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    async fn count_leave_requests_with_status(&self, status: LeaveStatus) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leave_requests WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_approved_leave_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM leave_requests \
             WHERE status = 'Approved' AND approved_at >= $1 AND approved_at < $2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_employees_on_leave(&self, day: NaiveDate) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT employee_id) FROM leave_requests \
             WHERE status = 'Approved' AND start_date <= $1 AND end_date >= $1",
        )
        .bind(day)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn department_headcounts(&self) -> RepoResult<Vec<DepartmentHeadcount>> {
        let rows = sqlx::query_as::<_, DepartmentHeadcount>(
            "SELECT e.department_id, COALESCE(d.name, 'Unassigned') AS department_name, \
               COUNT(*) AS employee_count \
             FROM employees e LEFT JOIN departments d ON d.id = e.department_id \
             GROUP BY e.department_id, d.name \
             ORDER BY employee_count DESC, department_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn latest_payroll_snapshot(&self) -> RepoResult<Option<PayrollSnapshot>> {
        let row = sqlx::query_as::<_, PayrollSnapshot>(
            "SELECT b.id AS batch_id, b.month, b.status, \
               COALESCE(SUM(p.net_pay), 0) AS total_net \
             FROM payroll_batches b LEFT JOIN payroll_entries p ON p.batch_id = b.id \
             GROUP BY b.id \
             ORDER BY b.month DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
