//! Report queries
//!
//! Each report has a count query and a paged row query sharing one filter
//! builder.

use async_trait::async_trait;
use shared::models::{
    AttendanceReportRange, AttendanceSummaryRow, EmployeeReportFilter, EmployeeReportRow,
    LeaveReportRange, LeaveReportRow, PayrollBatchReportRow, PayrollReportFilter,
};
use sqlx::{Postgres, QueryBuilder};

use super::{PgStore, like_pattern, search_term};
use crate::db::{RepoResult, ReportStore};

const EMPLOYEE_REPORT_SELECT: &str = "SELECT e.id AS employee_id, e.first_name, e.last_name, \
     d.name AS department_name, e.position, e.employment_status, e.date_of_hire, \
     e.base_salary FROM employees e LEFT JOIN departments d ON d.id = e.department_id WHERE TRUE";

const LEAVE_REPORT_SELECT: &str = "SELECT r.id AS request_id, r.employee_id, \
     (e.first_name || ' ' || e.last_name) AS employee_name, t.name AS leave_type_name, \
     r.start_date, r.end_date, r.working_days, r.status, r.approved_by, r.approved_at \
     FROM leave_requests r \
     JOIN employees e ON e.id = r.employee_id \
     JOIN leave_types t ON t.id = r.leave_type_id WHERE TRUE";

const ATTENDANCE_SUMMARY_SELECT: &str = "SELECT e.id AS employee_id, \
     (e.first_name || ' ' || e.last_name) AS employee_name, d.name AS department_name, \
     COUNT(a.id) FILTER (WHERE a.status = 'present') AS present_count, \
     COUNT(a.id) FILTER (WHERE a.status = 'late') AS late_count, \
     COUNT(a.id) FILTER (WHERE a.status = 'field') AS field_count, \
     COUNT(a.id) FILTER (WHERE a.status = 'absent') AS absent_count, \
     COUNT(a.id) FILTER (WHERE a.status = 'leave') AS leave_count \
     FROM employees e LEFT JOIN departments d ON d.id = e.department_id ";

const PAYROLL_REPORT_SELECT: &str = "SELECT b.id AS batch_id, b.month, b.status, \
     COUNT(p.id) AS entry_count, COALESCE(SUM(p.gross_pay), 0) AS total_gross, \
     COALESCE(SUM(p.net_pay), 0) AS total_net, b.created_at, b.approved_at, b.locked_at \
     FROM payroll_batches b LEFT JOIN payroll_entries p ON p.batch_id = b.id WHERE TRUE";

fn count_of(total: i64) -> u64 {
    total.max(0) as u64
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, limit: u64, offset: u64) {
    qb.push(" LIMIT ")
        .push_bind(limit as i64)
        .push(" OFFSET ")
        .push_bind(offset as i64);
}

fn push_employee_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &EmployeeReportFilter) {
    if let Some(department_id) = filter.department_id {
        qb.push(" AND e.department_id = ").push_bind(department_id);
    }
    if let Some(status) = search_term(filter.employment_status.as_deref()) {
        qb.push(" AND lower(trim(e.employment_status)) = lower(")
            .push_bind(status.to_string())
            .push(")");
    }
    if let Some(term) = search_term(filter.q.as_deref()).map(like_pattern) {
        qb.push(" AND (e.first_name ILIKE ")
            .push_bind(term.clone())
            .push(" OR e.last_name ILIKE ")
            .push_bind(term)
            .push(")");
    }
}

fn push_leave_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &LeaveReportRange) {
    qb.push(" AND r.start_date <= ")
        .push_bind(filter.to)
        .push(" AND r.end_date >= ")
        .push_bind(filter.from);
    if let Some(status) = filter.status {
        qb.push(" AND r.status = ").push_bind(status);
    }
    if let Some(employee_id) = filter.employee_id {
        qb.push(" AND r.employee_id = ").push_bind(employee_id);
    }
    if let Some(leave_type_id) = filter.leave_type_id {
        qb.push(" AND r.leave_type_id = ").push_bind(leave_type_id);
    }
}

fn push_payroll_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PayrollReportFilter) {
    if let Some(from) = search_term(filter.month_from.as_deref()) {
        qb.push(" AND b.month >= ").push_bind(from.to_string());
    }
    if let Some(to) = search_term(filter.month_to.as_deref()) {
        qb.push(" AND b.month <= ").push_bind(to.to_string());
    }
    if let Some(status) = filter.status {
        qb.push(" AND b.status = ").push_bind(status);
    }
}

#[async_trait]
impl ReportStore for PgStore {
    async fn count_employee_report(&self, filter: &EmployeeReportFilter) -> RepoResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM employees e WHERE TRUE");
        push_employee_filter(&mut qb, filter);
        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count_of(total))
    }

    async fn employee_report(
        &self,
        filter: &EmployeeReportFilter,
        limit: u64,
        offset: u64,
    ) -> RepoResult<Vec<EmployeeReportRow>> {
        let mut qb = QueryBuilder::<Postgres>::new(EMPLOYEE_REPORT_SELECT);
        push_employee_filter(&mut qb, filter);
        qb.push(" ORDER BY e.last_name, e.first_name, e.id");
        push_page(&mut qb, limit, offset);
        let rows = qb.build_query_as::<EmployeeReportRow>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn count_leave_report(&self, filter: &LeaveReportRange) -> RepoResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leave_requests r WHERE TRUE");
        push_leave_filter(&mut qb, filter);
        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count_of(total))
    }

    async fn leave_report(
        &self,
        filter: &LeaveReportRange,
        limit: u64,
        offset: u64,
    ) -> RepoResult<Vec<LeaveReportRow>> {
        let mut qb = QueryBuilder::<Postgres>::new(LEAVE_REPORT_SELECT);
        push_leave_filter(&mut qb, filter);
        qb.push(" ORDER BY r.start_date DESC, r.id DESC");
        push_page(&mut qb, limit, offset);
        let rows = qb.build_query_as::<LeaveReportRow>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn count_attendance_summary(&self, filter: &AttendanceReportRange) -> RepoResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM employees e WHERE TRUE");
        if let Some(department_id) = filter.department_id {
            qb.push(" AND e.department_id = ").push_bind(department_id);
        }
        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count_of(total))
    }

    async fn attendance_summary(
        &self,
        filter: &AttendanceReportRange,
        limit: u64,
        offset: u64,
    ) -> RepoResult<Vec<AttendanceSummaryRow>> {
        let mut qb = QueryBuilder::<Postgres>::new(ATTENDANCE_SUMMARY_SELECT);
        qb.push("LEFT JOIN attendance_records a ON a.employee_id = e.id AND a.attendance_date BETWEEN ")
            .push_bind(filter.from)
            .push(" AND ")
            .push_bind(filter.to)
            .push(" WHERE TRUE");
        if let Some(department_id) = filter.department_id {
            qb.push(" AND e.department_id = ").push_bind(department_id);
        }
        qb.push(" GROUP BY e.id, e.first_name, e.last_name, d.name ORDER BY e.first_name, e.last_name, e.id");
        push_page(&mut qb, limit, offset);
        let rows = qb
            .build_query_as::<AttendanceSummaryRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_payroll_report(&self, filter: &PayrollReportFilter) -> RepoResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM payroll_batches b WHERE TRUE");
        push_payroll_filter(&mut qb, filter);
        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count_of(total))
    }

    async fn payroll_report(
        &self,
        filter: &PayrollReportFilter,
        limit: u64,
        offset: u64,
    ) -> RepoResult<Vec<PayrollBatchReportRow>> {
        let mut qb = QueryBuilder::<Postgres>::new(PAYROLL_REPORT_SELECT);
        push_payroll_filter(&mut qb, filter);
        qb.push(" GROUP BY b.id ORDER BY b.month DESC");
        push_page(&mut qb, limit, offset);
        let rows = qb
            .build_query_as::<PayrollBatchReportRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
