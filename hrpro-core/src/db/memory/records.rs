//! Audit log, settings, dashboard and report read models

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use shared::models::{
    AppSetting, AttendanceReportRange, AttendanceStatus, AttendanceSummaryRow, AuditLog,
    AuditLogFilter, DepartmentHeadcount, EmployeeCounts, EmployeeReportFilter, EmployeeReportRow,
    LeaveReportRange, LeaveReportRow, LeaveStatus, NewAuditLog, PayrollBatchReportRow,
    PayrollReportFilter, PayrollSnapshot, SettingKey,
};

use super::organization::is_active_employee;
use super::{MemoryStore, Tables, contains_ci, page, term};
use crate::db::{AuditStore, DashboardStore, RepoError, RepoResult, ReportStore, SettingsStore};

fn audit_matches(log: &AuditLog, filter: &AuditLogFilter) -> bool {
    let day = log.created_at.date_naive();
    filter.from.is_none_or(|from| day >= from)
        && filter.to.is_none_or(|to| day <= to)
        && filter
            .action_prefix
            .as_deref()
            .is_none_or(|prefix| log.action.starts_with(prefix))
        && filter
            .actor_user_id
            .is_none_or(|actor| log.actor_user_id == Some(actor))
        && filter
            .entity_type
            .as_deref()
            .is_none_or(|entity_type| log.entity_type == entity_type)
}

fn matching_audit(tables: &Tables, filter: &AuditLogFilter) -> Vec<AuditLog> {
    let mut rows: Vec<AuditLog> = tables
        .audit_logs
        .iter()
        .filter(|log| audit_matches(log, filter))
        .cloned()
        .collect();
    rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    rows
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn insert_audit_log(&self, log: &NewAuditLog) -> RepoResult<()> {
        if self.faults.lock().audit_insert {
            return Err(RepoError::Database("injected audit insert failure".to_string()));
        }
        let mut tables = self.tables.lock();
        let row = AuditLog {
            id: tables.next_id("audit_logs"),
            actor_user_id: log.actor_user_id,
            action: log.action.clone(),
            entity_type: log.entity_type.clone(),
            entity_id: log.entity_id.clone(),
            metadata: log.metadata.clone(),
            created_at: Utc::now(),
        };
        tables.audit_logs.push(row);
        Ok(())
    }

    async fn list_audit_logs(
        &self,
        filter: &AuditLogFilter,
        limit: u64,
        offset: u64,
    ) -> RepoResult<Vec<AuditLog>> {
        Ok(page(matching_audit(&self.tables.lock(), filter), limit, offset))
    }

    async fn count_audit_logs(&self, filter: &AuditLogFilter) -> RepoResult<u64> {
        Ok(self
            .tables
            .lock()
            .audit_logs
            .iter()
            .filter(|log| audit_matches(log, filter))
            .count() as u64)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn list_settings(&self) -> RepoResult<Vec<AppSetting>> {
        Ok(self.tables.lock().settings.values().cloned().collect())
    }

    async fn upsert_setting(
        &self,
        key: SettingKey,
        value: &Value,
        updated_by: Option<i64>,
    ) -> RepoResult<()> {
        self.tables.lock().settings.insert(
            key.as_str().to_string(),
            AppSetting {
                key: key.as_str().to_string(),
                value: value.clone(),
                updated_by,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl DashboardStore for MemoryStore {
    async fn employee_counts(&self) -> RepoResult<EmployeeCounts> {
        let tables = self.tables.lock();
        Ok(EmployeeCounts {
            total: tables.employees.len() as i64,
            active: tables
                .employees
                .values()
                .filter(|e| is_active_employee(e))
                .count() as i64,
        })
    }

    async fn count_leave_requests_with_status(&self, status: LeaveStatus) -> RepoResult<i64> {
        Ok(self
            .tables
            .lock()
            .leave_requests
            .values()
            .filter(|r| r.status == status)
            .count() as i64)
    }

    async fn count_approved_leave_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepoResult<i64> {
        Ok(self
            .tables
            .lock()
            .leave_requests
            .values()
            .filter(|r| {
                r.status == LeaveStatus::Approved
                    && r.approved_at.is_some_and(|at| at >= from && at < to)
            })
            .count() as i64)
    }

    async fn count_employees_on_leave(&self, day: NaiveDate) -> RepoResult<i64> {
        let tables = self.tables.lock();
        let mut employees: Vec<i64> = tables
            .leave_requests
            .values()
            .filter(|r| r.status == LeaveStatus::Approved && r.start_date <= day && day <= r.end_date)
            .map(|r| r.employee_id)
            .collect();
        employees.sort_unstable();
        employees.dedup();
        Ok(employees.len() as i64)
    }

    async fn department_headcounts(&self) -> RepoResult<Vec<DepartmentHeadcount>> {
        let tables = self.tables.lock();
        let mut counts: BTreeMap<Option<i64>, i64> = BTreeMap::new();
        for employee in tables.employees.values() {
            *counts.entry(employee.department_id).or_insert(0) += 1;
        }
        let mut rows: Vec<DepartmentHeadcount> = counts
            .into_iter()
            .map(|(department_id, employee_count)| DepartmentHeadcount {
                department_id,
                department_name: tables
                    .department_name(department_id)
                    .unwrap_or_else(|| "Unassigned".to_string()),
                employee_count,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.employee_count
                .cmp(&a.employee_count)
                .then_with(|| a.department_name.cmp(&b.department_name))
        });
        Ok(rows)
    }

    async fn latest_payroll_snapshot(&self) -> RepoResult<Option<PayrollSnapshot>> {
        let tables = self.tables.lock();
        Ok(tables
            .payroll_batches
            .values()
            .max_by(|a, b| a.month.cmp(&b.month))
            .map(|batch| PayrollSnapshot {
                batch_id: batch.id,
                month: batch.month.clone(),
                status: batch.status,
                total_net: tables
                    .payroll_entries
                    .values()
                    .filter(|e| e.batch_id == batch.id)
                    .map(|e| e.net_pay)
                    .sum(),
            }))
    }
}

// ── Reports ─────────────────────────────────────────────────────────

fn employee_report_rows(tables: &Tables, filter: &EmployeeReportFilter) -> Vec<EmployeeReportRow> {
    let mut rows: Vec<EmployeeReportRow> = tables
        .employees
        .values()
        .filter(|e| {
            filter.department_id.is_none_or(|id| e.department_id == Some(id))
                && term(filter.employment_status.as_deref())
                    .is_none_or(|s| e.employment_status.trim().eq_ignore_ascii_case(s))
                && term(filter.q.as_deref())
                    .is_none_or(|t| contains_ci(&e.first_name, t) || contains_ci(&e.last_name, t))
        })
        .map(|e| EmployeeReportRow {
            employee_id: e.id,
            first_name: e.first_name.clone(),
            last_name: e.last_name.clone(),
            department_name: tables.department_name(e.department_id),
            position: e.position.clone(),
            employment_status: e.employment_status.clone(),
            date_of_hire: e.date_of_hire,
            base_salary: Some(e.base_salary),
        })
        .collect();
    rows.sort_by(|a, b| {
        (&a.last_name, &a.first_name, a.employee_id).cmp(&(&b.last_name, &b.first_name, b.employee_id))
    });
    rows
}

fn leave_report_rows(tables: &Tables, filter: &LeaveReportRange) -> Vec<LeaveReportRow> {
    let mut rows: Vec<LeaveReportRow> = tables
        .leave_requests
        .values()
        .filter(|r| {
            r.overlaps(filter.from, filter.to)
                && filter.status.is_none_or(|s| r.status == s)
                && filter.employee_id.is_none_or(|id| r.employee_id == id)
                && filter.leave_type_id.is_none_or(|id| r.leave_type_id == id)
        })
        .map(|r| LeaveReportRow {
            request_id: r.id,
            employee_id: r.employee_id,
            employee_name: tables.employee_name(r.employee_id).unwrap_or_default(),
            leave_type_name: tables
                .leave_types
                .get(&r.leave_type_id)
                .map(|t| t.name.clone())
                .unwrap_or_default(),
            start_date: r.start_date,
            end_date: r.end_date,
            working_days: r.working_days,
            status: r.status,
            approved_by: r.approved_by,
            approved_at: r.approved_at,
        })
        .collect();
    rows.sort_by(|a, b| (b.start_date, b.request_id).cmp(&(a.start_date, a.request_id)));
    rows
}

fn attendance_summary_rows(
    tables: &Tables,
    filter: &AttendanceReportRange,
) -> Vec<AttendanceSummaryRow> {
    let mut employees: Vec<_> = tables
        .employees
        .values()
        .filter(|e| filter.department_id.is_none_or(|id| e.department_id == Some(id)))
        .collect();
    employees.sort_by(|a, b| (&a.first_name, &a.last_name, a.id).cmp(&(&b.first_name, &b.last_name, b.id)));

    employees
        .into_iter()
        .map(|e| {
            let mut row = AttendanceSummaryRow {
                employee_id: e.id,
                employee_name: e.full_name(),
                department_name: tables.department_name(e.department_id),
                present_count: 0,
                late_count: 0,
                field_count: 0,
                absent_count: 0,
                leave_count: 0,
                unmarked_count: 0,
            };
            for record in tables
                .attendance
                .range((filter.from, i64::MIN)..=(filter.to, i64::MAX))
                .map(|(_, r)| r)
                .filter(|r| r.employee_id == e.id)
            {
                match record.status {
                    AttendanceStatus::Present => row.present_count += 1,
                    AttendanceStatus::Late => row.late_count += 1,
                    AttendanceStatus::Field => row.field_count += 1,
                    AttendanceStatus::Absent => row.absent_count += 1,
                    AttendanceStatus::Leave => row.leave_count += 1,
                }
            }
            row
        })
        .collect()
}

fn payroll_report_rows(tables: &Tables, filter: &PayrollReportFilter) -> Vec<PayrollBatchReportRow> {
    let month_from = term(filter.month_from.as_deref());
    let month_to = term(filter.month_to.as_deref());
    let mut rows: Vec<PayrollBatchReportRow> = tables
        .payroll_batches
        .values()
        .filter(|b| {
            month_from.is_none_or(|from| b.month.as_str() >= from)
                && month_to.is_none_or(|to| b.month.as_str() <= to)
                && filter.status.is_none_or(|s| b.status == s)
        })
        .map(|b| {
            let entries: Vec<_> = tables
                .payroll_entries
                .values()
                .filter(|e| e.batch_id == b.id)
                .collect();
            PayrollBatchReportRow {
                batch_id: b.id,
                month: b.month.clone(),
                status: b.status,
                entry_count: entries.len() as i64,
                total_gross: entries.iter().map(|e| e.gross_pay).sum::<Decimal>(),
                total_net: entries.iter().map(|e| e.net_pay).sum::<Decimal>(),
                created_at: b.created_at,
                approved_at: b.approved_at,
                locked_at: b.locked_at,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.month.cmp(&a.month));
    rows
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn count_employee_report(&self, filter: &EmployeeReportFilter) -> RepoResult<u64> {
        Ok(employee_report_rows(&self.tables.lock(), filter).len() as u64)
    }

    async fn employee_report(
        &self,
        filter: &EmployeeReportFilter,
        limit: u64,
        offset: u64,
    ) -> RepoResult<Vec<EmployeeReportRow>> {
        Ok(page(employee_report_rows(&self.tables.lock(), filter), limit, offset))
    }

    async fn count_leave_report(&self, filter: &LeaveReportRange) -> RepoResult<u64> {
        Ok(leave_report_rows(&self.tables.lock(), filter).len() as u64)
    }

    async fn leave_report(
        &self,
        filter: &LeaveReportRange,
        limit: u64,
        offset: u64,
    ) -> RepoResult<Vec<LeaveReportRow>> {
        Ok(page(leave_report_rows(&self.tables.lock(), filter), limit, offset))
    }

    async fn count_attendance_summary(&self, filter: &AttendanceReportRange) -> RepoResult<u64> {
        Ok(self
            .tables
            .lock()
            .employees
            .values()
            .filter(|e| filter.department_id.is_none_or(|id| e.department_id == Some(id)))
            .count() as u64)
    }

    async fn attendance_summary(
        &self,
        filter: &AttendanceReportRange,
        limit: u64,
        offset: u64,
    ) -> RepoResult<Vec<AttendanceSummaryRow>> {
        Ok(page(attendance_summary_rows(&self.tables.lock(), filter), limit, offset))
    }

    async fn count_payroll_report(&self, filter: &PayrollReportFilter) -> RepoResult<u64> {
        Ok(payroll_report_rows(&self.tables.lock(), filter).len() as u64)
    }

    async fn payroll_report(
        &self,
        filter: &PayrollReportFilter,
        limit: u64,
        offset: u64,
    ) -> RepoResult<Vec<PayrollBatchReportRow>> {
        Ok(page(payroll_report_rows(&self.tables.lock(), filter), limit, offset))
    }
}
