//! Tabular reports
//!
//! Each report has a paginated list and a CSV export. Exports count the
//! matching rows first and refuse anything above [`EXPORT_ROW_LIMIT`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    AttendanceReportFilter, AttendanceReportRange, AttendanceSummaryRow, AuditLog, AuditLogFilter,
    AuditReportFilter, EXPORT_ROW_LIMIT, EmployeeReportFilter, EmployeeReportRow, ExportFile,
    LeaveReportFilter, LeaveReportRange, LeaveReportRow, PageRequest, PaginatedResponse,
    PayrollBatchReportRow, PayrollReportFilter, ReportRequest, role_allowed,
};
use shared::util::{clean_optional, parse_date_range, parse_month};

use super::roles;
use crate::audit::{AuditEvent, AuditRecorder, noop_recorder};
use crate::auth::{Claims, require_role};
use crate::db::{AuditStore, ReportStore, Store};
use crate::utils::csv::{money, write_csv};

pub const EMPLOYEE_REPORT_HEADER: [&str; 8] = [
    "Employee ID",
    "First Name",
    "Last Name",
    "Department",
    "Position",
    "Employment Status",
    "Date of Hire",
    "Base Salary",
];

pub const LEAVE_REPORT_HEADER: [&str; 10] = [
    "Request ID",
    "Employee ID",
    "Employee Name",
    "Leave Type",
    "Start Date",
    "End Date",
    "Working Days",
    "Status",
    "Approved By",
    "Approved At",
];

pub const ATTENDANCE_SUMMARY_HEADER: [&str; 9] = [
    "Employee ID",
    "Employee Name",
    "Department",
    "Present",
    "Late",
    "Field",
    "Absent",
    "Leave",
    "Unmarked",
];

pub const PAYROLL_REPORT_HEADER: [&str; 9] = [
    "Batch ID",
    "Month",
    "Status",
    "Entries",
    "Total Gross",
    "Total Net",
    "Created At",
    "Approved At",
    "Locked At",
];

pub const AUDIT_REPORT_HEADER: [&str; 7] = [
    "ID",
    "Created At",
    "Actor ID",
    "Action",
    "Entity Type",
    "Entity ID",
    "Metadata",
];

pub struct ReportService {
    store: Arc<dyn Store>,
    audit: Arc<dyn AuditRecorder>,
}

impl ReportService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            audit: noop_recorder(),
        }
    }

    pub fn set_audit_recorder(&mut self, recorder: Arc<dyn AuditRecorder>) {
        self.audit = recorder;
    }

    // ==================== Employees ====================

    pub async fn employees(
        &self,
        claims: &Claims,
        request: ReportRequest<EmployeeReportFilter>,
    ) -> AppResult<PaginatedResponse<EmployeeReportRow>> {
        require_role(claims, roles::EMPLOYEE_READERS)?;
        let filter = clean_employee_filter(request.filter);
        let page = request.page;
        let total = self.store.count_employee_report(&filter).await?;
        let rows = self
            .store
            .employee_report(&filter, u64::from(page.limit()), page.offset())
            .await?;
        Ok(PaginatedResponse::from_request(redact_salaries(claims, rows), total, &page))
    }

    pub async fn export_employees(&self, claims: &Claims, filter: EmployeeReportFilter) -> AppResult<ExportFile> {
        require_role(claims, roles::EMPLOYEE_READERS)?;
        let filter = clean_employee_filter(filter);
        let total = self.store.count_employee_report(&filter).await?;
        ensure_exportable(total)?;
        let rows = redact_salaries(claims, self.store.employee_report(&filter, total, 0).await?);

        let content = write_csv(
            &EMPLOYEE_REPORT_HEADER,
            rows.into_iter().map(|r| {
                vec![
                    r.employee_id.to_string(),
                    r.first_name,
                    r.last_name,
                    r.department_name.unwrap_or_default(),
                    r.position,
                    r.employment_status,
                    r.date_of_hire.to_string(),
                    r.base_salary.map(money).unwrap_or_default(),
                ]
            }),
        )?;
        self.finish_export(claims, "employees", total, content).await
    }

    // ==================== Leave ====================

    pub async fn leave(
        &self,
        claims: &Claims,
        request: ReportRequest<LeaveReportFilter>,
    ) -> AppResult<PaginatedResponse<LeaveReportRow>> {
        require_role(claims, roles::REPORT_READERS)?;
        let range = leave_range(request.filter)?;
        let page = request.page;
        let total = self.store.count_leave_report(&range).await?;
        let rows = self
            .store
            .leave_report(&range, u64::from(page.limit()), page.offset())
            .await?;
        Ok(PaginatedResponse::from_request(rows, total, &page))
    }

    pub async fn export_leave(&self, claims: &Claims, filter: LeaveReportFilter) -> AppResult<ExportFile> {
        require_role(claims, roles::REPORT_READERS)?;
        let range = leave_range(filter)?;
        let total = self.store.count_leave_report(&range).await?;
        ensure_exportable(total)?;
        let rows = self.store.leave_report(&range, total, 0).await?;

        let content = write_csv(
            &LEAVE_REPORT_HEADER,
            rows.into_iter().map(|r| {
                vec![
                    r.request_id.to_string(),
                    r.employee_id.to_string(),
                    r.employee_name,
                    r.leave_type_name,
                    r.start_date.to_string(),
                    r.end_date.to_string(),
                    r.working_days.to_string(),
                    r.status.as_str().to_string(),
                    r.approved_by.map(|id| id.to_string()).unwrap_or_default(),
                    timestamp(r.approved_at),
                ]
            }),
        )?;
        self.finish_export(claims, "leave", total, content).await
    }

    // ==================== Attendance summary ====================

    pub async fn attendance_summary(
        &self,
        claims: &Claims,
        request: ReportRequest<AttendanceReportFilter>,
    ) -> AppResult<PaginatedResponse<AttendanceSummaryRow>> {
        require_role(claims, roles::REPORT_READERS)?;
        let range = attendance_range(request.filter)?;
        let page = request.page;
        let total = self.store.count_attendance_summary(&range).await?;
        let rows = self
            .store
            .attendance_summary(&range, u64::from(page.limit()), page.offset())
            .await?;
        Ok(PaginatedResponse::from_request(fill_unmarked(&range, rows), total, &page))
    }

    pub async fn export_attendance_summary(
        &self,
        claims: &Claims,
        filter: AttendanceReportFilter,
    ) -> AppResult<ExportFile> {
        require_role(claims, roles::REPORT_READERS)?;
        let range = attendance_range(filter)?;
        let total = self.store.count_attendance_summary(&range).await?;
        ensure_exportable(total)?;
        let rows = fill_unmarked(&range, self.store.attendance_summary(&range, total, 0).await?);

        let content = write_csv(
            &ATTENDANCE_SUMMARY_HEADER,
            rows.into_iter().map(|r| {
                vec![
                    r.employee_id.to_string(),
                    r.employee_name,
                    r.department_name.unwrap_or_default(),
                    r.present_count.to_string(),
                    r.late_count.to_string(),
                    r.field_count.to_string(),
                    r.absent_count.to_string(),
                    r.leave_count.to_string(),
                    r.unmarked_count.to_string(),
                ]
            }),
        )?;
        self.finish_export(claims, "attendance-summary", total, content).await
    }

    // ==================== Payroll batches ====================

    pub async fn payroll_batches(
        &self,
        claims: &Claims,
        request: ReportRequest<PayrollReportFilter>,
    ) -> AppResult<PaginatedResponse<PayrollBatchReportRow>> {
        require_role(claims, roles::PAYROLL)?;
        let filter = payroll_filter(request.filter)?;
        let page = request.page;
        let total = self.store.count_payroll_report(&filter).await?;
        let rows = self
            .store
            .payroll_report(&filter, u64::from(page.limit()), page.offset())
            .await?;
        Ok(PaginatedResponse::from_request(rows, total, &page))
    }

    pub async fn export_payroll_batches(&self, claims: &Claims, filter: PayrollReportFilter) -> AppResult<ExportFile> {
        require_role(claims, roles::PAYROLL)?;
        let filter = payroll_filter(filter)?;
        let total = self.store.count_payroll_report(&filter).await?;
        ensure_exportable(total)?;
        let rows = self.store.payroll_report(&filter, total, 0).await?;

        let content = write_csv(
            &PAYROLL_REPORT_HEADER,
            rows.into_iter().map(|r| {
                vec![
                    r.batch_id.to_string(),
                    r.month,
                    r.status.to_string(),
                    r.entry_count.to_string(),
                    money(r.total_gross),
                    money(r.total_net),
                    r.created_at.to_rfc3339(),
                    timestamp(r.approved_at),
                    timestamp(r.locked_at),
                ]
            }),
        )?;
        self.finish_export(claims, "payroll-batches", total, content).await
    }

    // ==================== Audit log ====================

    pub async fn audit_log(
        &self,
        claims: &Claims,
        request: ReportRequest<AuditReportFilter>,
    ) -> AppResult<PaginatedResponse<AuditLog>> {
        require_role(claims, roles::ADMIN_ONLY)?;
        let filter = audit_filter(request.filter)?;
        let page = request.page;
        let total = self.store.count_audit_logs(&filter).await?;
        let rows = self
            .store
            .list_audit_logs(&filter, u64::from(page.limit()), page.offset())
            .await?;
        Ok(PaginatedResponse::from_request(rows, total, &page))
    }

    pub async fn export_audit_log(&self, claims: &Claims, filter: AuditReportFilter) -> AppResult<ExportFile> {
        require_role(claims, roles::ADMIN_ONLY)?;
        let filter = audit_filter(filter)?;
        let total = self.store.count_audit_logs(&filter).await?;
        ensure_exportable(total)?;
        let rows = self.store.list_audit_logs(&filter, total, 0).await?;

        let content = write_csv(
            &AUDIT_REPORT_HEADER,
            rows.into_iter().map(|r| {
                vec![
                    r.id.to_string(),
                    r.created_at.to_rfc3339(),
                    r.actor_user_id.map(|id| id.to_string()).unwrap_or_default(),
                    r.action,
                    r.entity_type,
                    r.entity_id.unwrap_or_default(),
                    r.metadata.to_string(),
                ]
            }),
        )?;
        self.finish_export(claims, "audit-log", total, content).await
    }

    async fn finish_export(&self, claims: &Claims, report: &str, rows: u64, content: Vec<u8>) -> AppResult<ExportFile> {
        tracing::info!(report, rows, "Report exported");
        self.audit
            .record(
                AuditEvent::new("report.export", "report")
                    .actor(claims.user_id)
                    .entity(report)
                    .metadata(json!({ "rows": rows })),
            )
            .await;
        Ok(ExportFile::csv(format!("{report}-report.csv"), content))
    }
}

fn ensure_exportable(total: u64) -> AppResult<()> {
    if total > EXPORT_ROW_LIMIT {
        return Err(AppError::new(ErrorCode::ExportLimitExceeded)
            .with_detail("rows", total)
            .with_detail("limit", EXPORT_ROW_LIMIT));
    }
    Ok(())
}

fn timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.to_rfc3339()).unwrap_or_default()
}

fn redact_salaries(claims: &Claims, mut rows: Vec<EmployeeReportRow>) -> Vec<EmployeeReportRow> {
    if !role_allowed(&claims.role, roles::SALARY_VIEWERS) {
        for row in &mut rows {
            row.base_salary = None;
        }
    }
    rows
}

fn clean_employee_filter(filter: EmployeeReportFilter) -> EmployeeReportFilter {
    EmployeeReportFilter {
        department_id: filter.department_id,
        employment_status: clean_optional(filter.employment_status),
        q: clean_optional(filter.q),
    }
}

fn leave_range(filter: LeaveReportFilter) -> AppResult<LeaveReportRange> {
    let (from, to) = parse_date_range(&filter.date_from, &filter.date_to)?;
    Ok(LeaveReportRange {
        from,
        to,
        status: filter.status,
        employee_id: filter.employee_id,
        leave_type_id: filter.leave_type_id,
    })
}

fn attendance_range(filter: AttendanceReportFilter) -> AppResult<AttendanceReportRange> {
    let (from, to) = parse_date_range(&filter.date_from, &filter.date_to)?;
    Ok(AttendanceReportRange {
        from,
        to,
        department_id: filter.department_id,
    })
}

/// `unmarked = max(0, days in range - marked rows)`
fn fill_unmarked(range: &AttendanceReportRange, mut rows: Vec<AttendanceSummaryRow>) -> Vec<AttendanceSummaryRow> {
    let total_days = (range.to - range.from).num_days() + 1;
    for row in &mut rows {
        row.unmarked_count = (total_days - row.marked()).max(0);
    }
    rows
}

fn payroll_filter(filter: PayrollReportFilter) -> AppResult<PayrollReportFilter> {
    let month_from = clean_optional(filter.month_from);
    let month_to = clean_optional(filter.month_to);
    let from = month_from.as_deref().map(parse_month).transpose()?;
    let to = month_to.as_deref().map(parse_month).transpose()?;
    if let (Some(from), Some(to)) = (from, to)
        && from > to
    {
        return Err(AppError::validation("month_from must not be after month_to"));
    }
    Ok(PayrollReportFilter {
        month_from,
        month_to,
        status: filter.status,
    })
}

fn audit_filter(filter: AuditReportFilter) -> AppResult<AuditLogFilter> {
    let (from, to) = parse_date_range(&filter.date_from, &filter.date_to)?;
    Ok(AuditLogFilter {
        from: Some(from),
        to: Some(to),
        action_prefix: clean_optional(filter.action_prefix),
        actor_user_id: filter.actor_user_id,
        entity_type: clean_optional(filter.entity_type),
    })
}

/// Default page for callers that only pass a filter
pub fn first_page<F>(filter: F) -> ReportRequest<F> {
    ReportRequest {
        filter,
        page: PageRequest::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AttendanceStore, DepartmentStore, EmployeeStore, MemoryStore};
    use crate::services::test_support::{claims, date, employee_data, seed_employee};
    use rust_decimal_macros::dec;
    use shared::models::{AttendanceStatus, AttendanceWrite, DepartmentInput};

    async fn store_with_staff() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let dept = store
            .create_department(&DepartmentInput {
                name: "Programs".into(),
                description: None,
            })
            .await
            .unwrap();
        let mut data = employee_data("Doe, Jane", "Mushi", dec!(2500000));
        data.department_id = Some(dept.id);
        store.create_employee(&data).await.unwrap();
        seed_employee(&store, "Baraka", "Mwita").await;
        store
    }

    fn employee_csv(file: &ExportFile) -> Vec<String> {
        String::from_utf8(file.content.clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_employee_report_salary_redaction() {
        let svc = ReportService::new(store_with_staff().await);

        let finance = svc
            .export_employees(&claims(1, "finance_officer"), EmployeeReportFilter::default())
            .await
            .unwrap();
        let lines = employee_csv(&finance);
        assert_eq!(lines[0], EMPLOYEE_REPORT_HEADER.join(","));
        assert!(lines[1].ends_with(",2500000.00"));
        assert!(lines[1].contains("\"Doe, Jane\""));
        assert_eq!(finance.filename, "employees-report.csv");
        assert_eq!(finance.mime_type, "text/csv;charset=utf-8");

        let viewer = svc
            .export_employees(&claims(2, "viewer"), EmployeeReportFilter::default())
            .await
            .unwrap();
        assert!(employee_csv(&viewer)[2].ends_with("2024-01-15,"));

        let hr_page = svc
            .employees(&claims(3, "hr_officer"), first_page(EmployeeReportFilter::default()))
            .await
            .unwrap();
        assert!(hr_page.data.iter().all(|r| r.base_salary.is_none()));

        let admin_page = svc
            .employees(&claims(4, "admin"), first_page(EmployeeReportFilter::default()))
            .await
            .unwrap();
        assert!(admin_page.data.iter().all(|r| r.base_salary.is_some()));
    }

    #[tokio::test]
    async fn test_report_role_gates() {
        let svc = ReportService::new(Arc::new(MemoryStore::new()));
        let leave = LeaveReportFilter {
            date_from: "2026-01-01".into(),
            date_to: "2026-01-31".into(),
            ..Default::default()
        };
        assert_eq!(
            svc.leave(&claims(1, "finance_officer"), first_page(leave.clone())).await.unwrap_err().code,
            ErrorCode::Forbidden
        );
        assert!(svc.leave(&claims(1, "viewer"), first_page(leave)).await.is_ok());
        assert_eq!(
            svc.payroll_batches(&claims(1, "hr_officer"), first_page(PayrollReportFilter::default()))
                .await
                .unwrap_err()
                .code,
            ErrorCode::Forbidden
        );
        let audit = AuditReportFilter {
            date_from: "2026-01-01".into(),
            date_to: "2026-01-31".into(),
            ..Default::default()
        };
        assert_eq!(
            svc.audit_log(&claims(1, "hr_officer"), first_page(audit.clone())).await.unwrap_err().code,
            ErrorCode::Forbidden
        );
        assert!(svc.export_audit_log(&claims(1, "admin"), audit).await.is_ok());
    }

    #[tokio::test]
    async fn test_date_ranges_validated() {
        let svc = ReportService::new(Arc::new(MemoryStore::new()));
        let hr = claims(1, "hr_officer");
        for (from, to) in [("", "2026-01-31"), ("2026-02-01", "2026-01-31"), ("01/01/2026", "2026-01-31")] {
            let err = svc
                .attendance_summary(
                    &hr,
                    first_page(AttendanceReportFilter {
                        date_from: from.into(),
                        date_to: to.into(),
                        department_id: None,
                    }),
                )
                .await
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationFailed);
        }

        let err = svc
            .payroll_batches(
                &claims(1, "admin"),
                first_page(PayrollReportFilter {
                    month_from: Some("2026-13".into()),
                    ..Default::default()
                }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn test_attendance_unmarked_count() {
        let store = Arc::new(MemoryStore::new());
        let employee = seed_employee(&store, "Asha", "Juma").await;
        for (day, status) in [("2026-02-02", AttendanceStatus::Present), ("2026-02-03", AttendanceStatus::Absent)] {
            store
                .insert_attendance(
                    &AttendanceWrite {
                        attendance_date: date(day),
                        employee_id: employee.id,
                        status,
                        marked_by: Some(1),
                        lock_reason: None,
                    },
                    Utc::now(),
                )
                .await
                .unwrap();
        }
        let svc = ReportService::new(store);
        let page = svc
            .attendance_summary(
                &claims(1, "hr_officer"),
                first_page(AttendanceReportFilter {
                    date_from: "2026-02-01".into(),
                    date_to: "2026-02-07".into(),
                    department_id: None,
                }),
            )
            .await
            .unwrap();
        let row = &page.data[0];
        assert_eq!((row.present_count, row.absent_count), (1, 1));
        assert_eq!(row.unmarked_count, 5);
    }

    #[test]
    fn test_export_limit() {
        assert!(ensure_exportable(EXPORT_ROW_LIMIT).is_ok());
        assert_eq!(
            ensure_exportable(EXPORT_ROW_LIMIT + 1).unwrap_err().code,
            ErrorCode::ExportLimitExceeded
        );
    }
}
