use shared::models::{
    AttendanceReportFilter, AttendanceSummaryRow, AuditLog, AuditReportFilter, EmployeeReportFilter,
    EmployeeReportRow, ExportFile, LeaveReportFilter, LeaveReportRow, PaginatedResponse,
    PayrollBatchReportRow, PayrollReportFilter, ReportRequest,
};

use super::{CommandResult, authorized};
use crate::core::AppState;

pub async fn employees(
    state: &AppState,
    token: &str,
    request: ReportRequest<EmployeeReportFilter>,
) -> CommandResult<PaginatedResponse<EmployeeReportRow>> {
    authorized(state, token, |claims| async move { state.reports.employees(&claims, request).await }).await
}

pub async fn export_employees(state: &AppState, token: &str, filter: EmployeeReportFilter) -> CommandResult<ExportFile> {
    authorized(state, token, |claims| async move {
        state.reports.export_employees(&claims, filter).await
    })
    .await
}

pub async fn leave(
    state: &AppState,
    token: &str,
    request: ReportRequest<LeaveReportFilter>,
) -> CommandResult<PaginatedResponse<LeaveReportRow>> {
    authorized(state, token, |claims| async move { state.reports.leave(&claims, request).await }).await
}

pub async fn export_leave(state: &AppState, token: &str, filter: LeaveReportFilter) -> CommandResult<ExportFile> {
    authorized(state, token, |claims| async move { state.reports.export_leave(&claims, filter).await }).await
}

pub async fn attendance_summary(
    state: &AppState,
    token: &str,
    request: ReportRequest<AttendanceReportFilter>,
) -> CommandResult<PaginatedResponse<AttendanceSummaryRow>> {
    authorized(state, token, |claims| async move {
        state.reports.attendance_summary(&claims, request).await
    })
    .await
}

pub async fn export_attendance_summary(
    state: &AppState,
    token: &str,
    filter: AttendanceReportFilter,
) -> CommandResult<ExportFile> {
    authorized(state, token, |claims| async move {
        state.reports.export_attendance_summary(&claims, filter).await
    })
    .await
}

pub async fn payroll_batches(
    state: &AppState,
    token: &str,
    request: ReportRequest<PayrollReportFilter>,
) -> CommandResult<PaginatedResponse<PayrollBatchReportRow>> {
    authorized(state, token, |claims| async move {
        state.reports.payroll_batches(&claims, request).await
    })
    .await
}

pub async fn export_payroll_batches(
    state: &AppState,
    token: &str,
    filter: PayrollReportFilter,
) -> CommandResult<ExportFile> {
    authorized(state, token, |claims| async move {
        state.reports.export_payroll_batches(&claims, filter).await
    })
    .await
}

pub async fn audit_log(
    state: &AppState,
    token: &str,
    request: ReportRequest<AuditReportFilter>,
) -> CommandResult<PaginatedResponse<AuditLog>> {
    authorized(state, token, |claims| async move { state.reports.audit_log(&claims, request).await }).await
}

pub async fn export_audit_log(state: &AppState, token: &str, filter: AuditReportFilter) -> CommandResult<ExportFile> {
    authorized(state, token, |claims| async move {
        state.reports.export_audit_log(&claims, filter).await
    })
    .await
}
