//! Daily attendance sheet, lock overrides, lunch totals and posting
//! absences to leave

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    AttendanceDayRow, AttendanceRangeQuery, AttendanceRecord, AttendanceStatus, AttendanceWrite,
    LunchCounts, LunchDaily, LunchSummary, LunchVisitorsInput, PostAbsentToLeaveResult, Role,
    UpsertAttendanceInput, role_allowed, validate_lunch_amounts,
};
use shared::util::{clean_optional, parse_iso_date};

use super::roles;
use super::settings::load_settings;
use crate::audit::{AuditEvent, AuditRecorder, noop_recorder};
use crate::auth::{Claims, require_role};
use crate::db::{AttendanceStore, EmployeeStore, Store};

/// Lock reason stamped on records converted to leave
pub const POSTED_TO_LEAVE_REASON: &str = "post_absent_to_leave";

/// Leave side of post-absent-to-leave
#[async_trait]
pub trait LeaveIntegration: Send + Sync {
    /// Create a pending one-day leave request; returns its id
    async fn create_single_day_leave_from_attendance(
        &self,
        claims: &Claims,
        employee_id: i64,
        date: NaiveDate,
    ) -> AppResult<i64>;
}

pub struct AttendanceService {
    store: Arc<dyn Store>,
    audit: Arc<dyn AuditRecorder>,
    leave: Option<Arc<dyn LeaveIntegration>>,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            audit: noop_recorder(),
            leave: None,
        }
    }

    pub fn set_audit_recorder(&mut self, recorder: Arc<dyn AuditRecorder>) {
        self.audit = recorder;
    }

    pub fn set_leave_integration(&mut self, leave: Arc<dyn LeaveIntegration>) {
        self.leave = Some(leave);
    }

    /// Daily sheet: every employee for broad readers, the caller's own row for staff
    pub async fn list_by_date(&self, claims: &Claims, date: &str) -> AppResult<Vec<AttendanceDayRow>> {
        let date = parse_iso_date("date", date)?;
        let scope = if role_allowed(&claims.role, roles::ATTENDANCE_READERS) {
            None
        } else if claims.role() == Some(Role::Staff) {
            Some(claims.employee_id())
        } else {
            return Err(AppError::forbidden("role may not view attendance"));
        };

        let markable = role_allowed(&claims.role, roles::MARKABLE);
        let can_override = role_allowed(&claims.role, roles::ATTENDANCE_OVERRIDE);
        let mut rows = self.store.list_attendance_for_day(date, scope).await?;
        for row in &mut rows {
            row.can_post_to_leave = markable && row.status == AttendanceStatus::Absent.as_str();
            row.can_edit = markable && (!row.is_locked || can_override);
        }
        Ok(rows)
    }

    /// Mark a day, or override an existing locked mark
    pub async fn upsert(&self, claims: &Claims, input: UpsertAttendanceInput) -> AppResult<AttendanceRecord> {
        require_role(claims, roles::MARKABLE)?;
        let date = parse_iso_date("date", &input.date)?;
        let status: AttendanceStatus = input.status.parse()?;
        let reason = clean_optional(input.reason);
        self.require_employee(input.employee_id).await?;

        let write = AttendanceWrite {
            attendance_date: date,
            employee_id: input.employee_id,
            status,
            marked_by: Some(claims.user_id),
            lock_reason: reason.clone(),
        };
        let now = Utc::now();

        let (record, event) = match self.store.find_attendance(date, input.employee_id).await? {
            None => {
                let record = self.store.insert_attendance(&write, now).await?;
                let event = AuditEvent::new("attendance.mark", "attendance_record")
                    .metadata(json!({ "status": status.as_str(), "reason": reason }));
                (record, event)
            }
            Some(existing) if existing.is_locked => {
                if !role_allowed(&claims.role, roles::ATTENDANCE_OVERRIDE) {
                    return Err(AppError::new(ErrorCode::AttendanceLocked));
                }
                let record = self.store.update_attendance(&write, now).await?;
                let event = AuditEvent::new("attendance.override", "attendance_record").metadata(json!({
                    "old_status": existing.status.as_str(),
                    "new_status": status.as_str(),
                    "reason": reason,
                }));
                (record, event)
            }
            Some(_) => {
                let record = self.store.update_attendance(&write, now).await?;
                let event = AuditEvent::new("attendance.mark", "attendance_record")
                    .metadata(json!({ "status": status.as_str(), "reason": reason }));
                (record, event)
            }
        };

        tracing::info!(
            employee_id = record.employee_id,
            date = %record.attendance_date,
            status = %record.status,
            "Attendance marked"
        );
        self.audit
            .record(event.actor(claims.user_id).entity(record.id))
            .await;
        Ok(record)
    }

    /// The caller's own records, oldest first
    pub async fn my_range(&self, claims: &Claims, query: AttendanceRangeQuery) -> AppResult<Vec<AttendanceRecord>> {
        let start = parse_iso_date("start_date", &query.start_date)?;
        let end = parse_iso_date("end_date", &query.end_date)?;
        if end < start {
            return Err(AppError::validation("end_date must not be before start_date"));
        }
        Ok(self
            .store
            .list_attendance_range(claims.employee_id(), start, end)
            .await?)
    }

    pub async fn lunch_summary(&self, claims: &Claims, date: &str) -> AppResult<LunchSummary> {
        let date = parse_iso_date("date", date)?;
        self.summary_for(claims, date).await
    }

    /// Set the day's visitor count; missing amounts keep the day's row or the settings defaults
    pub async fn upsert_lunch_visitors(&self, claims: &Claims, input: LunchVisitorsInput) -> AppResult<LunchSummary> {
        require_role(claims, roles::MARKABLE)?;
        let date = parse_iso_date("date", &input.date)?;
        if input.visitors_count < 0 {
            return Err(AppError::validation("visitors_count must not be negative"));
        }

        let (plate_default, contribution_default) = match self.store.find_lunch(date).await? {
            Some(row) => (row.plate_cost_amount, row.staff_contribution_amount),
            None => {
                let defaults = load_settings(self.store.as_ref()).await?.lunch_defaults;
                (defaults.plate_cost_amount, defaults.staff_contribution_amount)
            }
        };
        let plate_cost_amount = input.plate_cost_amount.unwrap_or(plate_default);
        let staff_contribution_amount = input.staff_contribution_amount.unwrap_or(contribution_default);
        validate_lunch_amounts(plate_cost_amount, staff_contribution_amount)?;

        let saved = self
            .store
            .upsert_lunch(&LunchDaily {
                attendance_date: date,
                visitors_count: input.visitors_count,
                plate_cost_amount,
                staff_contribution_amount,
                updated_by: Some(claims.user_id),
                updated_at: Utc::now(),
            })
            .await?;

        self.audit
            .record(
                AuditEvent::new("attendance.lunch.update", "attendance_lunch_daily")
                    .actor(claims.user_id)
                    .entity(date)
                    .metadata(json!({
                        "visitors_count": saved.visitors_count,
                        "plate_cost_amount": saved.plate_cost_amount,
                        "staff_contribution_amount": saved.staff_contribution_amount,
                    })),
            )
            .await;
        self.summary_for(claims, date).await
    }

    /// Turn an absent mark into a one-day leave request.
    ///
    /// The attendance record is rewritten only after the leave request
    /// exists; a leave-side failure leaves it untouched.
    pub async fn post_absent_to_leave(
        &self,
        claims: &Claims,
        date: &str,
        employee_id: i64,
    ) -> AppResult<PostAbsentToLeaveResult> {
        require_role(claims, roles::MARKABLE)?;
        let date = parse_iso_date("date", date)?;
        self.require_employee(employee_id).await?;
        let record = self
            .store
            .find_attendance(date, employee_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("attendance for employee {employee_id} on {date}")))?;
        if record.status != AttendanceStatus::Absent {
            return Err(AppError::new(ErrorCode::NotAbsent).with_detail("status", record.status.as_str()));
        }

        let created = match &self.leave {
            Some(leave) => {
                leave
                    .create_single_day_leave_from_attendance(claims, employee_id, date)
                    .await
            }
            None => Err(AppError::internal("leave integration is not configured")),
        };
        let event = AuditEvent::new("attendance.post_absent_to_leave", "attendance_record")
            .actor(claims.user_id)
            .entity(record.id);

        let leave_request_id = match created {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(employee_id, %date, error = %e, "Posting absence to leave failed");
                self.audit
                    .record(event.metadata(json!({ "result": "failed", "error": e.message })))
                    .await;
                return Err(AppError::with_message(
                    ErrorCode::LeaveIntegration,
                    format!("leave request could not be created: {}", e.message),
                )
                .with_detail("cause", e.code.kind()));
            }
        };

        let attendance = self
            .store
            .update_attendance(
                &AttendanceWrite {
                    attendance_date: date,
                    employee_id,
                    status: AttendanceStatus::Leave,
                    marked_by: Some(claims.user_id),
                    lock_reason: Some(POSTED_TO_LEAVE_REASON.to_string()),
                },
                Utc::now(),
            )
            .await?;

        tracing::info!(employee_id, %date, leave_request_id, "Absence posted to leave");
        self.audit
            .record(event.metadata(json!({ "result": "success", "leave_request_id": leave_request_id })))
            .await;
        Ok(PostAbsentToLeaveResult {
            attendance,
            leave_request_id,
        })
    }

    async fn summary_for(&self, claims: &Claims, date: NaiveDate) -> AppResult<LunchSummary> {
        let staff_present = self
            .store
            .count_attendance_with_status(date, &[AttendanceStatus::Present, AttendanceStatus::Late])
            .await?;
        let staff_field = self
            .store
            .count_attendance_with_status(date, &[AttendanceStatus::Field])
            .await?;

        let (visitors, plate_cost_amount, staff_contribution_amount) = match self.store.find_lunch(date).await? {
            Some(row) => (
                i64::from(row.visitors_count),
                row.plate_cost_amount,
                row.staff_contribution_amount,
            ),
            None => {
                let defaults = load_settings(self.store.as_ref()).await?.lunch_defaults;
                (0, defaults.plate_cost_amount, defaults.staff_contribution_amount)
            }
        };

        LunchSummary::compute(
            date,
            LunchCounts {
                staff_present,
                staff_field,
                visitors,
                plate_cost_amount,
                staff_contribution_amount,
            },
            role_allowed(&claims.role, roles::MARKABLE),
        )
    }

    async fn require_employee(&self, employee_id: i64) -> AppResult<()> {
        match self.store.find_employee(employee_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(format!("employee {employee_id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::StoreAuditRecorder;
    use crate::db::{AuditStore, MemoryStore};
    use crate::services::test_support::{claims, date, seed_employee};
    use shared::models::AuditLogFilter;

    struct FixedLeave(AppResult<i64>);

    #[async_trait]
    impl LeaveIntegration for FixedLeave {
        async fn create_single_day_leave_from_attendance(
            &self,
            _claims: &Claims,
            _employee_id: i64,
            _date: NaiveDate,
        ) -> AppResult<i64> {
            self.0.clone()
        }
    }

    fn service(store: &MemoryStore) -> AttendanceService {
        let shared: Arc<dyn Store> = Arc::new(store.clone());
        let mut svc = AttendanceService::new(Arc::clone(&shared));
        svc.set_audit_recorder(Arc::new(StoreAuditRecorder::new(shared)));
        svc
    }

    fn mark(employee_id: i64, status: &str, reason: Option<&str>) -> UpsertAttendanceInput {
        UpsertAttendanceInput {
            date: "2026-02-21".into(),
            employee_id,
            status: status.into(),
            reason: reason.map(str::to_string),
        }
    }

    async fn audit_actions(store: &MemoryStore) -> Vec<String> {
        store
            .list_audit_logs(&AuditLogFilter::default(), 100, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.action)
            .collect()
    }

    #[tokio::test]
    async fn test_new_mark_is_locked() {
        let store = MemoryStore::new();
        let emp = seed_employee(&store, "Asha", "Juma").await;
        let svc = service(&store);

        let record = svc
            .upsert(&claims(1, "HR Officer"), mark(emp.id, " Present ", None))
            .await
            .unwrap();
        assert!(record.is_locked);
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(audit_actions(&store).await, ["attendance.mark"]);
    }

    #[tokio::test]
    async fn test_viewer_cannot_mark_and_locked_needs_override() {
        let store = MemoryStore::new();
        let emp = seed_employee(&store, "Asha", "Juma").await;
        let svc = service(&store);

        let err = svc
            .upsert(&claims(2, "viewer"), mark(emp.id, "present", None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let err = svc
            .upsert(&claims(1, "hr_officer"), mark(emp.id, "sleeping", None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err = svc
            .upsert(&claims(1, "hr_officer"), mark(999, "present", None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_override_keeps_lock_and_coalesces_reason() {
        let store = MemoryStore::new();
        let emp = seed_employee(&store, "Asha", "Juma").await;
        let svc = service(&store);
        let hr = claims(1, "hr_officer");

        svc.upsert(&hr, mark(emp.id, "absent", Some("no show"))).await.unwrap();
        let record = svc.upsert(&hr, mark(emp.id, "late", None)).await.unwrap();
        assert!(record.is_locked);
        assert_eq!(record.lock_reason.as_deref(), Some("no show"));
        assert_eq!(audit_actions(&store).await, ["attendance.override", "attendance.mark"]);
    }

    #[tokio::test]
    async fn test_sheet_flags_by_role() {
        let store = MemoryStore::new();
        let asha = seed_employee(&store, "Asha", "Juma").await;
        let baraka = seed_employee(&store, "Baraka", "Moshi").await;
        let svc = service(&store);
        svc.upsert(&claims(1, "hr_officer"), mark(asha.id, "absent", None))
            .await
            .unwrap();

        let rows = svc.list_by_date(&claims(1, "hr_officer"), "2026-02-21").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, "absent");
        assert!(rows[0].can_post_to_leave && rows[0].can_edit);
        assert_eq!(rows[1].status, "unmarked");
        assert!(!rows[1].is_locked && !rows[1].can_post_to_leave);

        let rows = svc.list_by_date(&claims(3, "viewer"), "2026-02-21").await.unwrap();
        assert!(rows.iter().all(|r| !r.can_edit && !r.can_post_to_leave));

        let own = svc
            .list_by_date(&claims(baraka.id, "staff"), "2026-02-21")
            .await
            .unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].employee_id, baraka.id);
    }

    #[tokio::test]
    async fn test_my_range_rejects_reversed_dates() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let err = svc
            .my_range(
                &claims(1, "staff"),
                AttendanceRangeQuery {
                    start_date: "2026-02-10".into(),
                    end_date: "2026-02-01".into(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn test_lunch_uses_settings_then_row() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let hr = claims(1, "hr_officer");
        for (first, status) in [("A", "present"), ("B", "late"), ("C", "field"), ("D", "absent")] {
            let emp = seed_employee(&store, first, "X").await;
            svc.upsert(&hr, mark(emp.id, status, None)).await.unwrap();
        }

        let summary = svc.lunch_summary(&claims(2, "viewer"), "2026-02-21").await.unwrap();
        assert_eq!(summary.staff_present, 2);
        assert_eq!(summary.staff_field, 1);
        assert_eq!(summary.plate_cost_amount, 12_000);
        assert!(!summary.can_edit_visitors);

        let summary = svc
            .upsert_lunch_visitors(
                &hr,
                LunchVisitorsInput {
                    date: "2026-02-21".into(),
                    visitors_count: 3,
                    plate_cost_amount: Some(10_000),
                    staff_contribution_amount: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(summary.total_plates, 5);
        assert_eq!(summary.total_cost, 50_000);
        assert_eq!(summary.staff_contribution_total, 8_000);
        assert_eq!(summary.organization_balance, 42_000);
        assert!(summary.can_edit_visitors);
    }

    #[tokio::test]
    async fn test_lunch_amount_out_of_range_is_rejected_before_saving() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let hr = claims(1, "hr_officer");
        let emp = seed_employee(&store, "Asha", "Juma").await;
        svc.upsert(&hr, mark(emp.id, "present", None)).await.unwrap();

        let err = svc
            .upsert_lunch_visitors(
                &hr,
                LunchVisitorsInput {
                    date: "2026-02-21".into(),
                    visitors_count: 3,
                    plate_cost_amount: Some(i64::MAX / 2),
                    staff_contribution_amount: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        assert!(store.find_lunch(date("2026-02-21")).await.unwrap().is_none());
        let summary = svc.lunch_summary(&hr, "2026-02-21").await.unwrap();
        assert_eq!(summary.total_cost, 12_000);
    }

    #[tokio::test]
    async fn test_post_absent_requires_absent_status() {
        let store = MemoryStore::new();
        let emp = seed_employee(&store, "Asha", "Juma").await;
        let mut svc = service(&store);
        svc.set_leave_integration(Arc::new(FixedLeave(Ok(77))));
        let hr = claims(1, "hr_officer");

        svc.upsert(&hr, mark(emp.id, "present", None)).await.unwrap();
        let err = svc
            .post_absent_to_leave(&hr, "2026-02-21", emp.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotAbsent);
    }

    #[tokio::test]
    async fn test_post_absent_success_rewrites_record() {
        let store = MemoryStore::new();
        let emp = seed_employee(&store, "Asha", "Juma").await;
        let mut svc = service(&store);
        svc.set_leave_integration(Arc::new(FixedLeave(Ok(77))));
        let hr = claims(1, "hr_officer");

        svc.upsert(&hr, mark(emp.id, "absent", None)).await.unwrap();
        let result = svc.post_absent_to_leave(&hr, "2026-02-21", emp.id).await.unwrap();
        assert_eq!(result.leave_request_id, 77);
        assert_eq!(result.attendance.status, AttendanceStatus::Leave);
        assert_eq!(result.attendance.lock_reason.as_deref(), Some(POSTED_TO_LEAVE_REASON));

        let logs = store
            .list_audit_logs(&AuditLogFilter::default(), 10, 0)
            .await
            .unwrap();
        assert_eq!(logs[0].action, "attendance.post_absent_to_leave");
        assert_eq!(logs[0].metadata["result"], "success");
        assert_eq!(logs[0].metadata["leave_request_id"], 77);
    }

    #[tokio::test]
    async fn test_post_absent_without_integration_fails_cleanly() {
        let store = MemoryStore::new();
        let emp = seed_employee(&store, "Asha", "Juma").await;
        let svc = service(&store);
        let hr = claims(1, "hr_officer");

        svc.upsert(&hr, mark(emp.id, "absent", None)).await.unwrap();
        let err = svc
            .post_absent_to_leave(&hr, "2026-02-21", emp.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::LeaveIntegration);
        let record = store
            .find_attendance(date("2026-02-21"), emp.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, AttendanceStatus::Absent);
    }
}
