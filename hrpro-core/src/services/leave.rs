//! Leave types, locked dates, entitlements and the request workflow

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    ApplyLeaveInput, EntitlementInput, LeaveBalance, LeaveEntitlement, LeaveLockedDate,
    LeaveRequest, LeaveRequestFilter, LeaveStatus, LeaveStatusChange, LeaveType, LeaveTypeInput,
    LockedDateInput, NewLeaveRequest, role_allowed,
};
use shared::util::{clean_optional, parse_iso_date};

use super::attendance::LeaveIntegration;
use super::roles;
use crate::audit::{AuditEvent, AuditRecorder, noop_recorder};
use crate::auth::{Claims, require_role};
use crate::db::{EmployeeStore, LeaveStore, Store};
use crate::utils::time::working_days;
use crate::utils::validation::{MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text};

const DEFAULT_REJECT_REASON: &str = "Rejected";
const FROM_ATTENDANCE_REASON: &str = "Absent, posted from attendance";

pub struct LeaveService {
    store: Arc<dyn Store>,
    audit: Arc<dyn AuditRecorder>,
}

impl LeaveService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            audit: noop_recorder(),
        }
    }

    pub fn set_audit_recorder(&mut self, recorder: Arc<dyn AuditRecorder>) {
        self.audit = recorder;
    }

    // ── Types ───────────────────────────────────────────────────────

    /// Inactive types are only listed for leave managers
    pub async fn list_types(&self, claims: &Claims, include_inactive: bool) -> AppResult<Vec<LeaveType>> {
        let include_inactive = include_inactive && role_allowed(&claims.role, roles::LEAVE_MANAGERS);
        Ok(self.store.list_leave_types(include_inactive).await?)
    }

    pub async fn create_type(&self, claims: &Claims, input: LeaveTypeInput) -> AppResult<LeaveType> {
        require_role(claims, roles::LEAVE_MANAGERS)?;
        let input = validate_type(input)?;
        let leave_type = self.store.create_leave_type(&input).await?;
        self.audit
            .record(
                AuditEvent::new("leave.type.create", "leave_type")
                    .actor(claims.user_id)
                    .entity(leave_type.id)
                    .metadata(json!({ "name": leave_type.name })),
            )
            .await;
        Ok(leave_type)
    }

    pub async fn update_type(&self, claims: &Claims, id: i64, input: LeaveTypeInput) -> AppResult<LeaveType> {
        require_role(claims, roles::LEAVE_MANAGERS)?;
        let input = validate_type(input)?;
        let leave_type = self.store.update_leave_type(id, &input).await?;
        self.audit
            .record(
                AuditEvent::new("leave.type.update", "leave_type")
                    .actor(claims.user_id)
                    .entity(id)
                    .metadata(json!({ "name": leave_type.name, "active": leave_type.active })),
            )
            .await;
        Ok(leave_type)
    }

    pub async fn set_type_active(&self, claims: &Claims, id: i64, active: bool) -> AppResult<LeaveType> {
        require_role(claims, roles::LEAVE_MANAGERS)?;
        let leave_type = self.store.set_leave_type_active(id, active).await?;
        self.audit
            .record(
                AuditEvent::new("leave.type.set_active", "leave_type")
                    .actor(claims.user_id)
                    .entity(id)
                    .metadata(json!({ "active": active })),
            )
            .await;
        Ok(leave_type)
    }

    // ── Locked dates ────────────────────────────────────────────────

    pub async fn list_locked_dates(&self, _claims: &Claims, year: i32) -> AppResult<Vec<LeaveLockedDate>> {
        Ok(self.store.list_locked_dates(year).await?)
    }

    pub async fn upsert_locked_date(&self, claims: &Claims, input: LockedDateInput) -> AppResult<LeaveLockedDate> {
        require_role(claims, roles::LEAVE_MANAGERS)?;
        let date = parse_iso_date("date", &input.date)?;
        let reason = clean_optional(input.reason);
        validate_optional_text(&reason, "reason", MAX_NOTE_LEN)?;

        let locked = self
            .store
            .upsert_locked_date(date, reason.as_deref(), Some(claims.user_id))
            .await?;
        self.audit
            .record(
                AuditEvent::new("leave.locked_date.upsert", "leave_locked_date")
                    .actor(claims.user_id)
                    .entity(date)
                    .metadata(json!({ "reason": reason })),
            )
            .await;
        Ok(locked)
    }

    pub async fn remove_locked_date(&self, claims: &Claims, date: &str) -> AppResult<()> {
        require_role(claims, roles::LEAVE_MANAGERS)?;
        let date = parse_iso_date("date", date)?;
        if !self.store.delete_locked_date(date).await? {
            return Err(AppError::not_found(format!("locked date {date}")));
        }
        self.audit
            .record(
                AuditEvent::new("leave.locked_date.remove", "leave_locked_date")
                    .actor(claims.user_id)
                    .entity(date),
            )
            .await;
        Ok(())
    }

    // ── Entitlements & balance ──────────────────────────────────────

    pub async fn upsert_entitlement(&self, claims: &Claims, input: EntitlementInput) -> AppResult<LeaveEntitlement> {
        require_role(claims, roles::LEAVE_MANAGERS)?;
        if input.reserved_days < 0 || input.total_days < input.reserved_days {
            return Err(AppError::validation("entitlement requires total >= reserved >= 0"));
        }
        self.require_employee(input.employee_id).await?;

        let entitlement = self.store.upsert_entitlement(&input).await?;
        self.audit
            .record(
                AuditEvent::new("leave.entitlement.upsert", "leave_entitlement")
                    .actor(claims.user_id)
                    .entity(entitlement.id)
                    .metadata(json!({
                        "employee_id": input.employee_id,
                        "year": input.year,
                        "total_days": input.total_days,
                        "reserved_days": input.reserved_days,
                    })),
            )
            .await;
        Ok(entitlement)
    }

    /// Leave managers may read anyone's balance; others only their own
    pub async fn balance(&self, claims: &Claims, employee_id: i64, year: i32) -> AppResult<LeaveBalance> {
        if employee_id != claims.employee_id() {
            require_role(claims, roles::LEAVE_MANAGERS)?;
        }
        self.compute_balance(employee_id, year).await
    }

    async fn compute_balance(&self, employee_id: i64, year: i32) -> AppResult<LeaveBalance> {
        let (total, reserved) = self
            .store
            .find_entitlement(employee_id, year)
            .await?
            .map(|e| (e.total_days, e.reserved_days))
            .unwrap_or((0, 0));
        let approved = self
            .store
            .sum_leave_days(employee_id, year, LeaveStatus::Approved)
            .await?;
        let pending = self
            .store
            .sum_leave_days(employee_id, year, LeaveStatus::Pending)
            .await?;
        Ok(LeaveBalance::compute(employee_id, year, total, reserved, approved, pending))
    }

    // ── Requests ────────────────────────────────────────────────────

    /// Apply on the caller's own behalf
    pub async fn apply(&self, claims: &Claims, input: ApplyLeaveInput) -> AppResult<LeaveRequest> {
        let start = parse_iso_date("start_date", &input.start_date)?;
        let end = parse_iso_date("end_date", &input.end_date)?;
        let reason = clean_optional(input.reason);
        validate_optional_text(&reason, "reason", MAX_NOTE_LEN)?;

        let request = self
            .apply_for(claims.employee_id(), input.leave_type_id, start, end, reason)
            .await?;
        self.record_apply(claims, &request, "self").await;
        Ok(request)
    }

    pub async fn list_my(&self, claims: &Claims, filter: LeaveRequestFilter) -> AppResult<Vec<LeaveRequest>> {
        let filter = LeaveRequestFilter {
            employee_id: Some(claims.employee_id()),
            ..filter
        };
        Ok(self.store.list_leave_requests(&filter).await?)
    }

    pub async fn list_all(&self, claims: &Claims, filter: LeaveRequestFilter) -> AppResult<Vec<LeaveRequest>> {
        require_role(claims, roles::LEAVE_MANAGERS)?;
        Ok(self.store.list_leave_requests(&filter).await?)
    }

    pub async fn approve(&self, claims: &Claims, id: i64) -> AppResult<LeaveRequest> {
        let request = self.load_request(id).await?;
        check_transition(claims, &request, LeaveStatus::Approved)?;

        // conditions may have changed since the request was filed
        let days = working_days(request.start_date, request.end_date)?;
        self.check_locked_dates(&days).await?;
        self.check_overlap(request.employee_id, request.start_date, request.end_date, Some(id))
            .await?;

        let change = LeaveStatusChange {
            status: LeaveStatus::Approved,
            approved_by: Some(claims.user_id),
            approved_at: Some(Utc::now()),
            reason: None,
        };
        self.apply_change(claims, request, change, "leave.request.approve").await
    }

    pub async fn reject(&self, claims: &Claims, id: i64, reason: Option<String>) -> AppResult<LeaveRequest> {
        let request = self.load_request(id).await?;
        check_transition(claims, &request, LeaveStatus::Rejected)?;
        let reason = clean_optional(reason).unwrap_or_else(|| DEFAULT_REJECT_REASON.to_string());
        validate_required_text(&reason, "reason", MAX_NOTE_LEN)?;

        let change = LeaveStatusChange {
            status: LeaveStatus::Rejected,
            approved_by: Some(claims.user_id),
            approved_at: None,
            reason: Some(reason),
        };
        self.apply_change(claims, request, change, "leave.request.reject").await
    }

    /// Managers stamp themselves as approver; a self-cancel leaves both stamps empty
    pub async fn cancel(&self, claims: &Claims, id: i64) -> AppResult<LeaveRequest> {
        let request = self.load_request(id).await?;
        check_transition(claims, &request, LeaveStatus::Cancelled)?;

        let change = if role_allowed(&claims.role, roles::LEAVE_MANAGERS) {
            LeaveStatusChange {
                status: LeaveStatus::Cancelled,
                approved_by: Some(claims.user_id),
                approved_at: Some(Utc::now()),
                reason: None,
            }
        } else {
            LeaveStatusChange {
                status: LeaveStatus::Cancelled,
                approved_by: None,
                approved_at: None,
                reason: None,
            }
        };
        self.apply_change(claims, request, change, "leave.request.cancel").await
    }

    async fn apply_change(
        &self,
        claims: &Claims,
        request: LeaveRequest,
        change: LeaveStatusChange,
        action: &str,
    ) -> AppResult<LeaveRequest> {
        let updated = self.store.update_leave_status(request.id, &change).await?;
        tracing::info!(
            request_id = updated.id,
            from = %request.status,
            to = %updated.status,
            "Leave request status changed"
        );
        self.audit
            .record(
                AuditEvent::new(action, "leave_request")
                    .actor(claims.user_id)
                    .entity(updated.id)
                    .metadata(json!({
                        "employee_id": updated.employee_id,
                        "from": request.status.as_str(),
                        "to": updated.status.as_str(),
                        "reason": change.reason,
                    })),
            )
            .await;
        Ok(updated)
    }

    /// Every apply rule except authorization; used for self-service and
    /// for absences posted from attendance
    async fn apply_for(
        &self,
        employee_id: i64,
        leave_type_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        reason: Option<String>,
    ) -> AppResult<LeaveRequest> {
        let leave_type = self
            .store
            .find_leave_type(leave_type_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("leave type {leave_type_id}")))?;
        if !leave_type.active {
            return Err(AppError::validation(format!("leave type '{}' is not active", leave_type.name)));
        }
        if start.year() != end.year() {
            return Err(AppError::validation("leave must start and end in the same calendar year"));
        }
        let days = working_days(start, end)?;
        self.require_employee(employee_id).await?;

        self.check_locked_dates(&days).await?;
        self.check_overlap(employee_id, start, end, None).await?;

        let working_days = days.len() as i32;
        if leave_type.counts_toward_entitlement {
            let balance = self.compute_balance(employee_id, start.year()).await?;
            if working_days > balance.available_days {
                return Err(AppError::with_message(
                    ErrorCode::InsufficientBalance,
                    format!(
                        "requested {working_days} working days but only {} are available",
                        balance.available_days
                    ),
                )
                .with_detail("available_days", balance.available_days)
                .with_detail("requested_days", working_days));
            }
        }

        Ok(self
            .store
            .create_leave_request(&NewLeaveRequest {
                employee_id,
                leave_type_id,
                start_date: start,
                end_date: end,
                working_days,
                reason,
            })
            .await?)
    }

    async fn check_locked_dates(&self, days: &[NaiveDate]) -> AppResult<()> {
        let (Some(first), Some(last)) = (days.first(), days.last()) else {
            return Ok(());
        };
        let conflicts: Vec<String> = self
            .store
            .locked_dates_between(*first, *last)
            .await?
            .into_iter()
            .filter(|d| days.contains(d))
            .map(|d| d.to_string())
            .collect();
        if conflicts.is_empty() {
            return Ok(());
        }
        Err(AppError::with_message(
            ErrorCode::LockedDateConflict,
            format!("range includes locked dates: {}", conflicts.join(", ")),
        )
        .with_detail("dates", conflicts))
    }

    async fn check_overlap(
        &self,
        employee_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<i64>,
    ) -> AppResult<()> {
        let overlapping = self
            .store
            .find_overlapping_approved(employee_id, start, end, exclude_id)
            .await?;
        match overlapping.first() {
            None => Ok(()),
            Some(existing) => Err(AppError::with_message(
                ErrorCode::OverlapApproved,
                format!(
                    "overlaps approved leave {} to {}",
                    existing.start_date, existing.end_date
                ),
            )
            .with_detail("request_id", existing.id)),
        }
    }

    async fn record_apply(&self, claims: &Claims, request: &LeaveRequest, source: &str) {
        self.audit
            .record(
                AuditEvent::new("leave.request.apply", "leave_request")
                    .actor(claims.user_id)
                    .entity(request.id)
                    .metadata(json!({
                        "employee_id": request.employee_id,
                        "leave_type_id": request.leave_type_id,
                        "start_date": request.start_date,
                        "end_date": request.end_date,
                        "working_days": request.working_days,
                        "source": source,
                    })),
            )
            .await;
    }

    async fn load_request(&self, id: i64) -> AppResult<LeaveRequest> {
        self.store
            .find_leave_request(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("leave request {id}")))
    }

    async fn require_employee(&self, employee_id: i64) -> AppResult<()> {
        match self.store.find_employee(employee_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(format!("employee {employee_id}"))),
        }
    }
}

#[async_trait]
impl LeaveIntegration for LeaveService {
    /// One-day request on the lowest-id active leave type
    async fn create_single_day_leave_from_attendance(
        &self,
        claims: &Claims,
        employee_id: i64,
        date: NaiveDate,
    ) -> AppResult<i64> {
        let leave_type = self
            .store
            .default_leave_type()
            .await?
            .ok_or_else(|| AppError::validation("no active leave type is configured"))?;
        let request = self
            .apply_for(
                employee_id,
                leave_type.id,
                date,
                date,
                Some(FROM_ATTENDANCE_REASON.to_string()),
            )
            .await?;
        self.record_apply(claims, &request, "attendance").await;
        Ok(request.id)
    }
}

/// Request state machine
///
/// | From | To | Who |
/// |------|----|-----|
/// | Pending | Approved, Rejected | leave managers |
/// | Pending | Cancelled | leave managers, the owner |
/// | Approved | Cancelled | leave managers |
fn check_transition(claims: &Claims, request: &LeaveRequest, to: LeaveStatus) -> AppResult<()> {
    let manager = role_allowed(&claims.role, roles::LEAVE_MANAGERS);
    let owner = request.employee_id == claims.employee_id();
    let allowed = match (request.status, to) {
        (LeaveStatus::Pending, LeaveStatus::Approved | LeaveStatus::Rejected) => manager,
        (LeaveStatus::Pending, LeaveStatus::Cancelled) => manager || owner,
        (LeaveStatus::Approved, LeaveStatus::Cancelled) => manager,
        _ => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(AppError::invalid_transition(request.status, to))
    }
}

fn validate_type(mut input: LeaveTypeInput) -> AppResult<LeaveTypeInput> {
    input.name = input.name.trim().to_string();
    validate_required_text(&input.name, "name", MAX_SHORT_TEXT_LEN)?;
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::services::test_support::{claims, date, seed_employee};

    fn type_input(name: &str, counts: bool) -> LeaveTypeInput {
        LeaveTypeInput {
            name: name.into(),
            paid: true,
            counts_toward_entitlement: counts,
            requires_attachment: false,
            requires_approval: true,
            active: None,
        }
    }

    fn apply_input(type_id: i64, start: &str, end: &str) -> ApplyLeaveInput {
        ApplyLeaveInput {
            leave_type_id: type_id,
            start_date: start.into(),
            end_date: end.into(),
            reason: None,
        }
    }

    struct Fixture {
        svc: LeaveService,
        employee_id: i64,
        type_id: i64,
    }

    async fn fixture(counts: bool) -> Fixture {
        let store = MemoryStore::new();
        let employee_id = seed_employee(&store, "Neema", "Said").await.id;
        let svc = LeaveService::new(Arc::new(store));
        let type_id = svc
            .create_type(&claims(1, "admin"), type_input("Annual", counts))
            .await
            .unwrap()
            .id;
        Fixture {
            svc,
            employee_id,
            type_id,
        }
    }

    #[tokio::test]
    async fn test_apply_counts_working_days() {
        let f = fixture(false).await;
        let me = claims(f.employee_id, "viewer");
        let request = f
            .svc
            .apply(&me, apply_input(f.type_id, "2026-02-20", "2026-02-24"))
            .await
            .unwrap();
        assert_eq!(request.working_days, 3);
        assert_eq!(request.status, LeaveStatus::Pending);
    }

    #[tokio::test]
    async fn test_apply_rejections() {
        let f = fixture(false).await;
        let me = claims(f.employee_id, "viewer");

        let err = f
            .svc
            .apply(&me, apply_input(f.type_id, "2026-12-30", "2027-01-02"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err = f
            .svc
            .apply(&me, apply_input(f.type_id, "2026-02-21", "2026-02-22"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        f.svc
            .set_type_active(&claims(1, "admin"), f.type_id, false)
            .await
            .unwrap();
        let err = f
            .svc
            .apply(&me, apply_input(f.type_id, "2026-02-23", "2026-02-23"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn test_locked_date_only_blocks_working_days() {
        let f = fixture(false).await;
        let hr = claims(100, "hr_officer");
        let me = claims(f.employee_id, "viewer");
        for day in ["2026-02-21", "2026-02-24"] {
            f.svc
                .upsert_locked_date(
                    &hr,
                    LockedDateInput {
                        date: day.into(),
                        reason: Some("audit".into()),
                    },
                )
                .await
                .unwrap();
        }

        // Saturday lock does not affect a Fri..Mon request
        assert!(f
            .svc
            .apply(&me, apply_input(f.type_id, "2026-02-20", "2026-02-23"))
            .await
            .is_ok());
        let err = f
            .svc
            .apply(&me, apply_input(f.type_id, "2026-02-24", "2026-02-25"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::LockedDateConflict);

        f.svc.remove_locked_date(&hr, "2026-02-24").await.unwrap();
        assert_eq!(
            f.svc.remove_locked_date(&hr, "2026-02-24").await.unwrap_err().code,
            ErrorCode::NotFound
        );
        assert_eq!(f.svc.list_locked_dates(&me, 2026).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_overlap_with_approved() {
        let f = fixture(false).await;
        let hr = claims(100, "hr_officer");
        let me = claims(f.employee_id, "viewer");
        let first = f
            .svc
            .apply(&me, apply_input(f.type_id, "2026-03-02", "2026-03-06"))
            .await
            .unwrap();
        f.svc.approve(&hr, first.id).await.unwrap();

        let err = f
            .svc
            .apply(&me, apply_input(f.type_id, "2026-03-06", "2026-03-10"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OverlapApproved);
    }

    #[tokio::test]
    async fn test_approve_rechecks_overlap() {
        let f = fixture(false).await;
        let hr = claims(100, "hr_officer");
        let me = claims(f.employee_id, "viewer");
        let a = f
            .svc
            .apply(&me, apply_input(f.type_id, "2026-03-02", "2026-03-04"))
            .await
            .unwrap();
        let b = f
            .svc
            .apply(&me, apply_input(f.type_id, "2026-03-03", "2026-03-05"))
            .await
            .unwrap();
        f.svc.approve(&hr, a.id).await.unwrap();
        assert_eq!(
            f.svc.approve(&hr, b.id).await.unwrap_err().code,
            ErrorCode::OverlapApproved
        );
    }

    #[tokio::test]
    async fn test_balance_enforced_for_counting_types() {
        let f = fixture(true).await;
        let hr = claims(100, "hr_officer");
        let me = claims(f.employee_id, "viewer");
        f.svc
            .upsert_entitlement(
                &hr,
                EntitlementInput {
                    employee_id: f.employee_id,
                    year: 2026,
                    total_days: 5,
                    reserved_days: 1,
                },
            )
            .await
            .unwrap();

        f.svc
            .apply(&me, apply_input(f.type_id, "2026-03-02", "2026-03-04"))
            .await
            .unwrap();
        let balance = f.svc.balance(&me, f.employee_id, 2026).await.unwrap();
        assert_eq!(balance.pending_days, 3);
        assert_eq!(balance.available_days, 1);

        let err = f
            .svc
            .apply(&me, apply_input(f.type_id, "2026-03-09", "2026-03-10"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientBalance);

        let other = claims(f.employee_id + 1, "viewer");
        assert_eq!(
            f.svc.balance(&other, f.employee_id, 2026).await.unwrap_err().code,
            ErrorCode::Forbidden
        );
    }

    #[tokio::test]
    async fn test_entitlement_validation() {
        let f = fixture(true).await;
        let hr = claims(100, "hr_officer");
        let err = f
            .svc
            .upsert_entitlement(
                &hr,
                EntitlementInput {
                    employee_id: f.employee_id,
                    year: 2026,
                    total_days: 2,
                    reserved_days: 3,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn test_reject_defaults_reason_and_clears_approved_at() {
        let f = fixture(false).await;
        let hr = claims(100, "hr_officer");
        let me = claims(f.employee_id, "viewer");
        let request = f
            .svc
            .apply(&me, apply_input(f.type_id, "2026-03-02", "2026-03-02"))
            .await
            .unwrap();
        let rejected = f.svc.reject(&hr, request.id, Some("  ".into())).await.unwrap();
        assert_eq!(rejected.status, LeaveStatus::Rejected);
        assert_eq!(rejected.reason.as_deref(), Some("Rejected"));
        assert_eq!(rejected.approved_by, Some(100));
        assert!(rejected.approved_at.is_none());

        let err = f.svc.cancel(&hr, request.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[tokio::test]
    async fn test_self_cancel_leaves_stamps_empty() {
        let f = fixture(false).await;
        let me = claims(f.employee_id, "viewer");
        let request = f
            .svc
            .apply(&me, apply_input(f.type_id, "2026-03-02", "2026-03-02"))
            .await
            .unwrap();
        let cancelled = f.svc.cancel(&me, request.id).await.unwrap();
        assert_eq!(cancelled.status, LeaveStatus::Cancelled);
        assert!(cancelled.approved_by.is_none());
        assert!(cancelled.approved_at.is_none());
    }

    #[tokio::test]
    async fn test_listing_scopes() {
        let f = fixture(false).await;
        let me = claims(f.employee_id, "viewer");
        f.svc
            .apply(&me, apply_input(f.type_id, "2026-03-02", "2026-03-02"))
            .await
            .unwrap();
        let mine = f.svc.list_my(&me, LeaveRequestFilter::default()).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].leave_type_name.as_deref(), Some("Annual"));

        assert_eq!(
            f.svc
                .list_all(&me, LeaveRequestFilter::default())
                .await
                .unwrap_err()
                .code,
            ErrorCode::Forbidden
        );
        let all = f
            .svc
            .list_all(
                &claims(100, "hr_officer"),
                LeaveRequestFilter {
                    status: Some(LeaveStatus::Approved),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_single_day_from_attendance() {
        let f = fixture(false).await;
        let hr = claims(100, "hr_officer");
        let id = f
            .svc
            .create_single_day_leave_from_attendance(&hr, f.employee_id, date("2026-02-23"))
            .await
            .unwrap();
        let request = f.svc.load_request(id).await.unwrap();
        assert_eq!(request.employee_id, f.employee_id);
        assert_eq!(request.working_days, 1);
        assert_eq!(request.status, LeaveStatus::Pending);

        // weekend absences have no working day to book
        assert!(f
            .svc
            .create_single_day_leave_from_attendance(&hr, f.employee_id, date("2026-02-21"))
            .await
            .is_err());
    }
}
