use shared::models::{
    ApplyLeaveInput, EntitlementInput, LeaveBalance, LeaveEntitlement, LeaveLockedDate,
    LeaveRequest, LeaveRequestFilter, LeaveType, LeaveTypeInput, LockedDateInput,
};

use super::{CommandResult, authorized};
use crate::core::AppState;

// ── Types ───────────────────────────────────────────────────────────

pub async fn list_types(state: &AppState, token: &str, include_inactive: bool) -> CommandResult<Vec<LeaveType>> {
    authorized(state, token, |claims| async move {
        state.leave.list_types(&claims, include_inactive).await
    })
    .await
}

pub async fn create_type(state: &AppState, token: &str, input: LeaveTypeInput) -> CommandResult<LeaveType> {
    authorized(state, token, |claims| async move { state.leave.create_type(&claims, input).await }).await
}

pub async fn update_type(state: &AppState, token: &str, id: i64, input: LeaveTypeInput) -> CommandResult<LeaveType> {
    authorized(state, token, |claims| async move { state.leave.update_type(&claims, id, input).await }).await
}

pub async fn set_type_active(state: &AppState, token: &str, id: i64, active: bool) -> CommandResult<LeaveType> {
    authorized(state, token, |claims| async move {
        state.leave.set_type_active(&claims, id, active).await
    })
    .await
}

// ── Locked dates ────────────────────────────────────────────────────

pub async fn list_locked_dates(state: &AppState, token: &str, year: i32) -> CommandResult<Vec<LeaveLockedDate>> {
    authorized(state, token, |claims| async move {
        state.leave.list_locked_dates(&claims, year).await
    })
    .await
}

pub async fn upsert_locked_date(
    state: &AppState,
    token: &str,
    input: LockedDateInput,
) -> CommandResult<LeaveLockedDate> {
    authorized(state, token, |claims| async move {
        state.leave.upsert_locked_date(&claims, input).await
    })
    .await
}

pub async fn remove_locked_date(state: &AppState, token: &str, date: String) -> CommandResult<()> {
    authorized(state, token, |claims| async move {
        state.leave.remove_locked_date(&claims, &date).await
    })
    .await
}

// ── Entitlements ────────────────────────────────────────────────────

pub async fn upsert_entitlement(
    state: &AppState,
    token: &str,
    input: EntitlementInput,
) -> CommandResult<LeaveEntitlement> {
    authorized(state, token, |claims| async move {
        state.leave.upsert_entitlement(&claims, input).await
    })
    .await
}

pub async fn balance(state: &AppState, token: &str, employee_id: i64, year: i32) -> CommandResult<LeaveBalance> {
    authorized(state, token, |claims| async move {
        state.leave.balance(&claims, employee_id, year).await
    })
    .await
}

// ── Requests ────────────────────────────────────────────────────────

pub async fn apply(state: &AppState, token: &str, input: ApplyLeaveInput) -> CommandResult<LeaveRequest> {
    authorized(state, token, |claims| async move { state.leave.apply(&claims, input).await }).await
}

pub async fn list_my(state: &AppState, token: &str, filter: LeaveRequestFilter) -> CommandResult<Vec<LeaveRequest>> {
    authorized(state, token, |claims| async move { state.leave.list_my(&claims, filter).await }).await
}

pub async fn list_all(state: &AppState, token: &str, filter: LeaveRequestFilter) -> CommandResult<Vec<LeaveRequest>> {
    authorized(state, token, |claims| async move { state.leave.list_all(&claims, filter).await }).await
}

pub async fn approve(state: &AppState, token: &str, id: i64) -> CommandResult<LeaveRequest> {
    authorized(state, token, |claims| async move { state.leave.approve(&claims, id).await }).await
}

pub async fn reject(state: &AppState, token: &str, id: i64, reason: Option<String>) -> CommandResult<LeaveRequest> {
    authorized(state, token, |claims| async move { state.leave.reject(&claims, id, reason).await }).await
}

pub async fn cancel(state: &AppState, token: &str, id: i64) -> CommandResult<LeaveRequest> {
    authorized(state, token, |claims| async move { state.leave.cancel(&claims, id).await }).await
}
