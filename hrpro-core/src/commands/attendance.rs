use shared::models::{
    AttendanceDayRow, AttendanceRangeQuery, AttendanceRecord, LunchSummary, LunchVisitorsInput,
    PostAbsentToLeaveResult, UpsertAttendanceInput,
};

use super::{CommandResult, authorized};
use crate::core::AppState;

pub async fn list_by_date(state: &AppState, token: &str, date: String) -> CommandResult<Vec<AttendanceDayRow>> {
    authorized(state, token, |claims| async move {
        state.attendance.list_by_date(&claims, &date).await
    })
    .await
}

pub async fn upsert(state: &AppState, token: &str, input: UpsertAttendanceInput) -> CommandResult<AttendanceRecord> {
    authorized(state, token, |claims| async move { state.attendance.upsert(&claims, input).await }).await
}

pub async fn my_range(
    state: &AppState,
    token: &str,
    query: AttendanceRangeQuery,
) -> CommandResult<Vec<AttendanceRecord>> {
    authorized(state, token, |claims| async move { state.attendance.my_range(&claims, query).await }).await
}

pub async fn lunch_summary(state: &AppState, token: &str, date: String) -> CommandResult<LunchSummary> {
    authorized(state, token, |claims| async move {
        state.attendance.lunch_summary(&claims, &date).await
    })
    .await
}

pub async fn upsert_lunch_visitors(
    state: &AppState,
    token: &str,
    input: LunchVisitorsInput,
) -> CommandResult<LunchSummary> {
    authorized(state, token, |claims| async move {
        state.attendance.upsert_lunch_visitors(&claims, input).await
    })
    .await
}

pub async fn post_absent_to_leave(
    state: &AppState,
    token: &str,
    date: String,
    employee_id: i64,
) -> CommandResult<PostAbsentToLeaveResult> {
    authorized(state, token, |claims| async move {
        state.attendance.post_absent_to_leave(&claims, &date, employee_id).await
    })
    .await
}
