use shared::models::{AuditLog, AuditQuery, PaginatedResponse};

use super::{CommandResult, authorized};
use crate::core::AppState;

pub async fn list(state: &AppState, token: &str, query: AuditQuery) -> CommandResult<PaginatedResponse<AuditLog>> {
    authorized(state, token, |claims| async move { state.audit_log.list(&claims, query).await }).await
}
