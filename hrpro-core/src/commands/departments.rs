use shared::models::{Department, DepartmentInput, DepartmentQuery, PaginatedResponse};

use super::{CommandResult, authorized};
use crate::core::AppState;

pub async fn list(
    state: &AppState,
    token: &str,
    query: DepartmentQuery,
) -> CommandResult<PaginatedResponse<Department>> {
    authorized(state, token, |claims| async move { state.departments.list(&claims, query).await }).await
}

pub async fn get(state: &AppState, token: &str, id: i64) -> CommandResult<Department> {
    authorized(state, token, |claims| async move { state.departments.get(&claims, id).await }).await
}

pub async fn create(state: &AppState, token: &str, input: DepartmentInput) -> CommandResult<Department> {
    authorized(state, token, |claims| async move { state.departments.create(&claims, input).await }).await
}

pub async fn update(state: &AppState, token: &str, id: i64, input: DepartmentInput) -> CommandResult<Department> {
    authorized(state, token, |claims| async move {
        state.departments.update(&claims, id, input).await
    })
    .await
}

pub async fn delete(state: &AppState, token: &str, id: i64) -> CommandResult<()> {
    authorized(state, token, |claims| async move { state.departments.delete(&claims, id).await }).await
}
