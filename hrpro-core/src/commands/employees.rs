use shared::models::{Employee, EmployeeInput, EmployeeQuery, PaginatedResponse, StoredFile};

use super::{CommandResult, authorized};
use crate::core::AppState;

pub async fn list(state: &AppState, token: &str, query: EmployeeQuery) -> CommandResult<PaginatedResponse<Employee>> {
    authorized(state, token, |claims| async move { state.employees.list(&claims, query).await }).await
}

pub async fn get(state: &AppState, token: &str, id: i64) -> CommandResult<Employee> {
    authorized(state, token, |claims| async move { state.employees.get(&claims, id).await }).await
}

pub async fn create(state: &AppState, token: &str, input: EmployeeInput) -> CommandResult<Employee> {
    authorized(state, token, |claims| async move { state.employees.create(&claims, input).await }).await
}

pub async fn update(state: &AppState, token: &str, id: i64, input: EmployeeInput) -> CommandResult<Employee> {
    authorized(state, token, |claims| async move { state.employees.update(&claims, id, input).await }).await
}

pub async fn delete(state: &AppState, token: &str, id: i64) -> CommandResult<()> {
    authorized(state, token, |claims| async move { state.employees.delete(&claims, id).await }).await
}

pub async fn upload_contract(
    state: &AppState,
    token: &str,
    id: i64,
    filename: String,
    bytes: Vec<u8>,
) -> CommandResult<Employee> {
    authorized(state, token, |claims| async move {
        state.employees.upload_contract(&claims, id, &filename, &bytes).await
    })
    .await
}

pub async fn read_contract(state: &AppState, token: &str, id: i64) -> CommandResult<StoredFile> {
    authorized(state, token, |claims| async move { state.employees.read_contract(&claims, id).await }).await
}

pub async fn remove_contract(state: &AppState, token: &str, id: i64) -> CommandResult<Employee> {
    authorized(state, token, |claims| async move { state.employees.remove_contract(&claims, id).await }).await
}
