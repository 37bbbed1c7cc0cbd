use shared::models::{EntryAmountsInput, ExportFile, PayrollBatch, PayrollBatchDetail, PayrollEntry};

use super::{CommandResult, authorized};
use crate::core::AppState;

pub async fn list(state: &AppState, token: &str) -> CommandResult<Vec<PayrollBatch>> {
    authorized(state, token, |claims| async move { state.payroll.list(&claims).await }).await
}

pub async fn create(state: &AppState, token: &str, month: String) -> CommandResult<PayrollBatch> {
    authorized(state, token, |claims| async move { state.payroll.create(&claims, &month).await }).await
}

pub async fn get(state: &AppState, token: &str, id: i64) -> CommandResult<PayrollBatchDetail> {
    authorized(state, token, |claims| async move { state.payroll.get(&claims, id).await }).await
}

pub async fn generate(state: &AppState, token: &str, id: i64) -> CommandResult<PayrollBatchDetail> {
    authorized(state, token, |claims| async move { state.payroll.generate(&claims, id).await }).await
}

pub async fn update_entry(
    state: &AppState,
    token: &str,
    entry_id: i64,
    input: EntryAmountsInput,
) -> CommandResult<PayrollEntry> {
    authorized(state, token, |claims| async move {
        state.payroll.update_entry(&claims, entry_id, input).await
    })
    .await
}

pub async fn approve(state: &AppState, token: &str, id: i64) -> CommandResult<PayrollBatch> {
    authorized(state, token, |claims| async move { state.payroll.approve(&claims, id).await }).await
}

pub async fn lock(state: &AppState, token: &str, id: i64) -> CommandResult<PayrollBatch> {
    authorized(state, token, |claims| async move { state.payroll.lock(&claims, id).await }).await
}

pub async fn export_csv(state: &AppState, token: &str, id: i64) -> CommandResult<ExportFile> {
    authorized(state, token, |claims| async move { state.payroll.export_csv(&claims, id).await }).await
}
