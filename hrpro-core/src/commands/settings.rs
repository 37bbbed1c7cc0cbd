use shared::models::{AppSettings, CompanyProfile, SettingsUpdate, StoredFile};

use super::{CommandResult, authorized};
use crate::core::AppState;

pub async fn get(state: &AppState, token: &str) -> CommandResult<AppSettings> {
    authorized(state, token, |claims| async move { state.settings.get(&claims).await }).await
}

pub async fn update(state: &AppState, token: &str, update: SettingsUpdate) -> CommandResult<AppSettings> {
    authorized(state, token, |claims| async move { state.settings.update(&claims, update).await }).await
}

pub async fn upload_logo(
    state: &AppState,
    token: &str,
    filename: String,
    bytes: Vec<u8>,
) -> CommandResult<CompanyProfile> {
    authorized(state, token, |claims| async move {
        state.settings.upload_logo(&claims, &filename, &bytes).await
    })
    .await
}

pub async fn read_logo(state: &AppState, token: &str) -> CommandResult<StoredFile> {
    authorized(state, token, |claims| async move { state.settings.read_logo(&claims).await }).await
}

pub async fn remove_logo(state: &AppState, token: &str) -> CommandResult<CompanyProfile> {
    authorized(state, token, |claims| async move { state.settings.remove_logo(&claims).await }).await
}
