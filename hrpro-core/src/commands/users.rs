use shared::models::{PageRequest, PaginatedResponse, User, UserCreate, UserUpdate};

use super::{CommandResult, authorized};
use crate::core::AppState;

pub async fn list(
    state: &AppState,
    token: &str,
    q: Option<String>,
    page: PageRequest,
) -> CommandResult<PaginatedResponse<User>> {
    authorized(state, token, |claims| async move { state.users.list(&claims, q, page).await }).await
}

pub async fn get(state: &AppState, token: &str, id: i64) -> CommandResult<User> {
    authorized(state, token, |claims| async move { state.users.get(&claims, id).await }).await
}

pub async fn create(state: &AppState, token: &str, input: UserCreate) -> CommandResult<User> {
    authorized(state, token, |claims| async move { state.users.create(&claims, input).await }).await
}

pub async fn update(state: &AppState, token: &str, id: i64, changes: UserUpdate) -> CommandResult<User> {
    authorized(state, token, |claims| async move { state.users.update(&claims, id, changes).await }).await
}

pub async fn reset_password(state: &AppState, token: &str, id: i64, password: String) -> CommandResult<()> {
    authorized(state, token, |claims| async move {
        state.users.reset_password(&claims, id, &password).await
    })
    .await
}

pub async fn set_active(state: &AppState, token: &str, id: i64, is_active: bool) -> CommandResult<User> {
    authorized(state, token, |claims| async move {
        state.users.set_active(&claims, id, is_active).await
    })
    .await
}
