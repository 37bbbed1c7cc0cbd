use shared::models::{LoginResponse, UserSummary};

use super::{CommandResult, public};
use crate::core::AppState;

pub async fn login(state: &AppState, username: &str, password: &str) -> CommandResult<LoginResponse> {
    public(state, state.auth.login(username, password)).await
}

/// Rotates the refresh token
pub async fn refresh(state: &AppState, refresh_token: &str) -> CommandResult<LoginResponse> {
    public(state, state.auth.refresh(refresh_token)).await
}

pub async fn logout(state: &AppState, refresh_token: &str) -> CommandResult<()> {
    public(state, state.auth.logout(refresh_token)).await
}

/// Role and active flag as currently stored, not as minted in the token
pub async fn me(state: &AppState, token: &str) -> CommandResult<UserSummary> {
    public(state, state.auth.me(token)).await
}
