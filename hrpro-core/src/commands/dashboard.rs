use shared::models::DashboardSummary;

use super::{CommandResult, authorized};
use crate::core::AppState;

pub async fn summary(state: &AppState, token: &str) -> CommandResult<DashboardSummary> {
    authorized(state, token, |claims| async move { state.dashboard.summary(&claims).await }).await
}
