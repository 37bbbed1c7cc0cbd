//! Shell-facing commands
//!
//! Every command takes the raw access token (except login/refresh/logout),
//! validates it, runs the service call with the caller as the audit actor
//! and under the operation deadline, then converts the error into a
//! [`CommandError`].
//!
//! ```text
//! shell ──► command(state, token, args)
//!              │ validate token ─► Claims
//!              │ with_actor(user_id)
//!              │ timeout(operation_timeout)
//!              ▼
//!           service.op(&claims, args) ─► AppResult<T> ─► CommandResult<T>
//! ```

pub mod attendance;
pub mod audit;
pub mod auth;
pub mod dashboard;
pub mod departments;
pub mod employees;
pub mod leave;
pub mod payroll;
pub mod reports;
pub mod settings;
pub mod users;

use std::future::Future;

use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use thiserror::Error;

use crate::audit::with_actor;
use crate::auth::Claims;
use crate::core::AppState;

/// Error returned to the shell
///
/// `kind` keeps the engine's error kind for equality checks; `message`
/// carries the `"<kind> error: ..."` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct CommandError {
    pub code: ErrorCode,
    pub kind: String,
    pub message: String,
}

impl From<AppError> for CommandError {
    fn from(err: AppError) -> Self {
        match err.code {
            // never reveal which half of a login was wrong
            ErrorCode::InvalidCredentials | ErrorCode::InactiveUser => Self {
                code: ErrorCode::InvalidCredentials,
                kind: ErrorCode::InvalidCredentials.kind().to_string(),
                message: "authentication failed".to_string(),
            },
            code => Self {
                code,
                kind: code.kind().to_string(),
                message: format!("{} error: {}", code.kind().replace('_', " "), err.message),
            },
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Run an authenticated command
pub async fn authorized<T, F, Fut>(state: &AppState, token: &str, op: F) -> CommandResult<T>
where
    F: FnOnce(Claims) -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let claims = state.auth.validate_access_token(token)?;
    let actor = claims.user_id;
    with_actor(Some(actor), deadline(state, op(claims))).await
}

/// Run a command that needs no access token
pub async fn public<T, Fut>(state: &AppState, fut: Fut) -> CommandResult<T>
where
    Fut: Future<Output = AppResult<T>>,
{
    deadline(state, fut).await
}

async fn deadline<T, Fut>(state: &AppState, fut: Fut) -> CommandResult<T>
where
    Fut: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(state.operation_timeout, fut).await {
        Ok(result) => result.map_err(CommandError::from),
        Err(_) => {
            tracing::warn!(timeout_ms = state.operation_timeout.as_millis() as u64, "Command timed out");
            Err(AppError::new(ErrorCode::TimeoutError).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_keeps_kind() {
        let err: CommandError = AppError::validation("end date must not be before start date").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.kind, "validation");
        assert_eq!(err.message, "validation error: end date must not be before start date");

        let err: CommandError = AppError::new(ErrorCode::LockedDateConflict).into();
        assert_eq!(err.kind, "locked_date_conflict");
        assert!(err.message.starts_with("locked date conflict error: "));
    }

    #[test]
    fn test_login_failures_collapse() {
        let bad_password: CommandError = AppError::invalid_credentials().into();
        let inactive: CommandError = AppError::new(ErrorCode::InactiveUser).into();
        assert_eq!(bad_password, inactive);
        assert_eq!(inactive.message, "authentication failed");
    }
}
