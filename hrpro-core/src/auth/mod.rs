//! Authentication and authorization
//!
//! - [`JwtService`] - signs and validates access tokens
//! - [`AuthService`] - login, refresh, logout, me, initial admin seed
//! - [`require_role`] - role gate used by every service

pub mod jwt;
pub mod password;
pub mod service;

pub use jwt::{Claims, JwtService};
pub use service::AuthService;

use shared::error::{AppError, AppResult};
use shared::models::{Role, role_allowed};

/// Fail with `forbidden` unless the caller holds one of `allowed`
/// (admin-class roles always pass)
pub fn require_role(claims: &Claims, allowed: &[Role]) -> AppResult<()> {
    if role_allowed(&claims.role, allowed) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "role '{}' may not perform this operation",
            claims.role
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn test_require_role() {
        let hr = Claims::for_user(3, "amina", "HR Officer");
        assert!(require_role(&hr, &[Role::HrOfficer]).is_ok());
        assert_eq!(
            require_role(&hr, &[Role::FinanceOfficer]).unwrap_err().code,
            ErrorCode::Forbidden
        );

        let admin = Claims::for_user(1, "root", "Admin");
        assert!(require_role(&admin, &[]).is_ok());
    }
}
