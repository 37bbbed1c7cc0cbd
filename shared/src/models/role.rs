//! Role Model
//!
//! Authorization is capability-by-role. Every check goes through
//! [`normalize_role`] so that display strings ("HR Officer"), persisted
//! strings ("hr_officer") and legacy inputs compare equal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowercase, trim and join whitespace-separated words with `_`.
///
/// Idempotent: `normalize_role(&normalize_role(x)) == normalize_role(x)`.
pub fn normalize_role(raw: &str) -> String {
    raw.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Recognized roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    MasterAdmin,
    HrOfficer,
    FinanceOfficer,
    Viewer,
    /// Recognized at read time only; never persisted by user administration
    Staff,
}

impl Role {
    /// Parse any spelling of a role ("HR Officer", "hr_officer", "Hr officer")
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_role(raw).as_str() {
            "admin" => Some(Self::Admin),
            "master_admin" => Some(Self::MasterAdmin),
            "hr_officer" => Some(Self::HrOfficer),
            "finance_officer" => Some(Self::FinanceOfficer),
            "viewer" => Some(Self::Viewer),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::MasterAdmin => "master_admin",
            Self::HrOfficer => "hr_officer",
            Self::FinanceOfficer => "finance_officer",
            Self::Viewer => "viewer",
            Self::Staff => "staff",
        }
    }

    /// Admin-class roles pass every role gate
    pub fn is_admin_class(&self) -> bool {
        matches!(self, Self::Admin | Self::MasterAdmin)
    }

    /// Roles that user administration may write to the users table
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            Self::Admin | Self::HrOfficer | Self::FinanceOfficer | Self::Viewer
        )
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `raw` names one of `allowed`; admin-class roles always pass.
pub fn role_allowed(raw: &str, allowed: &[Role]) -> bool {
    match Role::parse(raw) {
        Some(role) => role.is_admin_class() || allowed.contains(&role),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_variants_collapse() {
        assert_eq!(normalize_role("HR Officer"), "hr_officer");
        assert_eq!(normalize_role("hr_officer"), "hr_officer");
        assert_eq!(normalize_role("Hr officer"), "hr_officer");
        assert_eq!(normalize_role("  finance   Officer "), "finance_officer");
        assert_eq!(normalize_role("Admin"), "admin");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["HR Officer", "  Master Admin", "viewer", "FINANCE_OFFICER", ""] {
            let once = normalize_role(raw);
            assert_eq!(normalize_role(&once), once);
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(Role::parse("HR Officer"), Some(Role::HrOfficer));
        assert_eq!(Role::parse("master admin"), Some(Role::MasterAdmin));
        assert_eq!(Role::parse("Staff"), Some(Role::Staff));
        assert_eq!(Role::parse("cashier"), None);
    }

    #[test]
    fn test_role_allowed() {
        assert!(role_allowed("Admin", &[]));
        assert!(role_allowed("master_admin", &[Role::HrOfficer]));
        assert!(role_allowed("HR Officer", &[Role::HrOfficer]));
        assert!(!role_allowed("viewer", &[Role::HrOfficer]));
        assert!(!role_allowed("unknown", &[Role::Viewer]));
    }

    #[test]
    fn test_assignable() {
        assert!(Role::Viewer.is_assignable());
        assert!(!Role::Staff.is_assignable());
        assert!(!Role::MasterAdmin.is_assignable());
    }
}
