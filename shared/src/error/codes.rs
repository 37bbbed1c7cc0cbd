//! Unified error codes for the HR backend
//!
//! This module defines all error codes used across the core engines, the
//! command layer and the desktop shell. Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Attendance errors
//! - 4xxx: Leave errors
//! - 5xxx: Payroll errors
//! - 6xxx: Organization errors (employees, departments, files)
//! - 7xxx: User administration errors
//! - 8xxx: Report errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility with the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// State machine transition not allowed
    InvalidTransition = 9,

    // ==================== 1xxx: Auth ====================
    /// No access token was supplied
    AccessTokenMissing = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Access token has expired
    AccessTokenExpired = 1003,
    /// Access token is invalid
    AccessTokenInvalid = 1004,
    /// User account is deactivated
    InactiveUser = 1007,

    // ==================== 2xxx: Permission ====================
    /// Claims present but role insufficient, or claims missing
    Forbidden = 2001,

    // ==================== 3xxx: Attendance ====================
    /// Attendance record is locked
    AttendanceLocked = 3001,
    /// Attendance record is not marked absent
    NotAbsent = 3002,
    /// Leave side of post-absent-to-leave failed
    LeaveIntegration = 3003,

    // ==================== 4xxx: Leave ====================
    /// Requested range includes a locked date
    LockedDateConflict = 4001,
    /// Requested range overlaps an approved request
    OverlapApproved = 4002,
    /// Not enough leave balance
    InsufficientBalance = 4003,

    // ==================== 5xxx: Payroll ====================
    /// A batch already exists for the month
    DuplicateMonth = 5001,
    /// Batch is no longer a draft
    ImmutableBatch = 5002,
    /// Batch cannot be exported in its current status
    ExportNotAllowed = 5003,

    // ==================== 6xxx: Organization ====================
    /// Name already taken
    DuplicateName = 6001,
    /// Department still referenced by employees
    DepartmentHasEmployees = 6002,
    /// Phone number cannot be normalized
    InvalidPhone = 6003,
    /// Uploaded file exceeds the size limit
    FileTooLarge = 6501,
    /// File extension not accepted
    UnsupportedFileFormat = 6502,
    /// Uploaded file has no content
    EmptyFile = 6505,

    // ==================== 7xxx: Users ====================
    /// Username already taken
    DuplicateUsername = 7001,
    /// Admin tried to deactivate their own account
    CannotDeactivateSelf = 7002,
    /// Admin tried to drop their own admin role
    CannotRemoveOwnAdmin = 7003,

    // ==================== 8xxx: Reports ====================
    /// Export would exceed the row cap
    ExportLimitExceeded = 8001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// File storage failed
    StorageError = 9401,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Stable snake_case kind name, shared with the shell for equality checks
    pub const fn kind(&self) -> &'static str {
        match self {
            ErrorCode::Success => "success",
            ErrorCode::Unknown => "unknown",
            ErrorCode::ValidationFailed => "validation",
            ErrorCode::NotFound => "not_found",
            ErrorCode::AlreadyExists => "already_exists",
            ErrorCode::InvalidTransition => "invalid_transition",

            ErrorCode::AccessTokenMissing => "access_token_missing",
            ErrorCode::InvalidCredentials => "invalid_credentials",
            ErrorCode::AccessTokenExpired => "access_token_expired",
            ErrorCode::AccessTokenInvalid => "access_token_invalid",
            ErrorCode::InactiveUser => "inactive_user",

            ErrorCode::Forbidden => "forbidden",

            ErrorCode::AttendanceLocked => "locked",
            ErrorCode::NotAbsent => "not_absent",
            ErrorCode::LeaveIntegration => "leave_integration",

            ErrorCode::LockedDateConflict => "locked_date_conflict",
            ErrorCode::OverlapApproved => "overlap_approved",
            ErrorCode::InsufficientBalance => "insufficient_balance",

            ErrorCode::DuplicateMonth => "duplicate_month",
            ErrorCode::ImmutableBatch => "immutable_batch",
            ErrorCode::ExportNotAllowed => "export_not_allowed",

            ErrorCode::DuplicateName => "duplicate_name",
            ErrorCode::DepartmentHasEmployees => "department_has_employees",
            ErrorCode::InvalidPhone => "invalid_phone",
            ErrorCode::FileTooLarge => "file_too_large",
            ErrorCode::UnsupportedFileFormat => "unsupported_file_format",
            ErrorCode::EmptyFile => "empty_file",

            ErrorCode::DuplicateUsername => "duplicate_username",
            ErrorCode::CannotDeactivateSelf => "cannot_deactivate_self",
            ErrorCode::CannotRemoveOwnAdmin => "cannot_remove_own_admin",

            ErrorCode::ExportLimitExceeded => "export_limit_exceeded",

            ErrorCode::InternalError => "internal",
            ErrorCode::DatabaseError => "database",
            ErrorCode::TimeoutError => "timeout",
            ErrorCode::ConfigError => "config",
            ErrorCode::StorageError => "storage",
        }
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidTransition => "Status transition is not allowed",

            // Auth
            ErrorCode::AccessTokenMissing => "Access token is missing",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::AccessTokenExpired => "Access token has expired",
            ErrorCode::AccessTokenInvalid => "Access token is invalid",
            ErrorCode::InactiveUser => "User account is inactive",

            // Permission
            ErrorCode::Forbidden => "Permission denied",

            // Attendance
            ErrorCode::AttendanceLocked => "Attendance record is locked",
            ErrorCode::NotAbsent => "Attendance record is not marked absent",
            ErrorCode::LeaveIntegration => "Failed to create leave from attendance",

            // Leave
            ErrorCode::LockedDateConflict => "Requested dates include a locked date",
            ErrorCode::OverlapApproved => "Requested dates overlap an approved leave",
            ErrorCode::InsufficientBalance => "Insufficient leave balance",

            // Payroll
            ErrorCode::DuplicateMonth => "A payroll batch already exists for this month",
            ErrorCode::ImmutableBatch => "Payroll batch is not in draft",
            ErrorCode::ExportNotAllowed => "Payroll batch must be approved or locked to export",

            // Organization
            ErrorCode::DuplicateName => "Name already exists",
            ErrorCode::DepartmentHasEmployees => "Department still has employees",
            ErrorCode::InvalidPhone => "Phone number is invalid",
            ErrorCode::FileTooLarge => "File is too large",
            ErrorCode::UnsupportedFileFormat => "Unsupported file format",
            ErrorCode::EmptyFile => "File is empty",

            // Users
            ErrorCode::DuplicateUsername => "Username already exists",
            ErrorCode::CannotDeactivateSelf => "You cannot deactivate your own account",
            ErrorCode::CannotRemoveOwnAdmin => "You cannot remove your own admin role",

            // Reports
            ErrorCode::ExportLimitExceeded => "Export exceeds the maximum number of rows",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::StorageError => "File storage error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            9 => Ok(ErrorCode::InvalidTransition),

            // Auth
            1001 => Ok(ErrorCode::AccessTokenMissing),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::AccessTokenExpired),
            1004 => Ok(ErrorCode::AccessTokenInvalid),
            1007 => Ok(ErrorCode::InactiveUser),

            // Permission
            2001 => Ok(ErrorCode::Forbidden),

            // Attendance
            3001 => Ok(ErrorCode::AttendanceLocked),
            3002 => Ok(ErrorCode::NotAbsent),
            3003 => Ok(ErrorCode::LeaveIntegration),

            // Leave
            4001 => Ok(ErrorCode::LockedDateConflict),
            4002 => Ok(ErrorCode::OverlapApproved),
            4003 => Ok(ErrorCode::InsufficientBalance),

            // Payroll
            5001 => Ok(ErrorCode::DuplicateMonth),
            5002 => Ok(ErrorCode::ImmutableBatch),
            5003 => Ok(ErrorCode::ExportNotAllowed),

            // Organization
            6001 => Ok(ErrorCode::DuplicateName),
            6002 => Ok(ErrorCode::DepartmentHasEmployees),
            6003 => Ok(ErrorCode::InvalidPhone),
            6501 => Ok(ErrorCode::FileTooLarge),
            6502 => Ok(ErrorCode::UnsupportedFileFormat),
            6505 => Ok(ErrorCode::EmptyFile),

            // Users
            7001 => Ok(ErrorCode::DuplicateUsername),
            7002 => Ok(ErrorCode::CannotDeactivateSelf),
            7003 => Ok(ErrorCode::CannotRemoveOwnAdmin),

            // Reports
            8001 => Ok(ErrorCode::ExportLimitExceeded),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9401 => Ok(ErrorCode::StorageError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::AccessTokenExpired.code(), 1003);
        assert_eq!(ErrorCode::LockedDateConflict.code(), 4001);
        assert_eq!(ErrorCode::ImmutableBatch.code(), 5002);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_matches_code() {
        let all = [
            ErrorCode::Success,
            ErrorCode::InvalidTransition,
            ErrorCode::InactiveUser,
            ErrorCode::Forbidden,
            ErrorCode::LeaveIntegration,
            ErrorCode::InsufficientBalance,
            ErrorCode::ExportNotAllowed,
            ErrorCode::EmptyFile,
            ErrorCode::CannotRemoveOwnAdmin,
            ErrorCode::ExportLimitExceeded,
            ErrorCode::StorageError,
        ];
        for code in all {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorCode::ValidationFailed.kind(), "validation");
        assert_eq!(ErrorCode::AttendanceLocked.kind(), "locked");
        assert_eq!(ErrorCode::OverlapApproved.kind(), "overlap_approved");
        assert_eq!(ErrorCode::DuplicateMonth.kind(), "duplicate_month");
        assert_eq!(
            ErrorCode::DepartmentHasEmployees.kind(),
            "department_has_employees"
        );
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::NotAbsent).unwrap();
        assert_eq!(json, "3002");
        let code: ErrorCode = serde_json::from_str("5003").unwrap();
        assert_eq!(code, ErrorCode::ExportNotAllowed);
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::NotFound.to_string(), "E0003");
        assert_eq!(ErrorCode::Forbidden.to_string(), "E2001");
    }
}
