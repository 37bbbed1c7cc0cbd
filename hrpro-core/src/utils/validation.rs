//! Input validation helpers
//!
//! Text length limits and the field checks shared by the CRUD services.

use std::sync::LazyLock;

use regex::Regex;
use shared::error::{AppError, AppResult};
use validator::ValidateEmail;

// ── Text length limits ──────────────────────────────────────────────

/// Names: people, departments, leave types, usernames
pub const MAX_NAME_LEN: usize = 200;

/// Reasons, descriptions, lock reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: national id, position, employment status
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Minimum password length accepted by user administration
pub const MIN_PASSWORD_LEN: usize = 8;

/// Passwords (before hashing; bcrypt reads at most 72 bytes)
pub const MAX_PASSWORD_LEN: usize = 128;

/// URLs
pub const MAX_URL_LEN: usize = 2048;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9+()\-\s]{7,20}$").unwrap_or_else(|e| panic!("phone pattern: {e}"))
});

static CURRENCY_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9]{2,8}$").unwrap_or_else(|e| panic!("currency pattern: {e}"))
});

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")).with_detail("field", field));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(value: &Option<String>, field: &str, max_len: usize) -> AppResult<()> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> AppResult<()> {
    if email.len() > MAX_EMAIL_LEN || !email.validate_email() {
        return Err(AppError::validation("email is not a valid address").with_detail("field", "email"));
    }
    Ok(())
}

/// Free-form phone as typed: digits, spaces, `+ ( ) -`, 7 to 20 chars
pub fn validate_phone(phone: &str) -> AppResult<()> {
    if !PHONE_RE.is_match(phone) {
        return Err(AppError::validation("phone has invalid characters or length")
            .with_detail("field", "phone"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password is too long (max {MAX_PASSWORD_LEN})"
        )));
    }
    Ok(())
}

pub fn validate_currency_code(code: &str) -> AppResult<()> {
    if !CURRENCY_CODE_RE.is_match(code) {
        return Err(AppError::validation(
            "currency code must be 2-8 uppercase letters or digits",
        ));
    }
    Ok(())
}

/// Display decimals for currency and payroll amounts
pub fn validate_decimals(field: &str, decimals: u8) -> AppResult<()> {
    if decimals > 6 {
        return Err(AppError::validation(format!("{field} must be between 0 and 6")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Ops", "name", MAX_NAME_LEN).is_ok());
        assert!(validate_required_text("   ", "name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text(&"x".repeat(201), "name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("amina@example.org").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@").is_err());
    }

    #[test]
    fn test_phone() {
        assert!(validate_phone("+255 (712) 345-678").is_ok());
        assert!(validate_phone("0712345678").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("0712abc678").is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("1234567").is_err());
    }

    #[test]
    fn test_currency_code() {
        assert!(validate_currency_code("TZS").is_ok());
        assert!(validate_currency_code("USD1").is_ok());
        assert!(validate_currency_code("tzs").is_err());
        assert!(validate_currency_code("T").is_err());
    }
}
