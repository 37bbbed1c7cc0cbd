//! Phone normalization to E.164

use shared::error::{AppError, AppResult, ErrorCode};

/// Country code applied to national numbers with a leading `0`
pub const DEFAULT_COUNTRY_CODE: &str = "255";

/// Normalize a free-form phone to `+<digits>` (8 to 15 digits)
///
/// Formatting characters are dropped. A leading `00` becomes `+`; a single
/// leading `0` is replaced by `default_country_code`; bare digits are taken
/// as already international.
pub fn normalize_phone(raw: &str, default_country_code: &str) -> AppResult<String> {
    let trimmed = raw.trim();
    let has_plus = trimmed.starts_with('+');
    if trimmed.chars().skip(usize::from(has_plus)).any(|c| {
        !(c.is_ascii_digit() || c.is_whitespace() || matches!(c, '(' | ')' | '-' | '.'))
    }) {
        return Err(invalid_phone(raw));
    }

    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    let international = if has_plus {
        digits
    } else if let Some(rest) = digits.strip_prefix("00") {
        rest.to_string()
    } else if let Some(rest) = digits.strip_prefix('0') {
        format!("{default_country_code}{rest}")
    } else {
        digits
    };

    if !(8..=15).contains(&international.len()) || international.starts_with('0') {
        return Err(invalid_phone(raw));
    }
    Ok(format!("+{international}"))
}

fn invalid_phone(raw: &str) -> AppError {
    AppError::with_message(
        ErrorCode::InvalidPhone,
        format!("cannot normalize phone '{}'", raw.trim()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_national_number_gets_country_code() {
        assert_eq!(
            normalize_phone("0712 345 678", DEFAULT_COUNTRY_CODE).unwrap(),
            "+255712345678"
        );
    }

    #[test]
    fn test_international_forms() {
        assert_eq!(normalize_phone("+255 (712) 345-678", "255").unwrap(), "+255712345678");
        assert_eq!(normalize_phone("00255712345678", "255").unwrap(), "+255712345678");
        assert_eq!(normalize_phone("255712345678", "255").unwrap(), "+255712345678");
    }

    #[test]
    fn test_rejects_bad_input() {
        for raw in ["", "12345", "0712abc678", "+1234567890123456", "++255712345678"] {
            let err = normalize_phone(raw, "255").unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidPhone, "{raw}");
        }
    }
}
