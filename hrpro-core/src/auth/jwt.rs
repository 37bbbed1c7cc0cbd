//! Access token service
//!
//! HS256 tokens carrying the user id, username and normalized role.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Role, User, normalize_role};

/// Claims stored in an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id as a string (Subject)
    pub sub: String,
    pub user_id: i64,
    pub username: String,
    /// Normalized role
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Claims for an in-process caller, no expiry bookkeeping
    pub fn for_user(user_id: i64, username: &str, role: &str) -> Self {
        Self {
            sub: user_id.to_string(),
            user_id,
            username: username.to_string(),
            role: normalize_role(role),
            iat: 0,
            exp: 0,
        }
    }

    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }

    pub fn is_admin_class(&self) -> bool {
        self.role().is_some_and(|r| r.is_admin_class())
    }

    /// The employee record the caller acts as
    pub fn employee_id(&self) -> i64 {
        self.user_id
    }
}

/// Access token service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_minutes: i64,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("ttl_minutes", &self.ttl_minutes)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_minutes,
        }
    }

    /// Token lifetime in seconds
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_minutes * 60
    }

    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            user_id: user.id,
            username: user.username.clone(),
            role: normalize_role(&user.role),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.ttl_minutes)).timestamp(),
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("token generation failed: {e}")))
    }

    /// Validate a raw token, with or without a `Bearer ` prefix
    pub fn validate_token(&self, raw: &str) -> AppResult<Claims> {
        let token = Self::extract_token(raw);
        if token.is_empty() {
            return Err(AppError::new(ErrorCode::AccessTokenMissing));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp", "iat"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::new(ErrorCode::AccessTokenExpired),
                _ => AppError::with_message(
                    ErrorCode::AccessTokenInvalid,
                    format!("access token is invalid: {e}"),
                ),
            }
        })?;
        Ok(data.claims)
    }

    /// Strip surrounding whitespace and an optional `Bearer ` prefix
    pub fn extract_token(raw: &str) -> &str {
        let raw = raw.trim();
        match raw.get(..6) {
            Some(scheme)
                if scheme.eq_ignore_ascii_case("bearer")
                    && raw[6..].chars().next().is_none_or(char::is_whitespace) =>
            {
                raw[6..].trim()
            }
            _ => raw,
        }
    }
}
