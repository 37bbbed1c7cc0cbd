//! Login, token rotation and the initial admin seed

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde_json::json;
use sha2::{Digest, Sha256};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{LoginResponse, NewUser, Role, User, UserSummary, normalize_role};

use super::jwt::{Claims, JwtService};
use super::password::{hash_password, verify_password};
use crate::audit::{AuditEvent, AuditRecorder, noop_recorder};
use crate::db::{RefreshTokenStore, RepoError, Store, UserStore};

/// Raw refresh token size before encoding
const REFRESH_TOKEN_BYTES: usize = 32;

/// Hex SHA-256 of a raw refresh token; the only form that is persisted
pub fn hash_refresh_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub struct AuthService {
    store: Arc<dyn Store>,
    jwt: JwtService,
    refresh_ttl_hours: i64,
    bcrypt_cost: u32,
    audit: Arc<dyn AuditRecorder>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, jwt: JwtService, refresh_ttl_hours: i64, bcrypt_cost: u32) -> Self {
        Self {
            store,
            jwt,
            refresh_ttl_hours,
            bcrypt_cost,
            audit: noop_recorder(),
        }
    }

    pub fn set_audit_recorder(&mut self, recorder: Arc<dyn AuditRecorder>) {
        self.audit = recorder;
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginResponse> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::invalid_credentials());
        }

        let user = match self.store.find_user_by_username(username).await? {
            Some(user) => user,
            None => {
                crate::security_log!("WARN", "login_failed", username = username, reason = "unknown_user");
                return Err(AppError::invalid_credentials());
            }
        };
        if !verify_password(password, &user.password_hash).await? {
            crate::security_log!("WARN", "login_failed", username = username, reason = "bad_password");
            return Err(AppError::invalid_credentials());
        }
        if !user.is_active {
            crate::security_log!("WARN", "login_failed", username = username, reason = "inactive");
            return Err(AppError::new(ErrorCode::InactiveUser));
        }

        let response = self.issue_session(&user).await?;
        self.store.touch_last_login(user.id, Utc::now()).await?;

        tracing::info!(user_id = user.id, username = %user.username, "User logged in");
        self.audit
            .record(
                AuditEvent::new("user.login.success", "user")
                    .actor(user.id)
                    .entity(user.id)
                    .metadata(json!({ "username": user.username })),
            )
            .await;
        Ok(response)
    }

    /// Revoke the refresh token; empty input is a no-op
    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        let refresh_token = refresh_token.trim();
        if refresh_token.is_empty() {
            return Ok(());
        }
        let revoked = self
            .store
            .revoke_refresh_tokens(&hash_refresh_token(refresh_token), Utc::now())
            .await?;
        tracing::debug!(revoked, "Refresh token revoked");
        Ok(())
    }

    /// Rotate a refresh token into a new access/refresh pair
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<LoginResponse> {
        let refresh_token = refresh_token.trim();
        if refresh_token.is_empty() {
            return Err(AppError::new(ErrorCode::AccessTokenMissing));
        }

        let now = Utc::now();
        let token_hash = hash_refresh_token(refresh_token);
        let stored = self
            .store
            .find_refresh_token(&token_hash)
            .await?
            .filter(|t| t.is_usable(now))
            .ok_or_else(|| {
                crate::security_log!("WARN", "refresh_rejected", reason = "unusable_token");
                AppError::with_message(ErrorCode::AccessTokenInvalid, "refresh token is invalid")
            })?;

        let user = self
            .store
            .find_user(stored.user_id)
            .await?
            .ok_or_else(|| AppError::with_message(ErrorCode::AccessTokenInvalid, "refresh token is invalid"))?;
        if !user.is_active {
            return Err(AppError::new(ErrorCode::InactiveUser));
        }

        self.store.revoke_refresh_tokens(&token_hash, now).await?;
        self.issue_session(&user).await
    }

    pub fn validate_access_token(&self, raw: &str) -> AppResult<Claims> {
        self.jwt.validate_token(raw).inspect_err(|e| {
            if e.code != ErrorCode::AccessTokenMissing {
                crate::security_log!("INFO", "access_token_rejected", kind = e.code.kind());
            }
        })
    }

    /// Current view of the caller; role and active flag come from the store
    pub async fn me(&self, raw_token: &str) -> AppResult<UserSummary> {
        let claims = self.validate_access_token(raw_token)?;
        let user = self
            .store
            .find_user(claims.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user {}", claims.user_id)))?;
        if !user.is_active {
            return Err(AppError::new(ErrorCode::InactiveUser));
        }
        Ok(UserSummary {
            id: user.id,
            username: user.username,
            role: normalize_role(&user.role),
        })
    }

    /// Create the startup admin unless the username exists.
    /// Returns `true` when a user was created.
    pub async fn seed_initial_admin(&self, username: &str, password: &str, role: &str) -> AppResult<bool> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            tracing::debug!("Initial admin not configured, skipping seed");
            return Ok(false);
        }
        if self.store.find_user_by_username(username).await?.is_some() {
            return Ok(false);
        }

        let role = Role::parse(role).map(|r| r.as_str().to_string()).unwrap_or_else(|| {
            tracing::warn!(role, "Unknown initial admin role, falling back to admin");
            Role::Admin.as_str().to_string()
        });
        let new_user = NewUser {
            username: username.to_string(),
            password_hash: hash_password(password, self.bcrypt_cost).await?,
            role,
            is_active: true,
        };
        match self.store.create_user(&new_user).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, username = %user.username, role = %user.role, "Seeded initial admin");
                Ok(true)
            }
            // lost a race with another process seeding the same name
            Err(RepoError::Duplicate(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn issue_session(&self, user: &User) -> AppResult<LoginResponse> {
        let access_token = self.jwt.generate_token(user)?;
        let refresh_token = generate_refresh_token();
        let expires_at = Utc::now() + Duration::hours(self.refresh_ttl_hours);
        self.store
            .create_refresh_token(user.id, &hash_refresh_token(&refresh_token), expires_at)
            .await?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            expires_in: self.jwt.ttl_seconds(),
            user: UserSummary {
                id: user.id,
                username: user.username.clone(),
                role: normalize_role(&user.role),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    const SECRET: &str = "auth-service-test-secret-0123456789";

    async fn service() -> (MemoryStore, AuthService) {
        let store = MemoryStore::new();
        let auth = AuthService::new(Arc::new(store.clone()), JwtService::new(SECRET, 15), 168, 4);
        assert!(auth.seed_initial_admin("root", "rootpass1", "Admin").await.unwrap());
        (store, auth)
    }

    #[tokio::test]
    async fn test_login_and_me() {
        let (_store, auth) = service().await;
        let session = auth.login("  ROOT ", "rootpass1").await.unwrap();
        assert_eq!(session.user.role, "admin");
        assert_eq!(session.expires_in, 900);

        let me = auth.me(&format!("Bearer {}", session.access_token)).await.unwrap();
        assert_eq!(me.username, "root");
    }

    #[tokio::test]
    async fn test_bad_credentials_are_indistinguishable() {
        let (_store, auth) = service().await;
        let unknown = auth.login("nobody", "rootpass1").await.unwrap_err();
        let wrong = auth.login("root", "wrong-pass").await.unwrap_err();
        let empty = auth.login("root", "").await.unwrap_err();
        assert_eq!(unknown.code, ErrorCode::InvalidCredentials);
        assert_eq!(wrong.code, ErrorCode::InvalidCredentials);
        assert_eq!(empty.code, ErrorCode::InvalidCredentials);
        assert_eq!(unknown.message, wrong.message);
    }

    #[tokio::test]
    async fn test_inactive_user() {
        let (store, auth) = service().await;
        let user = store.find_user_by_username("root").await.unwrap().unwrap();
        store
            .update_user(
                user.id,
                &shared::models::UserUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let err = auth.login("root", "rootpass1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InactiveUser);
    }

    #[tokio::test]
    async fn test_refresh_token_stored_as_hash_only() {
        let (store, auth) = service().await;
        let session = auth.login("root", "rootpass1").await.unwrap();
        let stored = store
            .find_refresh_token(&hash_refresh_token(&session.refresh_token))
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.token_hash, session.refresh_token);
        assert_eq!(stored.token_hash.len(), 64);
        assert!(store.find_refresh_token(&session.refresh_token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_logout_revokes() {
        let (_store, auth) = service().await;
        let session = auth.login("root", "rootpass1").await.unwrap();

        let rotated = auth.refresh(&session.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, session.refresh_token);
        assert_eq!(
            auth.refresh(&session.refresh_token).await.unwrap_err().code,
            ErrorCode::AccessTokenInvalid
        );

        auth.logout(&rotated.refresh_token).await.unwrap();
        auth.logout("").await.unwrap();
        assert_eq!(
            auth.refresh(&rotated.refresh_token).await.unwrap_err().code,
            ErrorCode::AccessTokenInvalid
        );
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let (_store, auth) = service().await;
        assert!(!auth.seed_initial_admin("root", "other-pass", "Admin").await.unwrap());
        assert!(!auth.seed_initial_admin("", "x", "Admin").await.unwrap());
        assert!(auth.login("root", "rootpass1").await.is_ok());
    }
}
