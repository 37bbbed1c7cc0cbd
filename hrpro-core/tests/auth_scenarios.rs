mod common;

use chrono::{Duration, Utc};
use common::{Harness, JWT_SECRET, claims};
use hrpro_core::commands::{auth, dashboard};
use hrpro_core::core::ensure_jwt_secret;
use hrpro_core::{Claims, JwtService};
use shared::error::ErrorCode;

#[tokio::test]
async fn token_failures_map_to_distinct_kinds() {
    let harness = Harness::new();
    let state = &harness.state;

    let past = (Utc::now() - Duration::hours(1)).timestamp();
    let expired = JwtService::new(JWT_SECRET, 15)
        .sign(&Claims {
            iat: past - 900,
            exp: past,
            ..Claims::for_user(1, "admin", "admin")
        })
        .unwrap();

    let err = dashboard::summary(state, &expired).await.unwrap_err();
    assert_eq!(err.kind, "access_token_expired");
    let err = dashboard::summary(state, "garbage").await.unwrap_err();
    assert_eq!(err.kind, "access_token_invalid");
    let err = dashboard::summary(state, "").await.unwrap_err();
    assert_eq!(err.kind, "access_token_missing");

    // signed with another secret
    let now = Utc::now().timestamp();
    let foreign = JwtService::new("some-other-secret-0123456789abcdef", 15)
        .sign(&Claims {
            iat: now,
            exp: now + 900,
            ..Claims::for_user(1, "admin", "admin")
        })
        .unwrap();
    let err = dashboard::summary(state, &foreign).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AccessTokenInvalid);
}

#[tokio::test]
async fn login_refresh_and_logout() {
    let harness = Harness::new();
    let state = &harness.state;
    assert!(state.auth.seed_initial_admin("root", "s3cret-pass", "admin").await.unwrap());
    // second seed is a no-op
    assert!(!state.auth.seed_initial_admin("root", "other", "admin").await.unwrap());

    let session = auth::login(state, "root", "s3cret-pass").await.unwrap();
    assert_eq!(session.user.role, "admin");
    assert_eq!(session.expires_in, 15 * 60);
    assert_eq!(auth::me(state, &format!("Bearer {}", session.access_token)).await.unwrap().username, "root");
    assert!(dashboard::summary(state, &session.access_token).await.unwrap().active_users.is_some());

    let rotated = auth::refresh(state, &session.refresh_token).await.unwrap();
    assert_ne!(rotated.refresh_token, session.refresh_token);
    // the old refresh token is spent
    let err = auth::refresh(state, &session.refresh_token).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AccessTokenInvalid);

    auth::logout(state, &rotated.refresh_token).await.unwrap();
    assert!(auth::refresh(state, &rotated.refresh_token).await.is_err());
}

#[tokio::test]
async fn login_failures_look_alike() {
    let harness = Harness::new();
    let state = &harness.state;
    state.auth.seed_initial_admin("root", "s3cret-pass", "admin").await.unwrap();
    let admin = auth::login(state, "root", "s3cret-pass").await.unwrap();

    let created = state
        .users
        .create(
            &claims(admin.user.id, "admin"),
            shared::models::UserCreate {
                username: "clerk".into(),
                password: "clerk-pass-123".into(),
                role: "viewer".into(),
                is_active: None,
            },
        )
        .await
        .unwrap();
    state
        .users
        .set_active(&claims(admin.user.id, "admin"), created.id, false)
        .await
        .unwrap();

    let unknown = auth::login(state, "nobody", "whatever").await.unwrap_err();
    let wrong = auth::login(state, "root", "wrong-pass").await.unwrap_err();
    let inactive = auth::login(state, "clerk", "clerk-pass-123").await.unwrap_err();
    assert_eq!(unknown, wrong);
    assert_eq!(wrong, inactive);
    assert_eq!(inactive.message, "authentication failed");
}

#[test]
fn jwt_secret_is_generated_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hrpro").join("config.json");

    let first = ensure_jwt_secret(None, &path).unwrap();
    let second = ensure_jwt_secret(Some("  "), &path).unwrap();
    assert_eq!(first, second);
    assert!(first.len() >= 32);
    assert_eq!(ensure_jwt_secret(Some("from-env"), &path).unwrap(), "from-env");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
