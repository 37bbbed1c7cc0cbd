//! Login account administration (admin only)

use std::sync::Arc;

use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{NewUser, PageRequest, PaginatedResponse, Role, User, UserCreate, UserUpdate};
use shared::util::clean_optional;

use super::roles;
use crate::audit::{AuditEvent, AuditRecorder, noop_recorder};
use crate::auth::password::hash_password;
use crate::auth::{Claims, require_role};
use crate::db::{RepoError, Store, UserStore};
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_password, validate_required_text};

pub struct UserService {
    store: Arc<dyn Store>,
    bcrypt_cost: u32,
    audit: Arc<dyn AuditRecorder>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, bcrypt_cost: u32) -> Self {
        Self {
            store,
            bcrypt_cost,
            audit: noop_recorder(),
        }
    }

    pub fn set_audit_recorder(&mut self, recorder: Arc<dyn AuditRecorder>) {
        self.audit = recorder;
    }

    pub async fn list(&self, claims: &Claims, q: Option<String>, page: PageRequest) -> AppResult<PaginatedResponse<User>> {
        require_role(claims, roles::ADMIN_ONLY)?;
        let q = clean_optional(q);
        let (rows, total) = self.store.list_users(q.as_deref(), &page).await?;
        Ok(PaginatedResponse::from_request(rows, total, &page))
    }

    pub async fn get(&self, claims: &Claims, id: i64) -> AppResult<User> {
        require_role(claims, roles::ADMIN_ONLY)?;
        self.load(id).await
    }

    pub async fn create(&self, claims: &Claims, input: UserCreate) -> AppResult<User> {
        require_role(claims, roles::ADMIN_ONLY)?;
        let username = input.username.trim().to_string();
        validate_required_text(&username, "username", MAX_SHORT_TEXT_LEN)?;
        validate_password(&input.password)?;
        let role = assignable_role(&input.role)?;

        let new_user = NewUser {
            username,
            password_hash: hash_password(&input.password, self.bcrypt_cost).await?,
            role: role.as_str().to_string(),
            is_active: input.is_active.unwrap_or(true),
        };
        let user = self
            .store
            .create_user(&new_user)
            .await
            .map_err(duplicate_username)?;

        tracing::info!(user_id = user.id, username = %user.username, role = %user.role, "User created");
        self.audit
            .record(
                AuditEvent::new("user.create", "user")
                    .actor(claims.user_id)
                    .entity(user.id)
                    .metadata(json!({ "username": user.username, "role": user.role, "is_active": user.is_active })),
            )
            .await;
        Ok(user)
    }

    /// Partial update. Callers editing themselves keep their admin role
    /// and their active flag.
    pub async fn update(&self, claims: &Claims, id: i64, changes: UserUpdate) -> AppResult<User> {
        require_role(claims, roles::ADMIN_ONLY)?;
        let before = self.load(id).await?;

        let username = match changes.username {
            Some(raw) => {
                let username = raw.trim().to_string();
                validate_required_text(&username, "username", MAX_SHORT_TEXT_LEN)?;
                Some(username)
            }
            None => None,
        };
        let role = changes.role.as_deref().map(assignable_role).transpose()?;

        if id == claims.user_id {
            if role.is_some_and(|r| !r.is_admin_class()) {
                return Err(AppError::new(ErrorCode::CannotRemoveOwnAdmin));
            }
            if changes.is_active == Some(false) {
                return Err(AppError::new(ErrorCode::CannotDeactivateSelf));
            }
        }

        let changes = UserUpdate {
            username,
            role: role.map(|r| r.as_str().to_string()),
            is_active: changes.is_active,
        };
        let user = self
            .store
            .update_user(id, &changes)
            .await
            .map_err(duplicate_username)?;

        self.audit
            .record(
                AuditEvent::new("user.update", "user")
                    .actor(claims.user_id)
                    .entity(id)
                    .metadata(json!({
                        "old_role": before.role,
                        "new_role": user.role,
                        "old_active": before.is_active,
                        "new_active": user.is_active,
                    })),
            )
            .await;
        Ok(user)
    }

    pub async fn set_active(&self, claims: &Claims, id: i64, is_active: bool) -> AppResult<User> {
        self.update(
            claims,
            id,
            UserUpdate {
                is_active: Some(is_active),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn reset_password(&self, claims: &Claims, id: i64, password: &str) -> AppResult<()> {
        require_role(claims, roles::ADMIN_ONLY)?;
        validate_password(password)?;
        self.load(id).await?;
        let hash = hash_password(password, self.bcrypt_cost).await?;
        self.store.set_user_password(id, &hash).await?;

        tracing::info!(user_id = id, "Password reset");
        self.audit
            .record(
                AuditEvent::new("user.password.reset", "user")
                    .actor(claims.user_id)
                    .entity(id),
            )
            .await;
        Ok(())
    }

    async fn load(&self, id: i64) -> AppResult<User> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user {id}")))
    }
}

fn assignable_role(raw: &str) -> AppResult<Role> {
    Role::parse(raw)
        .filter(Role::is_assignable)
        .ok_or_else(|| AppError::validation(format!("unknown role '{}'", raw.trim())).with_detail("field", "role"))
}

fn duplicate_username(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(_) => AppError::new(ErrorCode::DuplicateUsername),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::db::MemoryStore;
    use crate::services::test_support::claims;

    fn create_input(username: &str, role: &str) -> UserCreate {
        UserCreate {
            username: username.to_string(),
            password: "correct-horse".to_string(),
            role: role.to_string(),
            is_active: None,
        }
    }

    async fn service_with_admin() -> (UserService, Arc<MemoryStore>, User) {
        let store = Arc::new(MemoryStore::new());
        let svc = UserService::new(store.clone(), 4);
        let admin = svc
            .create(&claims(0, "master_admin"), create_input("root", "Admin"))
            .await
            .unwrap();
        (svc, store, admin)
    }

    #[tokio::test]
    async fn test_create_normalizes_role_and_hashes() {
        let (svc, store, _) = service_with_admin().await;
        let admin = claims(1, "admin");
        let user = svc.create(&admin, create_input("amina", "HR Officer")).await.unwrap();
        assert_eq!(user.role, "hr_officer");
        assert!(user.is_active);

        let stored = store.find_user(user.id).await.unwrap().unwrap();
        assert!(verify_password("correct-horse", &stored.password_hash).await.unwrap());

        let err = svc.create(&admin, create_input("AMINA", "viewer")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateUsername);
        let err = svc.create(&admin, create_input("x", "janitor")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let err = svc.create(&admin, create_input("y", "staff")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let err = svc
            .create(&admin, UserCreate { password: "short".into(), ..create_input("z", "viewer") })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn test_self_protection() {
        let (svc, _, admin) = service_with_admin().await;
        let me = claims(admin.id, "admin");

        let err = svc
            .update(&me, admin.id, UserUpdate { role: Some("viewer".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CannotRemoveOwnAdmin);
        let err = svc.set_active(&me, admin.id, false).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CannotDeactivateSelf);

        // another admin may do both
        let other = claims(admin.id + 100, "admin");
        let demoted = svc
            .update(&other, admin.id, UserUpdate { role: Some("Finance Officer".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(demoted.role, "finance_officer");
        assert!(!svc.set_active(&other, admin.id, false).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_admin_only() {
        let (svc, _, admin) = service_with_admin().await;
        let hr = claims(5, "hr_officer");
        assert_eq!(
            svc.list(&hr, None, PageRequest::default()).await.unwrap_err().code,
            ErrorCode::Forbidden
        );
        assert_eq!(
            svc.reset_password(&hr, admin.id, "another-pass").await.unwrap_err().code,
            ErrorCode::Forbidden
        );

        let page = svc
            .list(&claims(admin.id, "admin"), Some("ro".into()), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_reset_password() {
        let (svc, store, admin) = service_with_admin().await;
        svc.reset_password(&claims(admin.id, "admin"), admin.id, "brand-new-pass")
            .await
            .unwrap();
        let stored = store.find_user(admin.id).await.unwrap().unwrap();
        assert!(verify_password("brand-new-pass", &stored.password_hash).await.unwrap());
        assert_eq!(
            svc.reset_password(&claims(admin.id, "admin"), 999, "brand-new-pass")
                .await
                .unwrap_err()
                .code,
            ErrorCode::NotFound
        );
    }
}
