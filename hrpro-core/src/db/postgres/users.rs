//! Users and refresh tokens

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{NewUser, PageRequest, RefreshToken, User, UserUpdate};
use sqlx::{Postgres, QueryBuilder};

use super::{PgStore, like_pattern, search_term};
use crate::db::{RefreshTokenStore, RepoError, RepoResult, UserStore};

const USER_COLUMNS: &str =
    "id, username, password_hash, role, is_active, last_login_at, created_at, updated_at";

const TOKEN_COLUMNS: &str = "id, user_id, token_hash, expires_at, revoked_at, created_at";

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: i64) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(username) = lower($1)"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password_hash, role, is_active) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_user(&self, id: i64, changes: &UserUpdate) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
               username = COALESCE($2, username), \
               role = COALESCE($3, role), \
               is_active = COALESCE($4, is_active), \
               updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.username.as_deref())
        .bind(changes.role.as_deref())
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("user {id}")))
    }

    async fn set_user_password(&self, id: i64, password_hash: &str) -> RepoResult<()> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    async fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> RepoResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_users(&self, q: Option<&str>, page: &PageRequest) -> RepoResult<(Vec<User>, u64)> {
        let term = search_term(q).map(like_pattern);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE TRUE");
        if let Some(term) = &term {
            count.push(" AND username ILIKE ").push_bind(term.clone());
        }
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut list = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));
        if let Some(term) = &term {
            list.push(" AND username ILIKE ").push_bind(term.clone());
        }
        list.push(" ORDER BY lower(username) LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let users = list.build_query_as::<User>().fetch_all(&self.pool).await?;

        Ok((users, total.max(0) as u64))
    }

    async fn count_active_users(&self) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl RefreshTokenStore for PgStore {
    async fn create_refresh_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<RefreshToken> {
        let token = sqlx::query_as::<_, RefreshToken>(&format!(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) \
             VALUES ($1, $2, $3) RETURNING {TOKEN_COLUMNS}"
        ))
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(token)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> RepoResult<Option<RefreshToken>> {
        let token = sqlx::query_as::<_, RefreshToken>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM refresh_tokens WHERE token_hash = $1 \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    async fn revoke_refresh_tokens(&self, token_hash: &str, at: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $2 WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(token_hash)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
