use async_trait::async_trait;
use serde_json::Value;
use shared::models::{AppSetting, SettingKey};

use super::PgStore;
use crate::db::{RepoResult, SettingsStore};

#[async_trait]
impl SettingsStore for PgStore {
    async fn list_settings(&self) -> RepoResult<Vec<AppSetting>> {
        let rows = sqlx::query_as::<_, AppSetting>(
            "SELECT key, value, updated_by, updated_at FROM app_settings ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn upsert_setting(
        &self,
        key: SettingKey,
        value: &Value,
        updated_by: Option<i64>,
    ) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO app_settings (key, value, updated_by, updated_at) \
             VALUES ($1, $2, $3, now()) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, \
               updated_by = EXCLUDED.updated_by, updated_at = EXCLUDED.updated_at",
        )
        .bind(key.as_str())
        .bind(value)
        .bind(updated_by)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
