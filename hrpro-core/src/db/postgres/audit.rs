//! Audit log operations

use async_trait::async_trait;
use shared::models::{AuditLog, AuditLogFilter, NewAuditLog};
use sqlx::{Postgres, QueryBuilder};

use super::PgStore;
use crate::db::{AuditStore, RepoResult};

const AUDIT_COLUMNS: &str = "id, actor_user_id, action, entity_type, entity_id, metadata, created_at";

#[async_trait]
impl AuditStore for PgStore {
    async fn insert_audit_log(&self, log: &NewAuditLog) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO audit_logs (actor_user_id, action, entity_type, entity_id, metadata) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(log.actor_user_id)
        .bind(&log.action)
        .bind(&log.entity_type)
        .bind(log.entity_id.as_deref())
        .bind(&log.metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_audit_logs(
        &self,
        filter: &AuditLogFilter,
        limit: u64,
        offset: u64,
    ) -> RepoResult<Vec<AuditLog>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {AUDIT_COLUMNS} FROM audit_logs WHERE TRUE"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);
        let rows = qb.build_query_as::<AuditLog>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn count_audit_logs(&self, filter: &AuditLogFilter) -> RepoResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM audit_logs WHERE TRUE");
        push_filter(&mut qb, filter);
        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total.max(0) as u64)
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &AuditLogFilter) {
    if let Some(from) = filter.from {
        qb.push(" AND created_at >= ").push_bind(from).push("::DATE");
    }
    if let Some(to) = filter.to {
        qb.push(" AND created_at < (").push_bind(to).push("::DATE + 1)");
    }
    if let Some(prefix) = filter.action_prefix.as_deref() {
        qb.push(" AND action LIKE ")
            .push_bind(format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_")));
    }
    if let Some(actor) = filter.actor_user_id {
        qb.push(" AND actor_user_id = ").push_bind(actor);
    }
    if let Some(entity_type) = filter.entity_type.as_deref() {
        qb.push(" AND entity_type = ").push_bind(entity_type.to_string());
    }
}
