use std::sync::Arc;

use shared::error::{AppError, AppResult};
use shared::models::{AuditLog, AuditLogFilter, AuditQuery, PaginatedResponse};
use shared::util::{clean_optional, parse_optional_iso_date};

use super::roles;
use crate::auth::{Claims, require_role};
use crate::db::{AuditStore, Store};

pub struct AuditLogService {
    store: Arc<dyn Store>,
}

impl AuditLogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Newest first; both dates optional and inclusive
    pub async fn list(&self, claims: &Claims, query: AuditQuery) -> AppResult<PaginatedResponse<AuditLog>> {
        require_role(claims, roles::ADMIN_ONLY)?;
        let from = parse_optional_iso_date("date_from", query.date_from.as_deref())?;
        let to = parse_optional_iso_date("date_to", query.date_to.as_deref())?;
        if let (Some(from), Some(to)) = (from, to)
            && from > to
        {
            return Err(AppError::validation("date_from must not be after date_to"));
        }

        let filter = AuditLogFilter {
            from,
            to,
            action_prefix: clean_optional(query.action_prefix),
            actor_user_id: query.actor_user_id,
            entity_type: clean_optional(query.entity_type),
        };
        let page = query.page;
        let total = self.store.count_audit_logs(&filter).await?;
        let rows = self
            .store
            .list_audit_logs(&filter, u64::from(page.limit()), page.offset())
            .await?;
        Ok(PaginatedResponse::from_request(rows, total, &page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditEvent, AuditRecorder, StoreAuditRecorder};
    use crate::db::MemoryStore;
    use crate::services::test_support::claims;
    use shared::error::ErrorCode;

    #[tokio::test]
    async fn test_list_filters_and_gate() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let recorder = StoreAuditRecorder::new(store.clone());
        for (action, actor) in [
            ("leave.request.apply", 2),
            ("leave.request.approve", 1),
            ("payroll.batch.create", 1),
        ] {
            recorder
                .record(AuditEvent::new(action, "x").actor(actor).entity(7))
                .await;
        }

        let svc = AuditLogService::new(store);
        assert_eq!(
            svc.list(&claims(1, "hr_officer"), AuditQuery::default()).await.unwrap_err().code,
            ErrorCode::Forbidden
        );

        let admin = claims(1, "admin");
        let all = svc.list(&admin, AuditQuery::default()).await.unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.data[0].action, "payroll.batch.create");

        let leave = svc
            .list(
                &admin,
                AuditQuery {
                    action_prefix: Some("leave.".into()),
                    actor_user_id: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(leave.total, 1);
        assert_eq!(leave.data[0].action, "leave.request.approve");

        let err = svc
            .list(
                &admin,
                AuditQuery {
                    date_from: Some("2026-02-02".into()),
                    date_to: Some("2026-02-01".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
