//! Recorder backed by the audit_logs table

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use shared::models::NewAuditLog;

use super::{AuditEvent, AuditRecorder, current_actor};
use crate::db::{AuditStore, Store};

pub struct StoreAuditRecorder {
    store: Arc<dyn Store>,
}

impl StoreAuditRecorder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuditRecorder for StoreAuditRecorder {
    async fn record(&self, event: AuditEvent) {
        let action = event.action.trim();
        if action.is_empty() {
            tracing::debug!(entity_type = %event.entity_type, "Skipping audit event without action");
            return;
        }

        let metadata = match event.metadata {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        let log = NewAuditLog {
            actor_user_id: event.actor.or_else(current_actor),
            action: action.to_string(),
            entity_type: event.entity_type,
            entity_id: event.entity_id,
            metadata,
        };

        if let Err(e) = self.store.insert_audit_log(&log).await {
            tracing::error!(
                action = %log.action,
                entity_type = %log.entity_type,
                error = %e,
                "Failed to write audit log"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::with_actor;
    use crate::db::MemoryStore;
    use shared::models::AuditLogFilter;

    async fn logs(store: &MemoryStore) -> Vec<shared::models::AuditLog> {
        store
            .list_audit_logs(&AuditLogFilter::default(), 100, 0)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_records_with_context_actor() {
        let store = MemoryStore::new();
        let recorder = StoreAuditRecorder::new(Arc::new(store.clone()));

        with_actor(
            Some(5),
            recorder.record(AuditEvent::new("  department.create ", "department").entity(1)),
        )
        .await;

        let rows = logs(&store).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].action, "department.create");
        assert_eq!(rows[0].actor_user_id, Some(5));
        assert_eq!(rows[0].entity_id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_blank_action_skipped() {
        let store = MemoryStore::new();
        let recorder = StoreAuditRecorder::new(Arc::new(store.clone()));
        recorder.record(AuditEvent::new("   ", "department")).await;
        assert!(logs(&store).await.is_empty());
    }

    #[tokio::test]
    async fn test_insert_failure_is_swallowed() {
        let store = MemoryStore::new();
        store.fail_audit_inserts(true);
        let recorder = StoreAuditRecorder::new(Arc::new(store.clone()));
        recorder.record(AuditEvent::new("user.create", "user")).await;

        store.fail_audit_inserts(false);
        assert!(logs(&store).await.is_empty());
    }
}
