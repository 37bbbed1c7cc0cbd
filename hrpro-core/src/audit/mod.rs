//! Audit trail
//!
//! Every mutating workflow hands an [`AuditEvent`] to an [`AuditRecorder`].
//! Recording is best effort: a failed write is logged and dropped, never
//! returned to the business operation. Services start with the
//! [`NoopAuditRecorder`] and receive the real one through a setter.

pub mod recorder;

pub use recorder::StoreAuditRecorder;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

tokio::task_local! {
    static ACTOR: Option<i64>;
}

/// Run `fut` with `actor` as the context-carried actor
pub async fn with_actor<F>(actor: Option<i64>, fut: F) -> F::Output
where
    F: Future,
{
    ACTOR.scope(actor, fut).await
}

/// Actor set by the enclosing [`with_actor`], if any
pub fn current_actor() -> Option<i64> {
    ACTOR.try_with(|actor| *actor).ok().flatten()
}

/// One audit event
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    /// `None` falls back to [`current_actor`]
    pub actor: Option<i64>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub metadata: Value,
}

impl AuditEvent {
    pub fn new(action: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            actor: None,
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: None,
            metadata: Value::Object(Map::new()),
        }
    }

    pub fn actor(mut self, actor: i64) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn entity(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Best-effort audit sink
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    async fn record(&self, event: AuditEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditRecorder;

#[async_trait]
impl AuditRecorder for NoopAuditRecorder {
    async fn record(&self, _event: AuditEvent) {}
}

/// Default recorder handed to freshly built services
pub fn noop_recorder() -> Arc<dyn AuditRecorder> {
    Arc::new(NoopAuditRecorder)
}
