//! Audit Log Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Audit event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AuditLog {
    pub id: i64,
    pub actor_user_id: Option<i64>,
    /// Short dotted action, e.g. `leave.request.approve`
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

/// Event to insert
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub actor_user_id: Option<i64>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub metadata: Value,
}

/// Audit list filter (dates as ISO strings, inclusive)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditQuery {
    pub action_prefix: Option<String>,
    pub actor_user_id: Option<i64>,
    pub entity_type: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    #[serde(flatten)]
    pub page: super::PageRequest,
}

/// Parsed audit filter shared by the audit list and the audit report
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub from: Option<chrono::NaiveDate>,
    pub to: Option<chrono::NaiveDate>,
    pub action_prefix: Option<String>,
    pub actor_user_id: Option<i64>,
    pub entity_type: Option<String>,
}
