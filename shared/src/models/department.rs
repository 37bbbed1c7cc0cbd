//! Department Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Department entity with derived employee count
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Derived on read, never stored
    #[cfg_attr(feature = "db", sqlx(default))]
    pub employee_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update department payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentInput {
    pub name: String,
    pub description: Option<String>,
}

/// Department list query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepartmentQuery {
    /// Case-insensitive substring over name and description
    pub q: Option<String>,
    #[serde(flatten)]
    pub page: super::PageRequest,
}
