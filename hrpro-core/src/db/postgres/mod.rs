//! Postgres adapter
//!
//! Runtime-checked `sqlx::query_as` against the schema in `migrations/`.

mod attendance;
mod audit;
mod dashboard;
mod departments;
mod employees;
mod leave;
mod payroll;
mod reports;
mod settings;
mod users;

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};

use super::{RepoError, RepoResult};
use crate::core::config::{DatabaseSection, DatabaseTarget};

const MAX_CONNECTIONS: u32 = 20;
const MAX_LIFETIME: Duration = Duration::from_secs(30 * 60);
const IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Postgres-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with the process-wide pool settings
    pub async fn connect(target: &DatabaseTarget) -> RepoResult<Self> {
        let options = match target {
            DatabaseTarget::Url(url) => url
                .parse::<PgConnectOptions>()
                .map_err(|e| RepoError::Validation(format!("invalid connection string: {e}")))?,
            DatabaseTarget::Section(section) => connect_options(section)?,
        };

        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .min_connections(0)
            .max_lifetime(MAX_LIFETIME)
            .idle_timeout(IDLE_TIMEOUT)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;

        tracing::info!(max_connections = MAX_CONNECTIONS, "Database pool ready");
        Ok(Self { pool })
    }

    /// Apply pending migrations
    pub async fn migrate(&self) -> RepoResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepoError::Database(format!("migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn connect_options(section: &DatabaseSection) -> RepoResult<PgConnectOptions> {
    let mut options = PgConnectOptions::new()
        .host(&section.host)
        .port(section.port)
        .database(&section.database)
        .username(&section.user);
    if let Some(password) = section.password.as_deref() {
        options = options.password(password);
    }
    if let Some(mode) = section.sslmode.as_deref() {
        let mode = mode
            .parse::<PgSslMode>()
            .map_err(|e| RepoError::Validation(format!("invalid sslmode '{mode}': {e}")))?;
        options = options.ssl_mode(mode);
    }
    Ok(options)
}

/// `%q%` pattern for ILIKE, with wildcards in `q` escaped
pub(crate) fn like_pattern(q: &str) -> String {
    let escaped = q
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Non-blank search term
pub(crate) fn search_term(q: Option<&str>) -> Option<&str> {
    q.map(str::trim).filter(|q| !q.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(sslmode: Option<&str>) -> DatabaseSection {
        DatabaseSection {
            host: "db".into(),
            port: 5432,
            database: "hr".into(),
            user: "hr".into(),
            password: Some("secret".into()),
            sslmode: sslmode.map(str::to_string),
        }
    }

    #[test]
    fn test_connect_options_sslmode() {
        let options = connect_options(&section(Some("verify-full"))).unwrap();
        assert!(matches!(options.get_ssl_mode(), PgSslMode::VerifyFull));
        let options = connect_options(&section(Some("require"))).unwrap();
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Require));
        let options = connect_options(&section(None)).unwrap();
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Prefer));

        let err = connect_options(&section(Some("sometimes"))).unwrap_err();
        assert!(matches!(err, RepoError::Validation(msg) if msg.contains("sometimes")));
    }

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern(" eng "), "%eng%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_search_term() {
        assert_eq!(search_term(Some("  ")), None);
        assert_eq!(search_term(Some(" hr ")), Some("hr"));
        assert_eq!(search_term(None), None);
    }
}
