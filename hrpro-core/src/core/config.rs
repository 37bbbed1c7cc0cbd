use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};

/// Application directory under the per-user config base
pub const APP_DIR_NAME: &str = "hrpro";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Development,
    Staging,
    Production,
}

impl AppEnv {
    /// Unknown values fall back to development
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "staging" => Self::Staging,
            _ => Self::Development,
        }
    }
}

/// `database` section of the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub host: String,
    #[serde(default = "default_pg_port")]
    pub port: u16,
    pub database: String,
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub sslmode: Option<String>,
}

fn default_pg_port() -> u16 {
    5432
}

/// Where the pool connects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Url(String),
    Section(DatabaseSection),
}

/// Seed account created at startup when missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialAdmin {
    pub username: String,
    pub password: String,
    pub role: String,
}

/// Process configuration
///
/// | Variable | Default |
/// |----------|---------|
/// | APP_ENV | development |
/// | APP_DB_CONNECTION_STRING | config file `database` section |
/// | APP_JWT_SECRET | config file `jwtSecret`, else generated |
/// | APP_ACCESS_TOKEN_EXPIRY_MINUTES | 15 |
/// | APP_REFRESH_TOKEN_EXPIRY_HOURS | 168 |
/// | APP_INITIAL_ADMIN_USERNAME / _PASSWORD / _ROLE | - / - / Admin |
/// | APP_CONFIG_DIR | $XDG_CONFIG_HOME, else $HOME/.config |
/// | APP_DATA_DIR | `<config dir>/hrpro/data` |
/// | APP_LOG_LEVEL | info |
/// | APP_LOG_DIR | stdout |
/// | APP_OPERATION_TIMEOUT_SECS | 10 |
/// | APP_BCRYPT_COST | bcrypt default |
#[derive(Debug, Clone)]
pub struct Config {
    pub env: AppEnv,
    pub database_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_hours: i64,
    pub initial_admin: InitialAdmin,
    /// `<base>/hrpro`
    pub app_dir: PathBuf,
    /// Root of the contract and logo stores
    pub data_dir: PathBuf,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub operation_timeout: Duration,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from any variable source
    pub fn from_vars<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let base_dir = var("APP_CONFIG_DIR")
            .map(PathBuf::from)
            .or_else(|| var("XDG_CONFIG_HOME").map(PathBuf::from))
            .or_else(|| var("HOME").map(|home| PathBuf::from(home).join(".config")))
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::ConfigError,
                    "cannot resolve a config directory: set APP_CONFIG_DIR",
                )
            })?;
        let app_dir = base_dir.join(APP_DIR_NAME);
        let data_dir = var("APP_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| app_dir.join("data"));

        Ok(Self {
            env: var("APP_ENV").map(|v| AppEnv::parse(&v)).unwrap_or_default(),
            database_url: var("APP_DB_CONNECTION_STRING"),
            jwt_secret: var("APP_JWT_SECRET"),
            access_token_ttl_minutes: parse_positive(var("APP_ACCESS_TOKEN_EXPIRY_MINUTES"), 15),
            refresh_token_ttl_hours: parse_positive(var("APP_REFRESH_TOKEN_EXPIRY_HOURS"), 168),
            initial_admin: InitialAdmin {
                username: var("APP_INITIAL_ADMIN_USERNAME").unwrap_or_default(),
                password: lookup("APP_INITIAL_ADMIN_PASSWORD").unwrap_or_default(),
                role: var("APP_INITIAL_ADMIN_ROLE").unwrap_or_else(|| "Admin".to_string()),
            },
            app_dir,
            data_dir,
            log_level: var("APP_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_dir: var("APP_LOG_DIR"),
            operation_timeout: Duration::from_secs(
                parse_positive(var("APP_OPERATION_TIMEOUT_SECS"), 10) as u64,
            ),
            bcrypt_cost: var("APP_BCRYPT_COST")
                .and_then(|v| v.parse().ok())
                .filter(|cost| (4..=31).contains(cost))
                .unwrap_or(bcrypt::DEFAULT_COST),
        })
    }

    pub fn config_file_path(&self) -> PathBuf {
        self.app_dir.join(CONFIG_FILE_NAME)
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnv::Production
    }

    /// Env connection string wins over the config file section
    pub fn database_target(&self, section: Option<&DatabaseSection>) -> AppResult<DatabaseTarget> {
        if let Some(url) = &self.database_url {
            return Ok(DatabaseTarget::Url(url.clone()));
        }
        section
            .cloned()
            .map(DatabaseTarget::Section)
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::ConfigError,
                    "no database configured: set APP_DB_CONNECTION_STRING or the config file database section",
                )
            })
    }
}

fn parse_positive(raw: Option<String>, default: i64) -> i64 {
    raw.and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
