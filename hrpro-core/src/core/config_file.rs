//! Persisted JSON config file
//!
//! Holds the optional database section and the JWT secret. Writes go
//! through a temp file in the same directory, are fsynced, renamed over the
//! target and followed by a directory fsync, so a crash never leaves a
//! truncated file behind.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};

use super::config::DatabaseSection;

/// Random bytes behind a generated secret
const JWT_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseSection>,
    #[serde(rename = "jwtSecret", default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
}

impl ConfigFile {
    /// Missing file reads as the empty config
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(AppError::config(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&raw)
            .map_err(|e| AppError::config(format!("invalid config file {}: {e}", path.display())))
    }

    pub fn save_atomic(&self, path: &Path) -> AppResult<()> {
        let dir = path
            .parent()
            .ok_or_else(|| AppError::config(format!("{} has no parent dir", path.display())))?;
        fs::create_dir_all(dir).map_err(|e| io_error("create config dir", dir, e))?;
        restrict_dir(dir)?;

        let body = serde_json::to_vec_pretty(self)
            .map_err(|e| AppError::internal(format!("serialize config: {e}")))?;
        let tmp = temp_path(path);
        let result = write_synced(&tmp, &body).and_then(|_| {
            fs::rename(&tmp, path).map_err(|e| io_error("rename config", path, e))
        });
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result?;

        // make the rename durable
        File::open(dir)
            .and_then(|d| d.sync_all())
            .map_err(|e| io_error("sync config dir", dir, e))
    }
}

/// Resolve the JWT signing secret
///
/// The environment value wins. Otherwise the config file's `jwtSecret` is
/// used, and when that is absent a new secret is generated and persisted
/// so later starts see the same value.
pub fn ensure_jwt_secret(env_secret: Option<&str>, path: &Path) -> AppResult<String> {
    if let Some(secret) = env_secret.map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(secret.to_string());
    }

    let mut file = ConfigFile::load(path)?;
    if let Some(secret) = file.jwt_secret.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(secret.to_string());
    }

    let mut bytes = [0u8; JWT_SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let secret = STANDARD.encode(bytes);
    file.jwt_secret = Some(secret.clone());
    file.save_atomic(path)?;
    tracing::info!(path = %path.display(), "Generated and persisted JWT secret");
    Ok(secret)
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config.json".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

fn write_synced(path: &Path, body: &[u8]) -> AppResult<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .map_err(|e| io_error("create temp config", path, e))?;
    file.write_all(body)
        .and_then(|_| file.sync_all())
        .map_err(|e| io_error("write temp config", path, e))?;
    restrict_file(path)
}

#[cfg(unix)]
fn restrict_file(path: &Path) -> AppResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|e| io_error("chmod config", path, e))
}

#[cfg(not(unix))]
fn restrict_file(_path: &Path) -> AppResult<()> {
    Ok(())
}

#[cfg(unix)]
fn restrict_dir(dir: &Path) -> AppResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
        .map_err(|e| io_error("chmod config dir", dir, e))
}

#[cfg(not(unix))]
fn restrict_dir(_dir: &Path) -> AppResult<()> {
    Ok(())
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> AppError {
    AppError::config(format!("{action} {}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_and_reuses_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hrpro").join("config.json");

        let first = ensure_jwt_secret(None, &path).unwrap();
        assert!(first.len() >= 32);
        assert!(STANDARD.decode(&first).is_ok());
        assert!(path.exists());

        let second = ensure_jwt_secret(Some("   "), &path).unwrap();
        assert_eq!(first, second);

        let stored = ConfigFile::load(&path).unwrap();
        assert_eq!(stored.jwt_secret.as_deref(), Some(first.as_str()));
    }

    #[cfg(unix)]
    #[test]
    fn test_persisted_file_modes() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let app_dir = dir.path().join("hrpro");
        let path = app_dir.join("config.json");
        ensure_jwt_secret(None, &path).unwrap();

        let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = fs::metadata(&app_dir).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn test_env_secret_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let secret = ensure_jwt_secret(Some(" from-env "), &path).unwrap();
        assert_eq!(secret, "from-env");
        assert!(!path.exists());
    }

    #[test]
    fn test_save_keeps_database_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"database":{"host":"db","database":"hr","user":"hr","sslmode":"disable"}}"#,
        )
        .unwrap();

        ensure_jwt_secret(None, &path).unwrap();
        let stored = ConfigFile::load(&path).unwrap();
        let db = stored.database.unwrap();
        assert_eq!(db.host, "db");
        assert_eq!(db.port, 5432);
        assert_eq!(db.sslmode.as_deref(), Some("disable"));
        assert!(stored.jwt_secret.is_some());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        let err = ConfigFile::load(&path).unwrap_err();
        assert_eq!(err.code, shared::error::ErrorCode::ConfigError);
    }
}
