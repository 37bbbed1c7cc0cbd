//! Filesystem store rooted at the configured data directory.
//!
//! Callers address files by a relative path. Every path is normalized and
//! must stay inside the root; anything that would escape is rejected before
//! touching the disk.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use rand::Rng;
use shared::error::{AppError, AppResult};
use shared::models::StoredFile;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Filesystem-based store for uploaded blobs
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalize `relative` and join it onto the root
    pub fn resolve(&self, relative: &str) -> AppResult<PathBuf> {
        Ok(self.root.join(normalize_relative(relative)?))
    }

    /// Write atomically: temp file, fsync, rename
    pub async fn put(&self, relative: &str, content: &[u8]) -> AppResult<()> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::storage(format!("Failed to create {}: {e}", parent.display())))?;
        }

        let tmp = path.with_extension(format!("{}.part", rand::thread_rng().r#gen::<u32>()));
        let write = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(content).await?;
            file.sync_all().await?;
            fs::rename(&tmp, &path).await?;
            Ok::<(), std::io::Error>(())
        };
        if let Err(e) = write.await {
            let _ = fs::remove_file(&tmp).await;
            return Err(AppError::storage(format!("Failed to write {relative}: {e}")));
        }
        Ok(())
    }

    pub async fn get(&self, relative: &str) -> AppResult<StoredFile> {
        let path = self.resolve(relative)?;
        let bytes = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("file {relative}"))
            } else {
                AppError::storage(format!("Failed to read {relative}: {e}"))
            }
        })?;
        Ok(StoredFile {
            path: normalize_relative(relative)?,
            mime_type: mime_guess::from_path(&path)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
            bytes,
        })
    }

    /// `false` when there was nothing to delete
    pub async fn delete(&self, relative: &str) -> AppResult<bool> {
        let path = self.resolve(relative)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::storage(format!("Failed to delete {relative}: {e}"))),
        }
    }
}

/// Normalize to a `/`-separated relative path that stays under the root
pub fn normalize_relative(relative: &str) -> AppResult<String> {
    let unified = relative.trim().replace('\\', "/");
    let mut parts: Vec<String> = Vec::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(escapes_root(relative));
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(escapes_root(relative)),
        }
    }
    if parts.is_empty() {
        return Err(AppError::validation("file path is empty"));
    }
    Ok(parts.join("/"))
}

fn escapes_root(relative: &str) -> AppError {
    AppError::validation(format!("path '{relative}' is outside the file store"))
}

/// Keep `[A-Za-z0-9._-]`, map the rest to `_`, never start with a dot
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Lowercased extension of a filename, without the dot
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename.trim())
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// `employees/<id>/contract/<nanos>-<rand>.<ext>`
pub fn contract_path(employee_id: i64, ext: &str) -> String {
    format!(
        "employees/{employee_id}/contract/{}-{:08x}.{ext}",
        unique_stamp(),
        rand::thread_rng().r#gen::<u32>()
    )
}

/// `branding/<nanos>-<sanitized name>`
pub fn logo_path(filename: &str) -> String {
    format!("branding/{}-{}", unique_stamp(), sanitize_filename(filename))
}

fn unique_stamp() -> i64 {
    let now = Utc::now();
    now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp_micros())
}
