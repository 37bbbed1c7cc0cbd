//! File payloads handed to the shell

use serde::{Deserialize, Serialize};

pub const CSV_MIME: &str = "text/csv;charset=utf-8";

/// Downloadable export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportFile {
    pub filename: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl ExportFile {
    pub fn csv(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: CSV_MIME.to_string(),
            content,
        }
    }
}

/// Stored file read back from the file store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub path: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}
