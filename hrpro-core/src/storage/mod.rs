//! Local file storage for contracts and the company logo

pub mod files;

pub use files::{FileStore, contract_path, extension_of, logo_path, sanitize_filename};
