//! Shared types for the HR backend
//!
//! Domain models, the unified error system and small helpers used by
//! hrpro-core and the desktop shell.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCode};
pub use serde::{Deserialize, Serialize};
