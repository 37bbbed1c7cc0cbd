//! Utility module: logging, validation and small pure helpers

pub mod csv;
pub mod logger;
pub mod phone;
pub mod time;
pub mod validation;

pub use logger::init_logger;
pub use phone::normalize_phone;
pub use time::{working_days, working_days_between};
