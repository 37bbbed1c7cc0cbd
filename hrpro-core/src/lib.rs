//! HR operations core
//!
//! Persistence, authentication, the attendance/leave/payroll engines and
//! the command surface used by the desktop shell.
//!
//! ```text
//! hrpro-core/src/
//! ├── core/          # configuration, config file, service wiring
//! ├── auth/          # JWT, bcrypt, login/refresh, role gate
//! ├── audit/         # best-effort audit recorder
//! ├── db/            # repository traits, Postgres and in-process stores
//! ├── services/      # business engines
//! ├── commands/      # shell-facing operations
//! ├── storage/       # contract and logo files
//! └── utils/         # logging, validation, phone, calendar, CSV
//! ```

pub mod audit;
pub mod auth;
pub mod commands;
pub mod core;
pub mod db;
pub mod services;
pub mod storage;
pub mod utils;

pub use auth::{AuthService, Claims, JwtService};
pub use commands::{CommandError, CommandResult};
pub use self::core::{AppState, Config, StateOptions};
pub use db::{MemoryStore, PgStore, Store};

pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::init_logger;

// Security logging macro - supports tracing field syntax
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
