//! Core module: configuration, the persisted config file and service wiring
//!
//! - [`Config`] - process configuration from the environment
//! - [`ConfigFile`] - `<config dir>/hrpro/config.json`
//! - [`AppState`] - every service over one shared store

pub mod config;
pub mod config_file;
pub mod state;

pub use config::{AppEnv, Config, DatabaseSection, DatabaseTarget, InitialAdmin};
pub use config_file::{ConfigFile, ensure_jwt_secret};
pub use state::{AppState, StateOptions};
