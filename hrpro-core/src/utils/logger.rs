//! Logging Infrastructure
//!
//! Structured logging via `tracing`. Output goes to stdout unless a log
//! directory is configured and exists, in which case a daily rolling file
//! is used instead.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset and no level is configured
pub const DEFAULT_FILTER: &str = "hrpro_core=info,shared=info";

/// Initialize the global subscriber
///
/// `RUST_LOG` wins over `level`. Calling twice is harmless: the second
/// install fails quietly.
pub fn init_logger(level: Option<&str>, log_dir: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match level {
        Some(level) if !level.trim().is_empty() => EnvFilter::new(format!(
            "hrpro_core={level},shared={level}",
            level = level.trim()
        )),
        _ => EnvFilter::new(DEFAULT_FILTER),
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.is_dir() {
            let file_appender = tracing_appender::rolling::daily(log_path, "hrpro");
            let _ = subscriber.with_ansi(false).with_writer(file_appender).try_init();
            return;
        }
    }

    let _ = subscriber.try_init();
}
