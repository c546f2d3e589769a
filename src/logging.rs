//! Logging setup.
//!
//! Console output via `tracing-subscriber`'s fmt layer. The filter comes from
//! `RUST_LOG` when set, otherwise from the configured level (`--log-level` or
//! `logging.level`), which accepts any `EnvFilter` directive such as `debug`
//! or `retro_dash::poller=debug,info`.

use std::env;

use tracing_subscriber::EnvFilter;

use crate::error::DashError;

/// Build the filter: `env_override` (normally `RUST_LOG`) wins over `level`.
pub fn build_filter(level: &str, env_override: Option<&str>) -> Result<EnvFilter, DashError> {
    let directives = env_override.filter(|s| !s.trim().is_empty()).unwrap_or(level);
    EnvFilter::try_new(directives).map_err(|e| DashError::LoggingInit(format!("invalid log filter '{directives}': {e}")))
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(level: &str) -> Result<(), DashError> {
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(level, rust_log.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| DashError::LoggingInit(e.to_string()))
}
