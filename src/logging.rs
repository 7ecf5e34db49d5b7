//! Logging bootstrap.

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "FLUENTDB_LOG";

/// Install a fmt subscriber filtered by `FLUENTDB_LOG`, falling back to
/// `filter`. Returns `false` when a global subscriber was already set.
pub fn init(filter: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
