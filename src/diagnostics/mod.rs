/// Diagnostics: console tracing and the structured fetch log.
///
/// Console output goes through `tracing`; the level comes from
/// `CARGABOARD_LOG` and falls back to `[logging] level`. Every backend call is
/// also appended to a JSONL fetch log (see [`fetch_log`]) that `cargaboard
/// health` summarises.
pub mod fetch_log;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the console filter directive.
pub const LOG_ENV: &str = "CARGABOARD_LOG";

/// Install the stderr subscriber. Safe to call more than once.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
