//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter, e.g. `LUMPCHECK_LOG=lumpcheck_core=debug`.
pub const LOG_ENV: &str = "LUMPCHECK_LOG";

/// Install the stderr subscriber. Falls back to `info` when `LUMPCHECK_LOG`
/// is unset or invalid; `verbose` raises the fallback to `debug`. Safe to
/// call more than once.
pub fn init_tracing(verbose: bool) {
    INIT.call_once(|| {
        let fallback = if verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .init();
    });
}
