//! Observability: tracing init and quiet-aware logging.
//!
//! Uses `config::ObservabilityConfig` for VIRTUALENV_RUNNER_QUIET / LOG_LEVEL / LOG_JSON.
//! Events go to stderr; stdout belongs to the wrapped commands.

use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::ObservabilityConfig;

/// Quiet-mode aware info logging.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {{
        if !$crate::observability::is_quiet() {
            tracing::info!($($arg)*);
        }
    }};
}

pub fn is_quiet() -> bool {
    ObservabilityConfig::from_env().quiet
}

/// Initialize tracing. Call once at process startup; later calls are no-ops.
pub fn init_tracing() {
    let cfg = ObservabilityConfig::from_env();
    let level = if cfg.quiet {
        "virtualenvrunner=warn".to_string()
    } else {
        cfg.log_level.clone()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    };
}
