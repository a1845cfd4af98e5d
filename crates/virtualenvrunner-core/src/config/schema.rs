//! Configuration records grouped by concern, loaded from the environment.

use super::env_keys::{observability as obv_keys, runner};
use super::loader::{env_bool, env_optional, env_or};

/// Environment-variable fallbacks for the front-end flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerEnvConfig {
    pub virtualenv_dir: Option<String>,
    pub requirements: Option<String>,
    pub requirements_update: Option<String>,
    pub index_url: Option<String>,
}

impl RunnerEnvConfig {
    pub fn from_env() -> Self {
        Self {
            virtualenv_dir: env_optional(runner::VIRTUALENV_DIR),
            requirements: env_optional(runner::VIRTUALENV_REQS),
            requirements_update: env_optional(runner::VIRTUALENV_REQS_UPDATE),
            index_url: env_optional(runner::PYPI_URL),
        }
    }
}

/// Observability: quiet, log_level, log_json
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| Self {
            quiet: env_bool(obv_keys::VIRTUALENV_RUNNER_QUIET, false),
            log_level: env_or(obv_keys::VIRTUALENV_RUNNER_LOG_LEVEL, || {
                "virtualenvrunner=warn".to_string()
            }),
            log_json: env_bool(obv_keys::VIRTUALENV_RUNNER_LOG_JSON, false),
        })
    }
}
