//! Environment-variable key constants.

/// Fallbacks consulted by the front-end when a flag is omitted.
pub mod runner {
    /// Path to the virtualenv (`--dir`).
    pub const VIRTUALENV_DIR: &str = "VIRTUALENV_DIR";
    /// Path to the requirements file (`--requirements`).
    pub const VIRTUALENV_REQS: &str = "VIRTUALENV_REQS";
    /// `TRUE`/`FALSE`, case-insensitive (`--update`).
    pub const VIRTUALENV_REQS_UPDATE: &str = "VIRTUALENV_REQS_UPDATE";
    /// Package index URL for pip and distutils (`--index`).
    pub const PYPI_URL: &str = "PYPI_URL";
}

/// Logging
pub mod observability {
    pub const VIRTUALENV_RUNNER_QUIET: &str = "VIRTUALENV_RUNNER_QUIET";
    pub const VIRTUALENV_RUNNER_LOG_LEVEL: &str = "VIRTUALENV_RUNNER_LOG_LEVEL";
    pub const VIRTUALENV_RUNNER_LOG_JSON: &str = "VIRTUALENV_RUNNER_LOG_JSON";
}
