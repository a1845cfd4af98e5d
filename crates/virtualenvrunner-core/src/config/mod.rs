//! Unified configuration layer.
//!
//! Every environment-variable read goes through this module; the rest of the
//! workspace consumes structured records instead of calling `std::env::var`.
//!
//! - `loader`: `env_or`, `env_optional`, `env_bool` helpers
//! - `schema`: `RunnerEnvConfig`, `ObservabilityConfig`
//! - `env_keys`: key constants

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{env_bool, env_optional, env_or, is_true_literal};
pub use schema::{ObservabilityConfig, RunnerEnvConfig};
