//! Python virtualenv provisioning and command execution.
//!
//! [`provision::Provisioner`] creates (or reuses) a virtualenv, installs
//! requirements, records `pip freeze` output and hands back an
//! [`provision::ActiveEnvironment`] whose `run` executes commands with the
//! activated environment variables.

pub mod activate;
pub mod command;
pub mod error;
pub mod install;
pub mod platform;
pub mod provision;

pub use activate::{ActivatedEnv, EnvVars, EnvironmentLoader, PythonActivator};
pub use command::{CommandLine, CommandRunner, ShellRunner};
pub use error::{Result, RunnerError};
pub use provision::{ActiveEnvironment, Provisioner, ProvisionerConfig};
