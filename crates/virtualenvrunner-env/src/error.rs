use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RunnerError>;

/// Errors raised while provisioning or running in a virtualenv.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The activation script failed inside the worker; `kind` is the error
    /// type name the worker reported.
    #[error("{message}")]
    Activation { kind: String, message: String },

    #[error("activation worker for {script} returned no result: {detail}")]
    ActivationProtocol { script: PathBuf, detail: String },

    #[error("Command execution of '{command}' failed with exit status {status}")]
    InstallationFailed { command: String, status: i32 },

    #[error("Command '{command}' failed with exit status {status}")]
    CommandFailed { command: String, status: i32 },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RunnerError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Name shown to the user in front of the message.
    pub fn class_name(&self) -> &str {
        match self {
            Self::Activation { kind, .. } => kind,
            Self::ActivationProtocol { .. } => "ActivationFailed",
            Self::InstallationFailed { .. } => "RunnerInstallationFailed",
            Self::CommandFailed { .. } => "CommandFailed",
            Self::Io { .. } => "IOError",
        }
    }
}

/// Exit status of a finished child; signal terminations map to `-signal` on Unix.
pub(crate) fn exit_status_code(status: &std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return -sig;
        }
    }
    -1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installation_failed_message() {
        let err = RunnerError::InstallationFailed {
            command: "pip install -r reqs.txt".to_string(),
            status: 2,
        };
        assert_eq!(err.class_name(), "RunnerInstallationFailed");
        assert_eq!(
            err.to_string(),
            "Command execution of 'pip install -r reqs.txt' failed with exit status 2"
        );
    }

    #[test]
    fn test_command_failed_message() {
        let err = RunnerError::CommandFailed {
            command: "pytest -x".to_string(),
            status: 1,
        };
        assert_eq!(err.class_name(), "CommandFailed");
        assert_eq!(
            format!("{}: {}", err.class_name(), err),
            "CommandFailed: Command 'pytest -x' failed with exit status 1"
        );
    }

    #[test]
    fn test_activation_keeps_worker_kind() {
        let err = RunnerError::Activation {
            kind: "NameError".to_string(),
            message: "name 'x' is not defined".to_string(),
        };
        assert_eq!(err.class_name(), "NameError");
        assert_eq!(err.to_string(), "name 'x' is not defined");
    }
}
