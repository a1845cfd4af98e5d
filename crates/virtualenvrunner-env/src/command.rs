//! User command execution inside an activated environment.

use std::fmt;
use std::process::Command;

use crate::activate::EnvVars;
use crate::error::{exit_status_code, Result, RunnerError};
use crate::platform;

/// A command line to run in the virtualenv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    /// Interpreted by the platform shell.
    Shell(String),
    /// Executed directly, no shell interpretation.
    Argv(Vec<String>),
}

impl CommandLine {
    /// A single token goes through the shell; several tokens form an argv.
    /// No tokens means nothing to run.
    pub fn from_tokens(mut tokens: Vec<String>) -> Option<Self> {
        match tokens.len() {
            0 => None,
            1 => tokens.pop().map(Self::Shell),
            _ => Some(Self::Argv(tokens)),
        }
    }

    pub fn is_shell(&self) -> bool {
        matches!(self, Self::Shell(_))
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shell(cmd) => f.write_str(cmd),
            Self::Argv(args) => f.write_str(&args.join(" ")),
        }
    }
}

/// Backend for `ActiveEnvironment::run`.
pub trait CommandRunner {
    fn run(&self, command: &CommandLine, env: &EnvVars) -> Result<()>;
}

/// Blocking execution with inherited stdio; non-zero exit is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &CommandLine, env: &EnvVars) -> Result<()> {
        let mut child = match command {
            CommandLine::Shell(cmd) => platform::shell_command(cmd),
            CommandLine::Argv(args) => {
                let Some((program, rest)) = args.split_first() else {
                    return Ok(());
                };
                let mut c = Command::new(program);
                c.args(rest);
                c
            }
        };
        child.env_clear().envs(env);

        tracing::debug!("running '{}' (shell: {})", command, command.is_shell());
        let status = child
            .status()
            .map_err(|e| RunnerError::io(command.to_string(), e))?;
        if status.success() {
            Ok(())
        } else {
            Err(RunnerError::CommandFailed {
                command: command.to_string(),
                status: exit_status_code(&status),
            })
        }
    }
}
