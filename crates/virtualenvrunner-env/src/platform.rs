//! Platform-dependent names and shell invocation.

use std::process::Command;

pub fn is_windows() -> bool {
    cfg!(windows)
}

pub fn exe_suffix() -> &'static str {
    if is_windows() {
        ".exe"
    } else {
        ""
    }
}

/// Directory holding the virtualenv's scripts and `activate_this.py`.
pub fn virtualenv_bin() -> &'static str {
    if is_windows() {
        "Scripts"
    } else {
        "bin"
    }
}

/// Hidden-file prefix for files the runner writes into the virtualenv.
pub fn hidden_prefix() -> &'static str {
    if is_windows() {
        ""
    } else {
        "."
    }
}

pub fn default_python() -> String {
    format!("python{}", exe_suffix())
}

/// A `Command` that runs `cmd` through the platform shell.
pub fn shell_command(cmd: &str) -> Command {
    if is_windows() {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}
