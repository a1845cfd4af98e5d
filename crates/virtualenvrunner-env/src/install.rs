//! Installation / freeze executor.
//!
//! Runs a shell command and streams its output, line by line as it arrives,
//! into every log file currently open in the [`LogSink`]. A non-zero exit
//! status becomes [`RunnerError::InstallationFailed`].

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};

use crate::activate::EnvVars;
use crate::error::{exit_status_code, Result, RunnerError};
use crate::platform;

/// Width of the `#` bars around the freeze section of the requirements log.
pub const BANNER_LENGTH: usize = 20;

const ECHO_TARGET: &str = "<stdout>";

/// What happens to the command's standard error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StderrMode {
    /// Written to the same pipe as stdout, in the order the child emits it.
    Merge,
    /// Sent to the null device.
    Discard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Append,
    Truncate,
}

impl WriteMode {
    fn open(self, path: &Path) -> io::Result<File> {
        let mut options = OpenOptions::new();
        match self {
            Self::Append => options.create(true).append(true),
            Self::Truncate => options.create(true).write(true).truncate(true),
        };
        options.open(path)
    }
}

#[derive(Debug)]
struct OpenLog {
    path: PathBuf,
    file: File,
}

/// Log files currently open for install output, plus the optional verbose echo.
///
/// Handles form a stack: nested scopes may be open at the same time and each
/// scope removes exactly the handle it added.
#[derive(Default)]
pub struct LogSink {
    files: Vec<OpenLog>,
    echo: Option<Box<dyn Write>>,
}

impl LogSink {
    /// Logs only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs plus a copy of every line on `echo`.
    pub fn echoing(echo: Box<dyn Write>) -> Self {
        Self {
            files: Vec::new(),
            echo: Some(echo),
        }
    }

    pub fn open_handles(&self) -> usize {
        self.files.len()
    }

    /// Write `line` to every open log and to the echo target.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        for log in &mut self.files {
            log.file
                .write_all(line.as_bytes())
                .map_err(|e| RunnerError::io(&log.path, e))?;
        }
        if let Some(echo) = self.echo.as_mut() {
            echo.write_all(line.as_bytes())
                .and_then(|()| echo.flush())
                .map_err(|e| RunnerError::io(ECHO_TARGET, e))?;
        }
        Ok(())
    }

    /// Run `body` with `path` open for writing.
    ///
    /// If the file cannot be opened the failure is reported on the console and
    /// `body` runs without it; this holds for the requirements log and the
    /// save-freeze file alike. I/O errors on the file while it is open are
    /// reported and propagated.
    pub fn with_log_file<T, F>(&mut self, path: &Path, mode: WriteMode, body: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let file = match mode.open(path) {
            Ok(f) => f,
            Err(e) => {
                report_file_error(path, &e);
                return body(self);
            }
        };

        self.files.push(OpenLog {
            path: path.to_path_buf(),
            file,
        });
        let depth = self.files.len();
        let result = body(self);
        self.files.truncate(depth.saturating_sub(1));

        if let Err(RunnerError::Io { path: failed, source }) = &result {
            if failed == path {
                report_file_error(path, source);
            }
        }
        result
    }

    /// Surround `body` output with `#` bars; the closing bar is written even
    /// when `body` fails.
    pub fn with_banner<T, F>(&mut self, body: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let bar = "#".repeat(BANNER_LENGTH);
        self.write_line(&format!("\n{}\n", bar))?;
        let result = body(self);
        let closing = self.write_line(&format!("{}\n", bar));
        let value = result?;
        closing?;
        Ok(value)
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink")
            .field("files", &self.files)
            .field("echo", &self.echo.is_some())
            .finish()
    }
}

fn report_file_error(path: &Path, err: &io::Error) {
    let errno = err
        .raw_os_error()
        .map_or_else(|| "-".to_string(), |n| n.to_string());
    let text = err.to_string();
    let strerror = text.split(" (os error").next().unwrap_or(&text);
    println!(
        "Error in {} file operation: Error #{} - {}",
        path.display(),
        errno,
        strerror
    );
    tracing::warn!("log file {} unavailable: {}", path.display(), err);
}

/// Decode raw bytes from a child pipe; invalid UTF-8 is replaced, not rejected.
pub fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn abort(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Run `cmd` through the shell, streaming its output into `sink`.
///
/// `env` replaces the child's whole environment when given.
pub fn run_in_install(
    sink: &mut LogSink,
    cmd: &str,
    stderr: StderrMode,
    env: Option<&EnvVars>,
) -> Result<()> {
    tracing::debug!("install step: {}", cmd);

    let mut command = platform::shell_command(cmd);
    command.stdin(Stdio::null());
    if let Some(env) = env {
        command.env_clear().envs(env);
    }

    let (mut child, output): (Child, Box<dyn Read>) = match stderr {
        StderrMode::Merge => {
            let (reader, writer) = io::pipe().map_err(|e| RunnerError::io(cmd, e))?;
            let writer_err = writer.try_clone().map_err(|e| RunnerError::io(cmd, e))?;
            command.stdout(writer).stderr(writer_err);
            let child = command.spawn().map_err(|e| RunnerError::io(cmd, e))?;
            (child, Box::new(reader))
        }
        StderrMode::Discard => {
            command.stdout(Stdio::piped()).stderr(Stdio::null());
            let mut child = command.spawn().map_err(|e| RunnerError::io(cmd, e))?;
            let Some(out) = child.stdout.take() else {
                abort(&mut child);
                return Err(RunnerError::io(cmd, io::Error::other("stdout not captured")));
            };
            (child, Box::new(out))
        }
    };
    // The command still holds the parent's copies of the pipe writers; the
    // reader only sees EOF once they are closed.
    drop(command);

    let mut reader = BufReader::new(output);
    let mut raw = Vec::new();
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                abort(&mut child);
                return Err(RunnerError::io(cmd, e));
            }
        }
        if let Err(e) = sink.write_line(&decode_line(&raw)) {
            abort(&mut child);
            return Err(e);
        }
    }

    let status = child.wait().map_err(|e| RunnerError::io(cmd, e))?;
    verify_status(cmd, &status)
}

fn verify_status(cmd: &str, status: &std::process::ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    Err(RunnerError::InstallationFailed {
        command: cmd.to_string(),
        status: exit_status_code(status),
    })
}
