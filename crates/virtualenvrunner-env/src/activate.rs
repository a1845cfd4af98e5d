//! Environment Activator: harvest the variables an `activate_this.py` sets.
//!
//! Activation mutates process-global state, so it never runs in this process.
//! A worker interpreter executes the script in a fresh namespace and sends a
//! single JSON message back over its stdout pipe: either the resulting
//! `os.environ` or the error it raised. The parent blocks on the pipe and
//! re-raises a forwarded error with its original type name and message.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;

use crate::error::{exit_status_code, Result, RunnerError};
use crate::platform;

pub type EnvVars = HashMap<String, String>;

/// Worker program. Output of the activation script itself goes to stderr so
/// the result message is the only thing on stdout.
const WORKER_BOOTSTRAP: &str = r#"import json, os, sys
path = sys.argv[1]
channel = sys.stdout
sys.stdout = sys.stderr
try:
    with open(path) as f:
        code = compile(f.read(), path, 'exec')
    exec(code, dict(__file__=path))
    result = {'env': dict(os.environ)}
except Exception as e:
    result = {'error': {'kind': e.__class__.__name__, 'message': str(e)}}
sys.stdout = channel
channel.write(json.dumps(result))
channel.flush()
"#;

/// Produces the environment that is in effect after activating a virtualenv.
pub trait EnvironmentLoader {
    fn load(&self, activate_this: &Path) -> Result<EnvVars>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum WorkerMessage {
    Env(EnvVars),
    Error(WorkerError),
}

#[derive(Debug, Deserialize)]
struct WorkerError {
    kind: String,
    message: String,
}

impl WorkerMessage {
    fn into_result(self) -> Result<EnvVars> {
        match self {
            Self::Env(env) => Ok(env),
            Self::Error(e) => Err(RunnerError::Activation {
                kind: e.kind,
                message: e.message,
            }),
        }
    }
}

/// Runs the activation script in a separate Python process.
#[derive(Debug, Clone)]
pub struct PythonActivator {
    python: String,
}

impl PythonActivator {
    /// `python` is used when the virtualenv has no interpreter of its own
    /// next to the activation script.
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    fn interpreter_for(&self, activate_this: &Path) -> PathBuf {
        let own = activate_this
            .parent()
            .map(|bin| bin.join(format!("python{}", platform::exe_suffix())));
        match own {
            Some(p) if p.is_file() => p,
            _ => which::which(&self.python).unwrap_or_else(|_| PathBuf::from(&self.python)),
        }
    }
}

impl EnvironmentLoader for PythonActivator {
    fn load(&self, activate_this: &Path) -> Result<EnvVars> {
        let interpreter = self.interpreter_for(activate_this);
        tracing::debug!(
            "Activating {} with {}",
            activate_this.display(),
            interpreter.display()
        );

        let mut child = Command::new(&interpreter)
            .arg("-c")
            .arg(WORKER_BOOTSTRAP)
            .arg(activate_this)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| RunnerError::io(&interpreter, e))?;

        let mut raw = Vec::new();
        if let Some(mut channel) = child.stdout.take() {
            channel
                .read_to_end(&mut raw)
                .map_err(|e| RunnerError::io(&interpreter, e))?;
        }
        let status = child
            .wait()
            .map_err(|e| RunnerError::io(&interpreter, e))?;

        let message: WorkerMessage =
            serde_json::from_slice(&raw).map_err(|e| RunnerError::ActivationProtocol {
                script: activate_this.to_path_buf(),
                detail: format!("{} (worker exit status {})", e, exit_status_code(&status)),
            })?;
        message.into_result()
    }
}

/// Lazily activated environment; the loader runs at most once.
pub struct ActivatedEnv {
    activate_this: PathBuf,
    loader: Box<dyn EnvironmentLoader>,
    env: OnceCell<EnvVars>,
}

impl ActivatedEnv {
    pub fn new(activate_this: impl Into<PathBuf>, loader: Box<dyn EnvironmentLoader>) -> Self {
        Self {
            activate_this: activate_this.into(),
            loader,
            env: OnceCell::new(),
        }
    }

    pub fn activate_this(&self) -> &Path {
        &self.activate_this
    }

    pub fn env(&self) -> Result<&EnvVars> {
        if let Some(env) = self.env.get() {
            return Ok(env);
        }
        let env = self.loader.load(&self.activate_this)?;
        Ok(self.env.get_or_init(|| env))
    }
}

impl std::fmt::Debug for ActivatedEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivatedEnv")
            .field("activate_this", &self.activate_this)
            .field("loaded", &self.env.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingLoader {
        calls: Rc<Cell<usize>>,
    }

    impl EnvironmentLoader for CountingLoader {
        fn load(&self, _activate_this: &Path) -> Result<EnvVars> {
            self.calls.set(self.calls.get() + 1);
            Ok(EnvVars::from([("name".to_string(), "value".to_string())]))
        }
    }

    struct FailingLoader;

    impl EnvironmentLoader for FailingLoader {
        fn load(&self, _activate_this: &Path) -> Result<EnvVars> {
            Err(RunnerError::Activation {
                kind: "FileNotFoundError".to_string(),
                message: "missing".to_string(),
            })
        }
    }

    #[test]
    fn test_env_is_loaded_once() {
        let calls = Rc::new(Cell::new(0));
        let activated = ActivatedEnv::new(
            "venv/bin/activate_this.py",
            Box::new(CountingLoader {
                calls: Rc::clone(&calls),
            }),
        );
        assert_eq!(calls.get(), 0);
        assert_eq!(activated.env().unwrap()["name"], "value");
        assert_eq!(activated.env().unwrap()["name"], "value");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_loader_error_propagates_unchanged() {
        let activated = ActivatedEnv::new("a", Box::new(FailingLoader));
        let err = activated.env().unwrap_err();
        assert_eq!(err.class_name(), "FileNotFoundError");
        assert_eq!(err.to_string(), "missing");
    }

    #[test]
    fn test_worker_message_decoding() {
        let ok: WorkerMessage = serde_json::from_str(r#"{"env": {"PATH": "/venv/bin"}}"#).unwrap();
        assert_eq!(ok.into_result().unwrap()["PATH"], "/venv/bin");

        let err: WorkerMessage =
            serde_json::from_str(r#"{"error": {"kind": "IOError", "message": "message"}}"#)
                .unwrap();
        let err = err.into_result().unwrap_err();
        assert_eq!(err.class_name(), "IOError");
        assert_eq!(err.to_string(), "message");
    }

    fn host_python() -> Option<PathBuf> {
        which::which("python3").or_else(|_| which::which("python")).ok()
    }

    #[test]
    fn test_python_activator_harvests_environment() {
        let Some(python) = host_python() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("activate_this.py");
        std::fs::write(&script, "import os\nos.environ['name'] = 'value'\nprint('noise')\n")
            .unwrap();

        let env = PythonActivator::new(python.to_string_lossy())
            .load(&script)
            .unwrap();
        assert_eq!(env["name"], "value");
        assert!(std::env::var("name").is_err());
    }

    #[test]
    fn test_python_activator_forwards_script_error() {
        let Some(python) = host_python() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("activate_this.py");
        std::fs::write(&script, "raise ValueError('bad activation')\n").unwrap();

        let err = PythonActivator::new(python.to_string_lossy())
            .load(&script)
            .unwrap_err();
        assert_eq!(err.class_name(), "ValueError");
        assert_eq!(err.to_string(), "bad activation");
    }

    #[test]
    fn test_python_activator_missing_script() {
        let Some(python) = host_python() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let err = PythonActivator::new(python.to_string_lossy())
            .load(&dir.path().join("bin").join("activate_this.py"))
            .unwrap_err();
        assert!(matches!(err, RunnerError::Activation { .. }));
        assert!(err.to_string().contains("No such file"));
    }
}
