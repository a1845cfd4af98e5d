//! Environment Provisioner.
//!
//! `Provisioner::enter` guarantees a usable virtualenv at the target
//! directory, in order:
//! 1. create it with `virtualenv` when `activate_this.py` is missing;
//! 2. write `pydistutils.cfg` for the package index (volatile only);
//! 3. prepare the activated environment (lazy, see [`ActivatedEnv`]);
//! 4. install requirements and append `pip freeze` to the requirements log
//!    (volatile + requirements only);
//! 5. write `pip freeze` to the save-freeze path when one was requested.
//!
//! The returned [`ActiveEnvironment`] runs commands with the activated
//! variables; dropping it ends the lifetime (temporary directories are
//! removed then).

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use virtualenvrunner_core::info_log;

use crate::activate::{ActivatedEnv, EnvVars, EnvironmentLoader, PythonActivator};
use crate::command::{CommandLine, CommandRunner, ShellRunner};
use crate::error::{Result, RunnerError};
use crate::install::{run_in_install, LogSink, StderrMode, WriteMode};
use crate::platform;

pub const DEFAULT_VIRTUALENV_EXE: &str = "virtualenv";
pub const FREEZE_COMMAND: &str = "pip freeze";
const UPGRADE_ARGS: &str = "--upgrade --upgrade-strategy only-if-needed ";

/// Inputs of one provisioning run. Immutable once handed to [`Provisioner`].
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    /// Target directory; `<cwd>/.venv` (or a fresh temp dir) when `None`.
    pub directory: Option<PathBuf>,
    pub requirements: Option<String>,
    /// Pass `--upgrade --upgrade-strategy only-if-needed` to pip.
    pub upgrade: bool,
    /// Interpreter handed to `virtualenv -p`; `python[.exe]` when `None`.
    pub python: Option<String>,
    pub index_url: Option<String>,
    pub save_freeze_path: Option<PathBuf>,
    /// Only a freshly created environment counts as volatile.
    pub readonly: bool,
    /// Echo install and freeze output to stdout as well as the logs.
    pub verbose: bool,
    /// Without an explicit directory, provision into a temporary directory
    /// that is removed when the environment goes out of scope.
    pub temporary: bool,
    pub virtualenv_exe: String,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            directory: None,
            requirements: None,
            upgrade: false,
            python: None,
            index_url: None,
            save_freeze_path: None,
            readonly: false,
            verbose: false,
            temporary: false,
            virtualenv_exe: DEFAULT_VIRTUALENV_EXE.to_string(),
        }
    }
}

impl ProvisionerConfig {
    pub fn python(&self) -> String {
        self.python.clone().unwrap_or_else(platform::default_python)
    }

    /// Whether installation and freeze logging may run this time.
    pub fn is_volatile(&self, new_virtualenv: bool) -> bool {
        new_virtualenv || (!self.readonly && self.requirements.is_some())
    }

    pub fn create_command(&self, directory: &Path) -> String {
        format!(
            "{} --no-download -p {} {}",
            self.virtualenv_exe,
            self.python(),
            directory.display()
        )
    }

    /// `None` without a requirements file.
    pub fn install_command(&self) -> Option<String> {
        let requirements = self.requirements.as_ref()?;
        let upgrade = if self.upgrade { UPGRADE_ARGS } else { "" };
        let index = self
            .index_url
            .as_ref()
            .map(|url| format!(" -i {}", url))
            .unwrap_or_default();
        Some(format!("pip install {}-r {}{}", upgrade, requirements, index))
    }
}

/// File locations inside a virtualenv directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualenvLayout {
    directory: PathBuf,
}

impl VirtualenvLayout {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn activate_this(&self) -> PathBuf {
        self.directory
            .join(platform::virtualenv_bin())
            .join("activate_this.py")
    }

    pub fn pydistutils_cfg(&self) -> PathBuf {
        self.directory
            .join(format!("{}pydistutils.cfg", platform::hidden_prefix()))
    }

    pub fn requirements_log_file(&self) -> PathBuf {
        self.directory.join(format!(
            "{}virtualenvrunner_requirements.log",
            platform::hidden_prefix()
        ))
    }

    /// The activation script is the only evidence of an existing environment.
    pub fn is_provisioned(&self) -> bool {
        self.activate_this().is_file()
    }
}

pub struct Provisioner {
    config: ProvisionerConfig,
    layout: VirtualenvLayout,
    temp_dir: Option<TempDir>,
    loader: Box<dyn EnvironmentLoader>,
    runner: Box<dyn CommandRunner>,
    echo: Option<Box<dyn Write>>,
}

impl Provisioner {
    /// Resolve the target directory and wire the default activator and
    /// shell runner.
    pub fn new(config: ProvisionerConfig) -> Result<Self> {
        let (directory, temp_dir) = match (&config.directory, config.temporary) {
            (Some(dir), _) => (dir.clone(), None),
            (None, true) => {
                let tmp = tempfile::Builder::new()
                    .prefix("venv_")
                    .tempdir()
                    .map_err(|e| RunnerError::io(std::env::temp_dir(), e))?;
                (tmp.path().to_path_buf(), Some(tmp))
            }
            (None, false) => {
                let cwd = std::env::current_dir().map_err(|e| RunnerError::io(".", e))?;
                (cwd.join(".venv"), None)
            }
        };
        let loader = Box::new(PythonActivator::new(config.python()));
        Ok(Self {
            config,
            layout: VirtualenvLayout::new(directory),
            temp_dir,
            loader,
            runner: Box::new(ShellRunner),
            echo: None,
        })
    }

    pub fn with_loader(mut self, loader: Box<dyn EnvironmentLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_runner(mut self, runner: Box<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Where verbose install and freeze output is echoed; stdout by default.
    pub fn with_echo(mut self, echo: Box<dyn Write>) -> Self {
        self.echo = Some(echo);
        self
    }

    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    pub fn layout(&self) -> &VirtualenvLayout {
        &self.layout
    }

    pub fn virtualenv_dir(&self) -> &Path {
        self.layout.directory()
    }

    /// Delete the virtualenv directory; a missing directory is not an error.
    pub fn remove_virtualenv(&self) {
        let dir = self.layout.directory();
        match fs::remove_dir_all(dir) {
            Ok(()) => info_log!("Removed virtualenv {}", dir.display()),
            Err(e) => tracing::debug!("remove {}: {}", dir.display(), e),
        }
    }

    /// Provision and enter the environment's lifetime.
    pub fn enter(mut self) -> Result<ActiveEnvironment> {
        let echo = self.echo.take();
        let mut sink = if self.config.verbose {
            LogSink::echoing(echo.unwrap_or_else(|| Box::new(io::stdout())))
        } else {
            LogSink::new()
        };
        let new_virtualenv = self.create_virtualenv_if_needed(&mut sink)?;
        let volatile = self.config.is_volatile(new_virtualenv);
        tracing::debug!(
            "virtualenv {} new={} volatile={}",
            self.layout.directory().display(),
            new_virtualenv,
            volatile
        );
        self.set_pydistutils_cfg_if_needed(volatile)?;

        let Provisioner {
            config,
            layout,
            temp_dir,
            loader,
            runner,
            ..
        } = self;
        let active = ActiveEnvironment {
            activated: ActivatedEnv::new(layout.activate_this(), loader),
            layout,
            runner,
            temp_dir,
        };
        active.install_requirements_and_freeze_if_needed(&config, &mut sink, volatile)?;
        Ok(active)
    }

    fn create_virtualenv_if_needed(&self, sink: &mut LogSink) -> Result<bool> {
        if self.layout.is_provisioned() {
            return Ok(false);
        }
        let cmd = self.config.create_command(self.layout.directory());
        info_log!("Creating virtualenv: {}", cmd);
        run_in_install(sink, &cmd, StderrMode::Merge, None)?;
        Ok(true)
    }

    fn set_pydistutils_cfg_if_needed(&self, volatile: bool) -> Result<()> {
        let Some(url) = self.config.index_url.as_deref() else {
            return Ok(());
        };
        if !volatile {
            return Ok(());
        }
        let path = self.layout.pydistutils_cfg();
        fs::write(&path, format!("[easy_install]\nindex_url={}\n", url))
            .map_err(|e| RunnerError::io(&path, e))
    }
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("config", &self.config)
            .field("layout", &self.layout)
            .finish()
    }
}

/// A provisioned environment for the duration of its scope.
pub struct ActiveEnvironment {
    layout: VirtualenvLayout,
    activated: ActivatedEnv,
    runner: Box<dyn CommandRunner>,
    temp_dir: Option<TempDir>,
}

impl ActiveEnvironment {
    pub fn layout(&self) -> &VirtualenvLayout {
        &self.layout
    }

    pub fn virtualenv_dir(&self) -> &Path {
        self.layout.directory()
    }

    /// Run `command` through the injected runner with the activated variables.
    pub fn run(&self, command: &CommandLine) -> Result<()> {
        let env = self.activated.env()?;
        self.runner.run(command, env)
    }

    fn install_requirements_and_freeze_if_needed(
        &self,
        config: &ProvisionerConfig,
        sink: &mut LogSink,
        volatile: bool,
    ) -> Result<()> {
        if let (Some(install), true) = (config.install_command(), volatile) {
            let env = self.activated.env()?;
            let log = self.layout.requirements_log_file();
            info_log!("Installing requirements: {}", install);
            sink.with_log_file(&log, WriteMode::Append, |sink| {
                run_in_install(sink, &install, StderrMode::Merge, Some(env))
            })?;
            sink.with_log_file(&log, WriteMode::Append, |sink| {
                sink.with_banner(|sink| {
                    sink.write_line("pip freeze:\n")?;
                    run_in_install(sink, FREEZE_COMMAND, StderrMode::Merge, Some(env))
                })
            })?;
            info_log!("Appended pip freeze to {}", log.display());
        }

        if let Some(path) = &config.save_freeze_path {
            let env = self.activated.env()?;
            sink.with_log_file(path, WriteMode::Truncate, |sink| {
                run_in_install(sink, FREEZE_COMMAND, StderrMode::Discard, Some(env))
            })?;
        }
        Ok(())
    }
}

impl Drop for ActiveEnvironment {
    fn drop(&mut self) {
        if let Some(tmp) = self.temp_dir.take() {
            let path = tmp.path().to_path_buf();
            if let Err(e) = tmp.close() {
                tracing::warn!("failed to remove temporary virtualenv {}: {}", path.display(), e);
            }
        }
    }
}

impl std::fmt::Debug for ActiveEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveEnvironment")
            .field("layout", &self.layout)
            .field("activated", &self.activated)
            .finish()
    }
}
