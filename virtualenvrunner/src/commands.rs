//! The three command flavours: resolve flags against the environment
//! fallbacks, provision, then run (or just create).

use std::path::PathBuf;

use anyhow::Result;
use virtualenvrunner_core::config::{is_true_literal, RunnerEnvConfig};
use virtualenvrunner_core::info_log;
use virtualenvrunner_env::{CommandLine, Provisioner, ProvisionerConfig, RunnerError};

use crate::cli::{Flavour, RunnerArgs};
use crate::versions::EntryPoint;

/// Explicit argument, else environment fallback, else absent.
fn resolve(arg: Option<&String>, fallback: Option<&String>) -> Option<String> {
    arg.or(fallback)
        .filter(|v| !v.trim().is_empty())
        .cloned()
}

/// Build the provisioning inputs for one invocation.
pub fn provisioner_config(
    args: &RunnerArgs,
    env: &RunnerEnvConfig,
    python: Option<String>,
    flavour: Flavour,
) -> ProvisionerConfig {
    let update = if args.update {
        Some("true")
    } else {
        env.requirements_update.as_deref()
    };
    ProvisionerConfig {
        directory: resolve(args.dir.as_ref(), env.virtualenv_dir.as_ref()).map(PathBuf::from),
        requirements: resolve(args.requirements.as_ref(), env.requirements.as_ref()),
        upgrade: is_true_literal(update),
        python,
        index_url: resolve(args.index.as_ref(), env.index_url.as_ref()),
        save_freeze_path: args.save_freeze_path.clone(),
        readonly: flavour == Flavour::Readonly,
        verbose: args.verbose,
        ..Default::default()
    }
}

/// Console note for a create invocation that was given a command line.
pub fn ignored_commandline_note(commandline: &[String]) -> Option<String> {
    if commandline.is_empty() {
        None
    } else {
        Some(format!("Note: '{}' have no effect", commandline.join(" ")))
    }
}

/// Run `entry` with parsed `args`, reading fallbacks from the process environment.
pub fn execute(entry: &EntryPoint, args: RunnerArgs) -> Result<()> {
    execute_with(entry, args, &RunnerEnvConfig::from_env(), |config| {
        Provisioner::new(config)
    })
}

/// Like [`execute`], with explicit fallbacks and provisioner construction.
pub fn execute_with<F>(
    entry: &EntryPoint,
    args: RunnerArgs,
    env: &RunnerEnvConfig,
    build: F,
) -> Result<()>
where
    F: FnOnce(ProvisionerConfig) -> virtualenvrunner_env::Result<Provisioner>,
{
    let flavour = entry.flavour;
    let config = provisioner_config(&args, env, entry.python(), flavour);
    tracing::debug!("{}: {:?}", entry.name, config);

    let provisioner = build(config)?;
    if args.recreate && flavour.honours_recreate() {
        info_log!("Recreating virtualenv {}", provisioner.virtualenv_dir().display());
        provisioner.remove_virtualenv();
    }
    let active = provisioner.enter()?;

    match flavour {
        Flavour::Create => {
            if let Some(note) = ignored_commandline_note(&args.commandline) {
                println!("{}", note);
            }
        }
        Flavour::Run | Flavour::Readonly => {
            if let Some(command) = CommandLine::from_tokens(args.commandline) {
                active.run(&command)?;
            }
        }
    }
    Ok(())
}

/// `<ErrorClassName>: <message>` for the top-level error line.
pub fn format_error(err: &anyhow::Error) -> String {
    let class = err
        .downcast_ref::<RunnerError>()
        .map(RunnerError::class_name)
        .unwrap_or("Error");
    format!("{}: {}", class, err)
}
