use std::ffi::OsString;
use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches, Parser};

/// Which of the three commands an entry point runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavour {
    /// Provision, then run the trailing command line.
    Run,
    /// Provision only.
    Create,
    /// Run without installing into an existing virtualenv.
    Readonly,
}

impl Flavour {
    pub const ALL: [Flavour; 3] = [Flavour::Run, Flavour::Create, Flavour::Readonly];

    pub fn base_name(self) -> &'static str {
        match self {
            Self::Run => "run_in_virtualenv",
            Self::Create => "create_virtualenv",
            Self::Readonly => "run_in_readonly_virtualenv",
        }
    }

    /// `--recreate` is ignored by the readonly flavour.
    pub fn honours_recreate(self) -> bool {
        !matches!(self, Self::Readonly)
    }

    pub fn description(self, python: &str) -> String {
        match self {
            Self::Create => format!("Creates {} virtualenv.", python),
            Self::Run | Self::Readonly => format!("Runner for {} virtualenv.", python),
        }
    }
}

/// Flags shared by every entry point.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerArgs {
    /// URL to PyPI to be used by both pip and distutils. Overrides PYPI_URL environmental variable.
    #[arg(long, short = 'i', value_name = "URL")]
    pub index: Option<String>,

    /// Path to the requirements file. Overrides VIRTUALENV_REQS environmental variable.
    #[arg(long, short = 'r', value_name = "PATH")]
    pub requirements: Option<String>,

    /// Path to the virtualenv. Overrides VIRTUALENV_DIR environmental variable.
    #[arg(long, short = 'd', value_name = "PATH")]
    pub dir: Option<String>,

    /// Path to 'pip freeze' file
    #[arg(long, short = 's', value_name = "PATH")]
    pub save_freeze_path: Option<PathBuf>,

    /// Boolean value (TRUE or FALSE). Overrides VIRTUALENV_REQS_UPDATE environmental variable.
    #[arg(long, short = 'u')]
    pub update: bool,

    /// Force recreation of virtual environments
    #[arg(long)]
    pub recreate: bool,

    /// Verbose pip install and freeze
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Optional command line to be executed in virtualenv
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMANDLINE")]
    pub commandline: Vec<String>,
}

/// The clap command for one entry point; help text follows the flavour.
pub fn command_for(name: &str, flavour: Flavour, python: &str) -> clap::Command {
    let cmd = RunnerArgs::command()
        .name(name.to_string())
        .bin_name(name.to_string())
        .about(flavour.description(python));
    match flavour {
        Flavour::Run => cmd,
        Flavour::Create => cmd.mut_arg("commandline", |a| {
            a.help("Optional command line without effect")
        }),
        Flavour::Readonly => cmd
            .mut_arg("update", |a| a.help("No effect"))
            .mut_arg("recreate", |a| a.help("No effect")),
    }
}

/// Parse `args` (program name first) against `cmd`.
pub fn parse_args<I, T>(cmd: clap::Command, args: I) -> Result<RunnerArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut cmd = cmd;
    let matches = cmd.try_get_matches_from_mut(args)?;
    RunnerArgs::from_arg_matches(&matches).map_err(|e| e.format(&mut cmd))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(flavour: Flavour, args: &[&str]) -> RunnerArgs {
        let name = flavour.base_name();
        let argv = std::iter::once(name).chain(args.iter().copied());
        parse_args(command_for(name, flavour, "python"), argv).unwrap()
    }

    #[test]
    fn test_verify_command() {
        for flavour in Flavour::ALL {
            command_for(flavour.base_name(), flavour, "python3.7").debug_assert();
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(parse(Flavour::Run, &[]), RunnerArgs::default());
    }

    #[test]
    fn test_all_flags() {
        let args = parse(
            Flavour::Run,
            &[
                "-i", "http://idx", "-r", "reqs.txt", "-d", "venv", "-s", "out.txt", "-u",
                "--recreate", "-v", "echo", "hi",
            ],
        );
        assert_eq!(args.index.as_deref(), Some("http://idx"));
        assert_eq!(args.requirements.as_deref(), Some("reqs.txt"));
        assert_eq!(args.dir.as_deref(), Some("venv"));
        assert_eq!(args.save_freeze_path, Some(PathBuf::from("out.txt")));
        assert!(args.update && args.recreate && args.verbose);
        assert_eq!(args.commandline, vec!["echo", "hi"]);
    }

    #[test]
    fn test_commandline_keeps_its_own_flags() {
        let args = parse(Flavour::Run, &["-v", "pytest", "-v", "--index", "x"]);
        assert!(args.verbose);
        assert_eq!(args.index, None);
        assert_eq!(args.commandline, vec!["pytest", "-v", "--index", "x"]);
    }

    #[test]
    fn test_long_option_names() {
        let args = parse(
            Flavour::Create,
            &[
                "--index",
                "u",
                "--requirements",
                "r",
                "--dir",
                "d",
                "--save-freeze-path",
                "s",
                "--update",
            ],
        );
        assert_eq!(args.index.as_deref(), Some("u"));
        assert_eq!(args.requirements.as_deref(), Some("r"));
        assert_eq!(args.dir.as_deref(), Some("d"));
        assert_eq!(args.save_freeze_path, Some(PathBuf::from("s")));
        assert!(args.update);
    }

    #[test]
    fn test_help_follows_flavour() {
        let run = command_for("run_in_virtualenv3.7", Flavour::Run, "python3.7")
            .render_help()
            .to_string();
        assert!(run.contains("Runner for python3.7 virtualenv."));
        assert!(run.contains("Optional command line to be executed in virtualenv"));

        let create = command_for("create_virtualenv", Flavour::Create, "python")
            .render_help()
            .to_string();
        assert!(create.contains("Creates python virtualenv."));
        assert!(create.contains("Optional command line without effect"));

        let readonly = command_for("run_in_readonly_virtualenv", Flavour::Readonly, "python")
            .render_help()
            .to_string();
        assert!(readonly.contains("No effect"));
        assert!(!readonly.contains("Force recreation"));
    }
}
