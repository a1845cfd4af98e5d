//! virtualenvrunner front-end, shared by every binary.
//!
//! Each entry point name (`run_in_virtualenv`, `create_virtualenv3.7`, ...)
//! resolves to a flavour and an interpreter through [`versions::EntryPointRegistry`].

pub mod cli;
pub mod commands;
pub mod versions;

use std::ffi::OsString;
use std::path::Path;

use versions::EntryPointRegistry;

/// Exit status for an unknown entry point name.
const USAGE_EXIT: i32 = 2;

/// Parse `args` (program name first) for the entry point `name` and run it.
/// Returns the process exit status.
pub fn run_entry_point<I, T>(name: &str, args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    virtualenvrunner_core::observability::init_tracing();

    let Some(entry) = EntryPointRegistry::global().get(name) else {
        eprintln!("unknown entry point '{}'", name);
        return USAGE_EXIT;
    };
    let cmd = cli::command_for(&entry.name, entry.flavour, &entry.python_label());
    let args = match cli::parse_args(cmd, args) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return e.exit_code();
        }
    };

    match commands::execute(entry, args) {
        Ok(()) => 0,
        Err(e) => {
            tracing::debug!("{} failed: {:?}", entry.name, e);
            println!("{}", commands::format_error(&e));
            1
        }
    }
}

/// Dispatch on the invoked program name, or on the first argument when the
/// multi-call binary is run under its own name.
pub fn run_multicall(args: Vec<OsString>) -> i32 {
    let registry = EntryPointRegistry::global();
    if let Some(entry) = args
        .first()
        .and_then(|program| registry.for_program(Path::new(program)))
    {
        return run_entry_point(&entry.name, args);
    }
    if let Some(entry) = args
        .get(1)
        .and_then(|name| name.to_str())
        .and_then(|name| registry.get(name))
    {
        return run_entry_point(&entry.name, args.into_iter().skip(1));
    }

    eprintln!("usage: virtualenvrunner <entry point> [options] [commandline...]");
    eprintln!("entry points:");
    for name in registry.names() {
        eprintln!("  {}", name);
    }
    USAGE_EXIT
}
