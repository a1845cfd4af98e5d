//! `run_in_virtualenv` for the default `python` interpreter.

fn main() {
    std::process::exit(virtualenvrunner::run_entry_point(
        "run_in_virtualenv",
        std::env::args_os(),
    ));
}
