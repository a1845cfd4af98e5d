//! `create_virtualenv` for the default `python` interpreter.

fn main() {
    std::process::exit(virtualenvrunner::run_entry_point(
        "create_virtualenv",
        std::env::args_os(),
    ));
}
