//! Multi-call entry point for every `run_in_virtualenv*`, `create_virtualenv*`
//! and `run_in_readonly_virtualenv*` name.

fn main() {
    std::process::exit(virtualenvrunner::run_multicall(std::env::args_os().collect()));
}
