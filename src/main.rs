use std::env;
use std::process;

fn main() {
    wingman::cli::init_logging();
    let args: Vec<String> = env::args().collect();
    process::exit(wingman::cli::run_with_args(&args));
}
