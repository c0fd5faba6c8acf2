//! The `genapi` binary: generates typed API clients from the command line.

fn main() {
    std::process::exit(genapi_cli::run_cli(std::env::args().collect()));
}
