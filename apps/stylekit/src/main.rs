//! Stylekit CLI binary entry point.
//! Parses arguments, sets up logging, and exits with the command's code.

use clap::Parser;
use stylekit::cli::Cli;
use stylekit::{app, logging};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    std::process::exit(app::guarded(|| app::run(cli)));
}
