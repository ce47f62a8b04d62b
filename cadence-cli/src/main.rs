//! # Cadence
//!
//! Command-line soundboard and crossfade simulator for cadence sound pools.

use log::error;

mod board;
mod cli;
mod controls;
mod error;
mod logging;
mod runner;
mod ui;

fn main() {
    let args = cli::args::build_cli().get_matches();

    // Only the TUI keeps records off the terminal.
    let interactive = matches!(args.subcommand(), Some(("play", _)));
    let log_buffer = logging::init(!interactive);

    let code = match runner::run(&args, log_buffer) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            if !logging::echoes_stderr() {
                eprintln!("error: {}", err);
            }
            -1
        }
    };

    std::process::exit(code)
}
