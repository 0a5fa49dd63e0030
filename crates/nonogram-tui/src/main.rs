mod cli;
mod commands;
mod config;
mod display;
mod error;
mod log_file;
mod session;
mod sink;

use std::process::ExitCode;

use clap::Parser;
use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match commands::run(&cli) {
        Ok(code) => code,
        Err(err) => {
            if cli.verbose() {
                eprintln!("nonogram: {err}");
            } else {
                eprintln!("nonogram: {}", err.generic_message());
            }
            ExitCode::FAILURE
        }
    }
}
