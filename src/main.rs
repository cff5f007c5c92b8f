//! cardsend: dispatch JSON cards to pluggable agent handlers.
//!
//! This is the main entry point for the `cardsend` CLI. It parses arguments,
//! routes to the appropriate command, and maps errors to exit codes.

mod cli;
mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod handler;
pub mod payload;
pub mod registry;

#[cfg(test)]
mod test_support;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match commands::run(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
