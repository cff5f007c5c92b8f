//! CLI argument parsing for cardsend.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

/// cardsend: dispatch JSON cards to pluggable agent handlers.
///
/// Agent keys are mapped to handler modules by `cardsend.yaml`. Modules are
/// looked up in the built-in core table first, then as executables in the
/// extensions directory.
#[derive(Parser, Debug)]
#[command(name = "cardsend")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file (default: ./cardsend.yaml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Available commands for cardsend.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dispatch a card to an agent.
    ///
    /// Validates the payload, resolves the target agent, invokes its
    /// handler and prints the result.
    Send(SendArgs),

    /// Registry inspection commands.
    ///
    /// List configured agents or check that every agent resolves.
    Agents(AgentsCommand),

    /// Show recent dispatch log entries.
    Log(LogArgs),
}

/// Arguments for the `send` command.
#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("payload_source")
        .required(true)
        .args(["payload", "payload_file"])
))]
pub struct SendArgs {
    /// Agent key to dispatch to (e.g., echo, gpt, orchestrator).
    #[arg(long, short = 't')]
    pub target: String,

    /// JSON payload for the card.
    #[arg(long, short = 'p')]
    pub payload: Option<String>,

    /// Read the JSON payload from a file (`-` for stdin).
    #[arg(long, value_name = "PATH")]
    pub payload_file: Option<PathBuf>,

    /// Print the full dispatch result object instead of just the detail.
    #[arg(long)]
    pub json: bool,
}

/// Registry commands.
#[derive(Args, Debug)]
pub struct AgentsCommand {
    #[command(subcommand)]
    pub action: AgentsAction,
}

/// Available registry actions.
#[derive(Subcommand, Debug)]
pub enum AgentsAction {
    /// List agent keys, their modules and where they resolve.
    List,

    /// Resolve every agent and verify it exposes a handler.
    ///
    /// Exits non-zero if any agent is missing or non-conforming.
    Check,
}

/// Arguments for the `log` command.
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Number of most recent entries to show.
    #[arg(long, short = 'n', default_value_t = 20)]
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_send_with_inline_payload() {
        let cli = Cli::try_parse_from([
            "cardsend",
            "send",
            "--target",
            "echo",
            "--payload",
            r#"{"msg": "hi"}"#,
        ])
        .unwrap();

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.target, "echo");
                assert_eq!(args.payload.as_deref(), Some(r#"{"msg": "hi"}"#));
                assert!(args.payload_file.is_none());
                assert!(!args.json);
            }
            other => panic!("expected send, got {:?}", other),
        }
    }

    #[test]
    fn test_send_requires_target() {
        assert!(Cli::try_parse_from(["cardsend", "send", "--payload", "{}"]).is_err());
    }

    #[test]
    fn test_send_requires_a_payload_source() {
        assert!(Cli::try_parse_from(["cardsend", "send", "--target", "echo"]).is_err());
    }

    #[test]
    fn test_send_rejects_two_payload_sources() {
        let result = Cli::try_parse_from([
            "cardsend",
            "send",
            "-t",
            "echo",
            "-p",
            "{}",
            "--payload-file",
            "card.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli =
            Cli::try_parse_from(["cardsend", "agents", "list", "--config", "ops/cards.yaml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ops/cards.yaml")));
        assert!(matches!(
            cli.command,
            Command::Agents(AgentsCommand {
                action: AgentsAction::List
            })
        ));
    }

    #[test]
    fn test_log_default_limit() {
        let cli = Cli::try_parse_from(["cardsend", "log"]).unwrap();
        match cli.command {
            Command::Log(args) => assert_eq!(args.limit, 20),
            other => panic!("expected log, got {:?}", other),
        }
    }
}
