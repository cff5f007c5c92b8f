//! Command implementations for cardsend.
//!
//! This module routes parsed CLI commands to their implementations. Every
//! command resolves the workspace context first, so `--config` applies
//! uniformly.

mod agents;
mod log;
mod send;


use crate::cli::{AgentsAction, Cli, Command};
use crate::context::DispatchContext;
use crate::error::Result;

/// Run a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = DispatchContext::resolve(cli.config.as_deref())?;
    let explicit_config = cli.config.is_some();

    match cli.command {
        Command::Send(args) => send::cmd_send(&ctx, explicit_config, args),
        Command::Agents(agents_cmd) => match agents_cmd.action {
            AgentsAction::List => agents::cmd_agents_list(&ctx, explicit_config),
            AgentsAction::Check => agents::cmd_agents_check(&ctx, explicit_config),
        },
        Command::Log(args) => log::cmd_log(&ctx, explicit_config, args),
    }
}
