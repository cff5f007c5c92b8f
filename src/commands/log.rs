//! Implementation of the `cardsend log` command.

use crate::cli::LogArgs;
use crate::context::DispatchContext;
use crate::error::Result;
use crate::events::read_tail;

/// Print the most recent dispatch log lines.
pub fn cmd_log(ctx: &DispatchContext, explicit_config: bool, args: LogArgs) -> Result<()> {
    let config = ctx.load_config(explicit_config)?;
    let path = ctx.log_path(&config);

    let lines = read_tail(&path, args.limit)?;
    if lines.is_empty() {
        println!("No dispatches logged at {}.", path.display());
        return Ok(());
    }

    for line in lines {
        println!("{}", line);
    }
    Ok(())
}
