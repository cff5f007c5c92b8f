//! Implementation of the `cardsend send` command.

use crate::cli::SendArgs;
use crate::context::DispatchContext;
use crate::dispatch::{DispatchResult, Dispatcher};
use crate::error::{CardError, Result};
use crate::events::FileLog;
use crate::payload::{PayloadSource, read_payload};
use crate::registry::Registry;

/// Execute the `cardsend send` command.
///
/// 1. Reads the payload text (inline, file or stdin)
/// 2. Builds the registry from the workspace config
/// 3. Dispatches the card, logging the attempt
/// 4. Prints the result; failures become a non-zero exit
pub fn cmd_send(ctx: &DispatchContext, explicit_config: bool, args: SendArgs) -> Result<()> {
    let source = match (&args.payload, &args.payload_file) {
        (Some(raw), _) => PayloadSource::Inline(raw.clone()),
        (None, Some(path)) => PayloadSource::from_file_arg(path),
        (None, None) => {
            return Err(CardError::UserError(
                "either --payload or --payload-file is required".to_string(),
            ));
        }
    };
    let raw_payload = read_payload(&source)?;

    let result = send_card(ctx, explicit_config, &args.target, &raw_payload)?;

    if args.json {
        println!("{}", render(&result.to_json())?);
        return result.into_result().map(|_| ());
    }

    let value = result.into_result()?;
    println!("{}", render(&value)?);
    Ok(())
}

/// Dispatch one card using the workspace configuration.
///
/// Only configuration problems are returned as errors; every dispatch
/// outcome, including failures, comes back as a `DispatchResult`.
pub(crate) fn send_card(
    ctx: &DispatchContext,
    explicit_config: bool,
    target: &str,
    raw_payload: &str,
) -> Result<DispatchResult> {
    let config = ctx.load_config(explicit_config)?;
    let registry = Registry::from_config(&config, ctx);
    let log = FileLog::new(ctx.log_path(&config));

    let dispatcher = Dispatcher::new(&registry, &log);
    Ok(dispatcher.dispatch(target, raw_payload))
}

fn render(value: &serde_json::Value) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CardError::UserError(format!("failed to render result: {}", e)))
}
