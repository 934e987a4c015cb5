//! Echo command handler.
//!
//! Replies with the parsed values as compact JSON. Commands declared in the
//! configuration file use it, which makes it easy to try a grammar out.

use log::debug;

use crate::{
    commands::{CommandContext, CommandHandler, CommandResult},
    parser::ParseResult,
};

pub struct EchoCommand;

impl CommandHandler for EchoCommand {
    fn handle(&self, args: &ParseResult, ctx: &CommandContext) -> anyhow::Result<CommandResult> {
        debug!("echoing {} values for {}", args.len(), ctx.sender);
        Ok(CommandResult::new(serde_json::to_string(args)?))
    }
}
