//! Built-in command handlers.
//!
//! Each handler implements [`CommandHandler`](crate::commands::CommandHandler):
//! it receives the parsed values and a
//! [`CommandContext`](crate::commands::CommandContext) and returns a
//! [`CommandResult`](crate::commands::CommandResult).
//!
//! # Available Handlers
//!
//! - [`HelpCommand`] - Usage of every command, or details about one
//! - [`EchoCommand`] - Replies with the parsed values, for trying grammars out

mod echo;
mod help;

pub use crate::commands::actions::{echo::EchoCommand, help::HelpCommand};
