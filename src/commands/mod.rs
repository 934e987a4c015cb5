//! Chat command registry and dispatch.
//!
//! This module sits between incoming chat messages and command handlers. It
//! recognizes the command prefix, finds the command named by the first token,
//! parses the rest of the line against the command grammar and hands the
//! result to the handler.
//!
//! # Flow
//!
//! ```text
//! Chat message
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Commander  │  ← prefix check, tokenize, lookup by name or alias
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────────┐
//! │ parse_command() │  → ParseResult or ParseError
//! └─────────────────┘
//!      │
//!      ▼
//! ┌─────────────────────┐
//! │ CommandHandler      │  - HelpCommand
//! │                     │  - EchoCommand
//! └─────────────────────┘
//!      │
//!      ▼
//!  CommandResult
//! ```
//!
//! # Error Handling
//!
//! - **Silent errors** ([`CommandError::NotForBot`]): the message does not
//!   start with the prefix and gets no reply.
//! - **User errors**: unknown commands, parse errors and handler failures are
//!   turned into a reply by [`Commander::format_error`].
//! - **Registration errors**: invalid grammars or name clashes, reported to
//!   the host at startup.

use mockall::automock;
use thiserror::Error;

use crate::parser::{GrammarError, ParseError, ParseResult, Token};

pub mod actions;
mod commander;
pub mod response;

pub use crate::commands::commander::{CommandEntry, Commander, Invocation};

/// Description of a registered command, as shown by `help`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: String,
    pub aliases: Vec<String>,
    pub help: Option<String>,
    /// Usage lines, without the prefix
    pub usage: Vec<String>,
}

/// Runtime context handed to a command handler.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Name of whoever sent the message
    pub sender: String,
    /// Command prefix in effect
    pub prefix: String,
    /// Every registered command, in registration order
    pub commands: Vec<CommandInfo>,
    /// Tokens of the message, command name included
    pub tokens: Vec<Token>,
}

/// Outcome of a command handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Text to send back to the chat
    pub response: String,
}

impl CommandResult {
    pub fn new(response: impl Into<String>) -> Self {
        CommandResult {
            response: response.into(),
        }
    }
}

/// Behavior of a command once its line has been parsed.
#[automock]
pub trait CommandHandler {
    /// Runs the command with the parsed `args`.
    ///
    /// Errors are shown to the sender as they are.
    fn handle(&self, args: &ParseResult, ctx: &CommandContext) -> anyhow::Result<CommandResult>;
}

/// Errors raised while registering or running commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Message without the command prefix, ignored silently
    #[error("message is not a command")]
    NotForBot,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The handler rejected the command
    #[error("{0}")]
    Handler(anyhow::Error),

    #[error("a command must have a name")]
    Unnamed,

    #[error("command name `{0}` is already taken")]
    AlreadyRegistered(String),

    #[error(transparent)]
    InvalidGrammar(#[from] GrammarError),
}
