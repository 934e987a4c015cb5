//! Command registry and execution.
//!
//! This module provides the [`Commander`] struct, the main entry point for
//! processing chat commands. It owns the registered grammars and their
//! handlers, and routes each message to the right one.
//!
//! # Architecture
//!
//! The Commander follows a two-phase processing model:
//!
//! 1. **Parsing Phase** - Checks the prefix, finds the command and parses the
//!    line into an [`Invocation`]
//! 2. **Execution Phase** - Hands the parsed values to the command handler
//!
//! # Flow
//!
//! ```text
//! Chat message → parse() → Invocation → handler.handle() → CommandResult
//! ```
//!
//! # Examples
//!
//! ```
//! # use chatcmd::commands::Commander;
//! let commander = Commander::new("!");
//!
//! let result = commander.call("!help", "alice").unwrap();
//! assert!(result.response.starts_with("Showing help page 1 of 1"));
//!
//! // Regular chat is not for us
//! assert!(commander.call("hello", "alice").is_err());
//! ```

use log::{debug, error, info, warn};

use crate::{
    commands::{
        CommandContext, CommandError, CommandHandler, CommandInfo, CommandResult,
        actions::HelpCommand,
        response::format_unknown_command,
    },
    parser::{
        ParseResult, SubDef, Token, TypeRegistry, error::DEFAULT_CONTEXT, format_help,
        parse_command, tokenize,
    },
};

/// A registered command: its grammar and what runs it.
pub struct CommandEntry {
    pub grammar: SubDef,
    handler: Box<dyn CommandHandler>,
}

impl CommandEntry {
    pub fn info(&self) -> CommandInfo {
        CommandInfo {
            name: self.grammar.name.clone(),
            aliases: self.grammar.aliases.clone(),
            help: self.grammar.help.clone(),
            usage: format_help(&self.grammar),
        }
    }
}

/// A message successfully parsed against one of the registered commands.
pub struct Invocation<'a> {
    pub entry: &'a CommandEntry,
    /// Tokens of the message, command name included
    pub tokens: Vec<Token>,
    pub args: ParseResult,
}

/// Command orchestrator for parsing and executing chat commands.
///
/// The Commander is responsible for:
/// - Keeping the registered commands and the type parsers they use
/// - Parsing raw messages against the matching grammar
/// - Routing parsed commands to their handler
/// - Converting errors into user-friendly messages
///
/// # Command Prefix
///
/// Every command starts with the prefix (`!` by default). Messages without it
/// are silently ignored (returning [`CommandError::NotForBot`]).
pub struct Commander {
    prefix: String,
    types: TypeRegistry,
    entries: Vec<CommandEntry>,
}

impl Commander {
    /// Creates a Commander with the built-in `help` command registered.
    pub fn new(prefix: impl Into<String>) -> Self {
        let help = CommandEntry {
            grammar: HelpCommand::grammar(),
            handler: Box::new(HelpCommand),
        };

        Commander {
            prefix: prefix.into(),
            types: TypeRegistry::new(),
            entries: vec![help],
        }
    }

    /// Registers a command.
    ///
    /// # Errors
    ///
    /// * [`CommandError::Unnamed`] - The grammar root has no name
    /// * [`CommandError::AlreadyRegistered`] - The name or an alias is taken
    /// * [`CommandError::InvalidGrammar`] - The grammar does not validate
    pub fn register(
        &mut self,
        grammar: SubDef,
        handler: Box<dyn CommandHandler>,
    ) -> Result<(), CommandError> {
        if !grammar.is_named() {
            return Err(CommandError::Unnamed);
        }

        let names = std::iter::once(&grammar.name).chain(grammar.aliases.iter());
        for name in names {
            if self.get_command(name).is_some() {
                warn!("cannot register {}: `{name}` is already taken", grammar.name);
                return Err(CommandError::AlreadyRegistered(name.clone()));
            }
        }

        grammar.validate()?;

        info!("registered command {}", grammar.name);
        self.entries.push(CommandEntry { grammar, handler });
        Ok(())
    }

    /// Removes the command called `name`. Returns whether one was removed.
    pub fn deregister(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.grammar.name != name);

        let removed = self.entries.len() != before;
        if removed {
            info!("deregistered command {name}");
        }
        removed
    }

    /// Looks a command up by name or alias.
    pub fn get_command(&self, name: &str) -> Option<&SubDef> {
        self.find_entry(name).map(|entry| &entry.grammar)
    }

    pub fn commands(&self) -> impl Iterator<Item = &SubDef> {
        self.entries.iter().map(|entry| &entry.grammar)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        info!("command prefix changed from `{}` to `{prefix}`", self.prefix);
        self.prefix = prefix;
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Registry of type parsers, for adding custom types.
    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    /// Description of every registered command, in registration order.
    pub fn catalog(&self) -> Vec<CommandInfo> {
        self.entries.iter().map(CommandEntry::info).collect()
    }

    /// Parses a chat message into an [`Invocation`].
    ///
    /// # Errors
    ///
    /// * [`CommandError::NotForBot`] - The message does not start with the prefix
    /// * [`CommandError::UnknownCommand`] - No command matches the first word
    /// * [`CommandError::Parse`] - The line does not match the command grammar
    pub fn parse(&self, message: &str) -> Result<Invocation<'_>, CommandError> {
        if !message.starts_with(&self.prefix) {
            return Err(CommandError::NotForBot);
        }

        let tokens = tokenize(message, self.prefix.len());
        let Some(first) = tokens.first() else {
            return Err(CommandError::UnknownCommand(String::new()));
        };

        let entry = self
            .find_entry(&first.text)
            .ok_or_else(|| CommandError::UnknownCommand(first.text.clone()))?;

        debug!("parsing `{message}` as {}", entry.grammar.name);
        let args = parse_command(&entry.grammar, message, &tokens, &self.types)?;

        Ok(Invocation {
            entry,
            tokens,
            args,
        })
    }

    /// Parses a chat message sent by `sender` and runs its handler.
    pub fn call(&self, message: &str, sender: &str) -> Result<CommandResult, CommandError> {
        let Invocation {
            entry,
            tokens,
            args,
        } = self.parse(message)?;

        let ctx = CommandContext {
            sender: sender.to_owned(),
            prefix: self.prefix.clone(),
            commands: self.catalog(),
            tokens,
        };

        entry
            .handler
            .handle(&args, &ctx)
            .map_err(CommandError::Handler)
    }

    /// Turns an error into the reply sent to the chat.
    ///
    /// Returns `None` when nothing should be sent back.
    pub fn format_error(&self, err: &CommandError) -> Option<String> {
        match err {
            CommandError::NotForBot => None,
            CommandError::UnknownCommand(_) => Some(format_unknown_command(&self.prefix)),
            CommandError::Parse(parse_error) => {
                if parse_error.is_internal() {
                    error!("internal parse error: {}", parse_error.message);
                }
                Some(parse_error.render(DEFAULT_CONTEXT))
            }
            other => Some(other.to_string()),
        }
    }

    fn find_entry(&self, name: &str) -> Option<&CommandEntry> {
        self.entries.iter().find(|entry| entry.grammar.matches(name))
    }
}

impl Default for Commander {
    fn default() -> Self {
        Commander::new("!")
    }
}
