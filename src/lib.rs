//! chatcmd - Chat command parsing for in-game and chat-bot consoles.
//!
//! Commands are described by a grammar tree ([`parser::SubDef`]) of positional
//! arguments, GNU style flags and sub-commands. A chat line is tokenized,
//! parsed against the grammar of the command it names, and the resulting
//! values are handed to a handler. Malformed lines yield an error pointing at
//! the offending column.
//!
//! # Architecture
//!
//! - [`parser`] - tokenizer, grammar model, type parsers, grammar parser,
//!   error rendering and usage lines
//! - [`commands`] - command registry, dispatch and built-in handlers
//! - [`config`] - YAML configuration with environment variable overrides
//!
//! # Examples
//!
//! ```
//! # use chatcmd::commands::{Commander, actions::EchoCommand};
//! # use chatcmd::parser::{ArgDef, SubDef};
//! let mut commander = Commander::new("!");
//! commander
//!     .register(
//!         SubDef::new("tp", "tp").arg(ArgDef::new("x", "int").required()),
//!         Box::new(EchoCommand),
//!     )
//!     .unwrap();
//!
//! let result = commander.call("!tp 12", "alice").unwrap();
//! assert_eq!(result.response, r#"{"tp":true,"x":12}"#);
//! ```

pub mod commands;
pub mod config;
pub mod parser;
