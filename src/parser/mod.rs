//! Command line parsing core.
//!
//! Turns a raw chat line into named values according to a grammar, or into a
//! [`ParseError`] pointing at the exact part of the line that is wrong.
//!
//! # Pipeline
//!
//! ```text
//! "!give -q diamond 5"
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   tokenize()    │  → ["give", "-q", "diamond", "5"] with offsets
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ parse_command() │  ← SubDef grammar + TypeRegistry
//! └─────────────────┘
//!          │
//!          ▼
//! {"give": true, "quiet": true, "item": "diamond", "count": 5}
//! ```
//!
//! [`format_help`] works on the grammar alone and lists the usage lines of a
//! command.
//!
//! # Modules
//!
//! - [`token`] - splitting a line into tokens
//! - [`grammar`] - argument, flag and sub-command definitions
//! - [`types`] - type parsers and their registry
//! - [`engine`] - the grammar parser
//! - [`error`] - parse errors and their rendering
//! - [`help`] - usage lines

pub mod engine;
pub mod error;
pub mod grammar;
pub mod help;
pub mod token;
pub mod types;

pub use engine::{ParseResult, parse_command};
pub use error::{ParseError, ParseErrorKind};
pub use grammar::{ArgDef, FlagDef, GrammarError, SubDef, TypeRef};
pub use help::format_help;
pub use token::{Token, tokenize};
pub use types::{InlineParser, Parsed, TypeParserFn, TypeRegistry, Value};
