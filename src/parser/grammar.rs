//! Grammar description of a command.
//!
//! A command grammar is a tree of [`SubDef`]s. Each node lists positional
//! arguments ([`ArgDef`]), flags ([`FlagDef`]) and nested sub-commands. The
//! root node describes the command itself.
//!
//! Grammars are built in code with the builder methods or deserialized from
//! configuration:
//!
//! ```
//! # use chatcmd::parser::{ArgDef, FlagDef, SubDef};
//! let give = SubDef::new("give", "give")
//!     .alias("g")
//!     .arg(ArgDef::new("item", "string").required())
//!     .arg(ArgDef::new("count", "int").default_value(1))
//!     .flag(FlagDef::new("quiet").short('q').long("quiet"));
//! assert!(give.validate().is_ok());
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::parser::{
    token::Token,
    types::{InlineParser, Parsed, Value},
};

/// Reference to the type parser of an argument.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "String")]
pub enum TypeRef {
    /// Parser registered under this name
    Named(String),
    /// Parser given directly in the grammar
    Inline(InlineParser),
}

impl TypeRef {
    pub fn inline<F>(name: impl Into<String>, parser: F) -> Self
    where
        F: Fn(&[Token], &ArgDef) -> anyhow::Result<Parsed> + Send + Sync + 'static,
    {
        TypeRef::Inline(InlineParser::new(name, parser))
    }

    /// Name shown in usage lines.
    pub fn name(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::Inline(inline) => inline.name(),
        }
    }
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        TypeRef::Named(name)
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        TypeRef::Named(name.to_owned())
    }
}

/// Positional argument, or argument of a flag.
#[derive(Debug, Clone, Deserialize)]
pub struct ArgDef {
    /// Display name, `dest` is used when absent
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    /// Result key the value is stored under
    pub dest: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub help: Option<String>,
    /// Free-form options for custom type parsers
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ArgDef {
    /// Optional argument stored under `dest`.
    pub fn new(dest: impl Into<String>, type_ref: impl Into<TypeRef>) -> Self {
        ArgDef {
            name: None,
            type_ref: type_ref.into(),
            dest: dest.into(),
            required: false,
            default: None,
            help: None,
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.dest)
    }

    /// Value stored when the argument is not given.
    pub fn default_or_null(&self) -> Value {
        self.default.clone().unwrap_or(Value::Null)
    }
}

/// A `-s` / `--long` flag.
#[derive(Debug, Clone, Deserialize)]
pub struct FlagDef {
    pub dest: String,
    #[serde(default)]
    pub long: Option<String>,
    #[serde(default)]
    pub short: Option<char>,
    #[serde(default)]
    pub help: Option<String>,
    /// Values following the flag; a flag without args is a switch
    #[serde(default)]
    pub args: Vec<ArgDef>,
}

impl FlagDef {
    pub fn new(dest: impl Into<String>) -> Self {
        FlagDef {
            dest: dest.into(),
            long: None,
            short: None,
            help: None,
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn long(mut self, long: impl Into<String>) -> Self {
        self.long = Some(long.into());
        self
    }

    #[must_use]
    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    #[must_use]
    pub fn arg(mut self, arg: ArgDef) -> Self {
        self.args.push(arg);
        self
    }

    pub fn takes_args(&self) -> bool {
        !self.args.is_empty()
    }
}

/// A command or sub-command.
///
/// A sub-command with an empty name is unnamed: it is not selected by a
/// keyword but tried in order with the others until one parses.
#[derive(Debug, Clone, Deserialize)]
pub struct SubDef {
    #[serde(default)]
    pub name: String,
    /// Result key set to `true` when this node is matched
    pub dest: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub args: Vec<ArgDef>,
    #[serde(default)]
    pub flags: Vec<FlagDef>,
    #[serde(default)]
    pub subs: Vec<SubDef>,
}

impl SubDef {
    pub fn new(name: impl Into<String>, dest: impl Into<String>) -> Self {
        SubDef {
            name: name.into(),
            dest: dest.into(),
            aliases: Vec::new(),
            help: None,
            args: Vec::new(),
            flags: Vec::new(),
            subs: Vec::new(),
        }
    }

    pub fn unnamed(dest: impl Into<String>) -> Self {
        Self::new("", dest)
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    #[must_use]
    pub fn arg(mut self, arg: ArgDef) -> Self {
        self.args.push(arg);
        self
    }

    #[must_use]
    pub fn flag(mut self, flag: FlagDef) -> Self {
        self.flags.push(flag);
        self
    }

    #[must_use]
    pub fn sub(mut self, sub: SubDef) -> Self {
        self.subs.push(sub);
        self
    }

    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }

    /// Whether `word` selects this sub-command by name or alias.
    pub fn matches(&self, word: &str) -> bool {
        self.is_named() && (self.name == word || self.aliases.iter().any(|a| a == word))
    }

    /// Checks the grammar for definitions the parser cannot handle sanely.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, see [`GrammarError`].
    pub fn validate(&self) -> Result<(), GrammarError> {
        self.validate_path(&mut Vec::new())
    }

    fn validate_path(&self, path_dests: &mut Vec<String>) -> Result<(), GrammarError> {
        let depth = path_dests.len();

        let flag_dests = self.flags.iter().flat_map(|flag| {
            std::iter::once(&flag.dest).chain(flag.args.iter().map(|arg| &arg.dest))
        });
        let dests = std::iter::once(&self.dest)
            .chain(self.args.iter().map(|arg| &arg.dest))
            .chain(flag_dests);

        for dest in dests.filter(|dest| !dest.is_empty()) {
            if path_dests.contains(dest) {
                return Err(GrammarError::DuplicateDest {
                    command: self.name.clone(),
                    dest: dest.clone(),
                });
            }
            path_dests.push(dest.clone());
        }

        self.validate_flags()?;
        self.validate_args()?;
        self.validate_sub_names()?;

        for sub in &self.subs {
            sub.validate_path(path_dests)?;
        }

        path_dests.truncate(depth);
        Ok(())
    }

    /// Positional arguments are filled in order, so an optional one cannot
    /// come before a required one.
    fn validate_args(&self) -> Result<(), GrammarError> {
        let mut optional_seen = false;

        for arg in &self.args {
            if arg.required && optional_seen {
                return Err(GrammarError::RequiredAfterOptional {
                    command: self.name.clone(),
                    dest: arg.dest.clone(),
                });
            }
            optional_seen |= !arg.required;
        }

        Ok(())
    }

    /// A later sub-command reusing a name or alias of an earlier sibling
    /// could never be selected.
    fn validate_sub_names(&self) -> Result<(), GrammarError> {
        let mut names: Vec<&str> = Vec::new();

        for sub in self.subs.iter().filter(|sub| sub.is_named()) {
            let words = std::iter::once(&sub.name).chain(sub.aliases.iter());
            for word in words {
                if names.contains(&word.as_str()) {
                    return Err(GrammarError::DuplicateSubCommand {
                        command: self.name.clone(),
                        name: word.clone(),
                    });
                }
                names.push(word);
            }
        }

        Ok(())
    }

    fn validate_flags(&self) -> Result<(), GrammarError> {
        let mut longs: Vec<&str> = Vec::new();
        let mut shorts: Vec<char> = Vec::new();

        for flag in &self.flags {
            if flag.long.as_deref().is_none_or(str::is_empty) && flag.short.is_none() {
                return Err(GrammarError::NamelessFlag {
                    command: self.name.clone(),
                    dest: flag.dest.clone(),
                });
            }

            if let Some(short) = flag.short {
                if short == '=' || short == '-' || short.is_whitespace() {
                    return Err(GrammarError::ReservedShort {
                        command: self.name.clone(),
                        short,
                    });
                }
                if shorts.contains(&short) {
                    return Err(GrammarError::DuplicateFlag {
                        command: self.name.clone(),
                        flag: format!("-{short}"),
                    });
                }
                shorts.push(short);
            }

            if let Some(long) = flag.long.as_deref().filter(|long| !long.is_empty()) {
                if longs.contains(&long) {
                    return Err(GrammarError::DuplicateFlag {
                        command: self.name.clone(),
                        flag: format!("--{long}"),
                    });
                }
                longs.push(long);
            }
        }

        Ok(())
    }
}

/// Problems found by [`SubDef::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// Two values of one parse path would be stored under the same key
    #[error("dest `{dest}` is used more than once on the path to `{command}`")]
    DuplicateDest { command: String, dest: String },

    #[error("flag `{dest}` of `{command}` has neither a long nor a short name")]
    NamelessFlag { command: String, dest: String },

    #[error("flag `-{short}` of `{command}` uses a reserved character")]
    ReservedShort { command: String, short: char },

    #[error("flag `{flag}` is defined twice in `{command}`")]
    DuplicateFlag { command: String, flag: String },

    #[error("required argument `{dest}` of `{command}` follows an optional one")]
    RequiredAfterOptional { command: String, dest: String },

    #[error("sub-command `{name}` is defined twice in `{command}`")]
    DuplicateSubCommand { command: String, name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let sub = SubDef::new("home", "home")
            .alias("h")
            .help("Manage homes")
            .arg(ArgDef::new("name", "string").name("home").required())
            .flag(FlagDef::new("all").short('a'));

        assert!(sub.is_named());
        assert!(sub.matches("home"));
        assert!(sub.matches("h"));
        assert!(!sub.matches("homes"));
        assert_eq!(sub.args[0].display_name(), "home");
        assert!(sub.args[0].required);
        assert!(!sub.flags[0].takes_args());
    }

    #[test]
    fn test_unnamed_never_matches() {
        let sub = SubDef::unnamed("page");
        assert!(!sub.is_named());
        assert!(!sub.matches(""));
    }

    #[test]
    fn test_arg_defaults() {
        let arg = ArgDef::new("count", "int");
        assert_eq!(arg.display_name(), "count");
        assert_eq!(arg.default_or_null(), Value::Null);
        assert_eq!(arg.default_value(3).default_or_null(), Value::from(3));
    }

    #[test]
    fn test_validate_duplicate_dest_on_path() {
        let sub = SubDef::new("tp", "tp")
            .arg(ArgDef::new("target", "string"))
            .sub(SubDef::new("here", "here").arg(ArgDef::new("target", "string")));

        assert_eq!(
            sub.validate(),
            Err(GrammarError::DuplicateDest {
                command: "here".to_string(),
                dest: "target".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_flag_and_arg_collision() {
        let sub = SubDef::new("kit", "kit")
            .arg(ArgDef::new("name", "string"))
            .flag(FlagDef::new("name").long("name"));

        assert!(matches!(
            sub.validate(),
            Err(GrammarError::DuplicateDest { .. })
        ));
    }

    #[test]
    fn test_validate_siblings_may_share_dests() {
        let sub = SubDef::new("help", "")
            .sub(SubDef::unnamed("pg").arg(ArgDef::new("value", "int")))
            .sub(SubDef::unnamed("cmd").arg(ArgDef::new("value", "string")));

        assert_eq!(sub.validate(), Ok(()));
    }

    #[test]
    fn test_validate_required_after_optional() {
        let sub = SubDef::new("warp", "warp")
            .arg(ArgDef::new("world", "string"))
            .arg(ArgDef::new("name", "string").required());

        assert_eq!(
            sub.validate(),
            Err(GrammarError::RequiredAfterOptional {
                command: "warp".to_string(),
                dest: "name".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_duplicate_sub_command_name() {
        let sub = SubDef::new("cmd", "cmd")
            .sub(SubDef::new("go", "one"))
            .sub(SubDef::new("gone", "two").alias("go"));

        assert_eq!(
            sub.validate(),
            Err(GrammarError::DuplicateSubCommand {
                command: "cmd".to_string(),
                name: "go".to_string(),
            })
        );

        let distinct = SubDef::new("cmd", "cmd")
            .sub(SubDef::new("go", "one"))
            .sub(SubDef::new("gone", "two").alias("g"));
        assert_eq!(distinct.validate(), Ok(()));
    }

    #[test]
    fn test_validate_flags() {
        let nameless = SubDef::new("a", "a").flag(FlagDef::new("x"));
        assert!(matches!(
            nameless.validate(),
            Err(GrammarError::NamelessFlag { .. })
        ));

        let reserved = SubDef::new("a", "a").flag(FlagDef::new("x").short('='));
        assert!(matches!(
            reserved.validate(),
            Err(GrammarError::ReservedShort { short: '=', .. })
        ));

        let duplicate = SubDef::new("a", "a")
            .flag(FlagDef::new("x").long("all"))
            .flag(FlagDef::new("y").long("all"));
        assert_eq!(
            duplicate.validate(),
            Err(GrammarError::DuplicateFlag {
                command: "a".to_string(),
                flag: "--all".to_string(),
            })
        );
    }

    #[test]
    fn test_deserialize_from_yaml_like_json() {
        let json = serde_json::json!({
            "name": "give",
            "dest": "give",
            "aliases": ["g"],
            "args": [
                { "name": "item", "type": "string", "dest": "item", "required": true },
                { "type": "int", "dest": "count", "default": 1, "max": 64 }
            ],
            "flags": [
                { "dest": "quiet", "short": "q", "long": "quiet" }
            ],
            "subs": [
                { "dest": "rest", "args": [{ "type": "string", "dest": "player" }] }
            ]
        });

        let sub: SubDef = serde_json::from_value(json).unwrap();

        assert_eq!(sub.aliases, vec!["g"]);
        assert_eq!(sub.args[0].type_ref.name(), "string");
        assert!(sub.args[0].required);
        assert_eq!(sub.args[1].default, Some(Value::from(1)));
        assert_eq!(sub.args[1].extra.get("max"), Some(&Value::from(64)));
        assert_eq!(sub.flags[0].short, Some('q'));
        assert!(!sub.subs[0].is_named());
        assert_eq!(sub.validate(), Ok(()));
    }
}
