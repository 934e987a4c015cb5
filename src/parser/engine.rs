//! Recursive descent over a command grammar.
//!
//! [`parse_command`] walks the tokens of a command line against a [`SubDef`]
//! tree and produces a flat [`ParseResult`] keyed by `dest`.
//!
//! Resolution order, per sub-command frame:
//! 1. flags (`--long`, `--long=value`, `-abc`, `-n=value`) unless `--` was seen
//! 2. positional arguments, in declaration order
//! 3. once arguments are exhausted, sub-commands: named ones by exact name or
//!    alias first, then unnamed ones tried in order with backtracking
//!
//! Unnamed sub-commands are tried on a scratch result; the first one that
//! parses wins and its values are merged into the parent. When every
//! candidate fails, the error of the first candidate is reported.

use std::{borrow::Cow, collections::BTreeMap};

use log::debug;
use serde::Serialize;

use crate::parser::{
    error::ParseError,
    grammar::{ArgDef, FlagDef, SubDef},
    token::Token,
    types::{TypeRegistry, Value},
};

/// Values collected while parsing, keyed by `dest`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParseResult {
    values: BTreeMap<String, Value>,
}

impl ParseResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dest: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(dest.into(), value.into());
    }

    pub fn get(&self, dest: &str) -> Option<&Value> {
        self.values.get(dest)
    }

    pub fn get_str(&self, dest: &str) -> Option<&str> {
        self.get(dest).and_then(Value::as_str)
    }

    pub fn get_i64(&self, dest: &str) -> Option<i64> {
        self.get(dest).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, dest: &str) -> Option<bool> {
        self.get(dest).and_then(Value::as_bool)
    }

    /// Whether `dest` holds `true`, as set for matched flags and sub-commands.
    pub fn is_set(&self, dest: &str) -> bool {
        self.get_bool(dest).unwrap_or(false)
    }

    pub fn contains(&self, dest: &str) -> bool {
        self.values.contains_key(dest)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Moves every value of `other` into `self`, overwriting on conflicts.
    pub fn merge(&mut self, other: ParseResult) {
        self.values.extend(other.values);
    }
}

/// Parses `tokens` of `command` against `grammar`.
///
/// `tokens[0]` is the command name itself and is skipped. Token offsets must
/// refer to `command`, which is kept in errors for rendering.
///
/// # Errors
///
/// Returns a [`ParseError`] on the first input that does not fit the
/// grammar, or when the grammar references an unknown type parser.
///
/// # Examples
///
/// ```
/// # use chatcmd::parser::{parse_command, tokenize, ArgDef, SubDef, TypeRegistry};
/// let grammar = SubDef::new("tp", "tp").arg(ArgDef::new("x", "int").required());
/// let command = "tp 12";
/// let result = parse_command(&grammar, command, &tokenize(command, 0), &TypeRegistry::new()).unwrap();
/// assert_eq!(result.get_i64("x"), Some(12));
/// assert!(result.is_set("tp"));
/// ```
pub fn parse_command(
    grammar: &SubDef,
    command: &str,
    tokens: &[Token],
    types: &TypeRegistry,
) -> Result<ParseResult, ParseError> {
    debug!("parsing `{}` against grammar `{}`", command, grammar.name);

    let mut parser = Parser {
        command,
        tokens,
        types,
        use_flags: true,
    };
    let mut result = ParseResult::new();

    parser
        .process_sub(1, grammar, &mut result)
        .map_err(|err| err.or_command(command))?;

    Ok(result)
}

struct Parser<'a> {
    command: &'a str,
    tokens: &'a [Token],
    types: &'a TypeRegistry,
    /// Cleared by a bare `--`, after which everything is positional
    use_flags: bool,
}

impl Parser<'_> {
    /// Parses one frame starting at token `idx`, returns the index after it.
    fn process_sub(
        &mut self,
        mut idx: usize,
        def: &SubDef,
        result: &mut ParseResult,
    ) -> Result<usize, ParseError> {
        let tokens = self.tokens;
        let mut arg_idx = 0;
        let mut dispatched = false;

        while let Some(token) = tokens.get(idx) {
            if self.is_flag(token) {
                if token.text == "--" {
                    self.use_flags = false;
                    idx += 1;
                    continue;
                }
                idx = self.process_flag(idx, def, result)?;
                continue;
            }

            if let Some(arg_def) = def.args.get(arg_idx) {
                arg_idx += 1;
                idx += self.process_arg(&tokens[idx..], arg_def, result)?;
                continue;
            }

            idx = self.dispatch_sub(idx, def, result)?;
            dispatched = true;
            break;
        }

        for arg_def in def.args.iter().skip(arg_idx) {
            if arg_def.required {
                return Err(ParseError::syntax("unexpected end of input")
                    .with_token(Token::end_of_input(self.command))
                    .with_command(self.command));
            }
            result.insert(arg_def.dest.clone(), arg_def.default_or_null());
        }

        // Trailing unnamed sub-commands may match an empty remainder
        if !dispatched {
            for sub in def.subs.iter().filter(|sub| !sub.is_named()) {
                if let Ok((next, sub_result)) = self.attempt(idx, sub) {
                    debug!("unnamed sub-command `{}` matched the end of input", sub.dest);
                    idx = next;
                    result.merge(sub_result);
                    break;
                }
            }
        }

        result.insert(def.dest.clone(), true);
        Ok(idx)
    }

    fn is_flag(&self, token: &Token) -> bool {
        self.use_flags && !token.quoted && token.text.starts_with('-') && token.text != "-"
    }

    /// Parses one value of type `def` at the start of `tokens`.
    ///
    /// Returns the number of tokens consumed.
    fn process_arg(
        &self,
        tokens: &[Token],
        def: &ArgDef,
        result: &mut ParseResult,
    ) -> Result<usize, ParseError> {
        let Some(type_parser) = self.types.resolve(&def.type_ref) else {
            let err = ParseError::internal(format!(
                "internal error: type parser `{}` of argument `{}` is not registered",
                def.type_ref.name(),
                def.dest
            ))
            .with_command(self.command);

            return Err(match tokens.first() {
                Some(token) => err.with_token(token.clone()),
                None => err,
            });
        };

        match type_parser(tokens, def) {
            Ok(parsed) => {
                let step = parsed.step().min(tokens.len());
                result.insert(def.dest.clone(), parsed.value);
                Ok(step)
            }
            Err(err) => match err.downcast::<ParseError>() {
                Ok(err) => Err(err.with_command(self.command)),
                Err(err) => Err(ParseError::internal(format!(
                    "internal error: exception encountered with trace stack:\n{err:?}"
                ))
                .with_command(self.command)),
            },
        }
    }

    /// Handles the flag token at `idx`, returns the index after its values.
    fn process_flag(
        &self,
        idx: usize,
        def: &SubDef,
        result: &mut ParseResult,
    ) -> Result<usize, ParseError> {
        let token = &self.tokens[idx];
        let text = token.text.as_str();
        let is_long = text.starts_with("--");
        let body = if is_long { &text[2..] } else { &text[1..] };
        let dashes = text.len() - body.len();

        let (flag_name, equal_arg) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };

        // A long name wins even with a single dash, e.g. `-verbose`
        let long_flag = def
            .flags
            .iter()
            .find(|flag| flag.long.as_deref() == Some(flag_name));

        let flag = match long_flag {
            Some(flag) => flag,
            None if is_long => {
                let suffix = equal_arg.map_or(0, |value| value.len() + 1);
                return Err(
                    ParseError::syntax(format!("unrecognized option: --{flag_name}"))
                        .with_token(token.clone())
                        .with_offsets(2, suffix as isize)
                        .with_command(self.command),
                );
            }
            None => self.process_short_cluster(token, body, def, result)?,
        };

        let mut pending = None;

        if let Some(value) = equal_arg {
            let value_offset = dashes + flag_name.len() + 1;

            if !flag.takes_args() {
                let err = ParseError::syntax(format!(
                    "option does not need any argument: {flag_name}"
                ))
                .with_command(self.command);

                // `--flag= value` blames the next token
                return Err(match self.tokens.get(idx + 1) {
                    Some(next) if value.is_empty() => err.with_token(next.clone()),
                    _ => err
                        .with_token(token.clone())
                        .with_offsets(value_offset as isize, 0),
                });
            }

            if !value.is_empty() {
                pending = Some(Token::new(
                    value,
                    token.start + value_offset,
                    token.end,
                ));
            }
        }

        let next = if flag.takes_args() {
            self.process_flag_args(idx + 1, flag, pending, equal_arg.is_some(), result)?
        } else {
            idx + 1
        };

        result.insert(flag.dest.clone(), true);
        Ok(next)
    }

    /// Resolves a `-abc` cluster, setting each flag found.
    ///
    /// Returns the last flag of the cluster, the one values are given to.
    fn process_short_cluster<'d>(
        &self,
        token: &Token,
        body: &str,
        def: &'d SubDef,
        result: &mut ParseResult,
    ) -> Result<&'d FlagDef, ParseError> {
        let mut current: Option<&FlagDef> = None;

        for (pos, ch) in body.char_indices() {
            // `-abn=5` hands `5` to `n`
            if ch == '=' && current.is_some_and(FlagDef::takes_args) {
                break;
            }

            let Some(flag) = def.flags.iter().find(|flag| flag.short == Some(ch)) else {
                let offset = pos + 1;
                let remaining = token.text.len() - offset - ch.len_utf8();
                return Err(ParseError::syntax(format!("unknown flag: -{ch}"))
                    .with_token(token.clone())
                    .with_offsets(offset as isize, remaining as isize)
                    .with_command(self.command));
            };

            result.insert(flag.dest.clone(), true);
            current = Some(flag);
        }

        current.ok_or_else(|| {
            ParseError::syntax(format!("unknown flag: {}", token.text))
                .with_token(token.clone())
                .with_command(self.command)
        })
    }

    /// Consumes the values of `flag` starting at token `idx`.
    ///
    /// `pending` is the value split off a `--flag=value` token; it is read
    /// before the remaining tokens.
    fn process_flag_args(
        &self,
        idx: usize,
        flag: &FlagDef,
        pending: Option<Token>,
        has_equals: bool,
        result: &mut ParseResult,
    ) -> Result<usize, ParseError> {
        let rest = &self.tokens[idx.min(self.tokens.len())..];
        let injected = usize::from(pending.is_some());
        let view: Cow<'_, [Token]> = match pending {
            Some(token) => Cow::Owned(std::iter::once(token).chain(rest.iter().cloned()).collect()),
            None => Cow::Borrowed(rest),
        };

        let mut consumed = 0;
        let mut failure: Option<ParseError> = None;

        for (pos, arg_def) in flag.args.iter().enumerate() {
            if failure.is_none() {
                match self.process_arg(&view[consumed..], arg_def, result) {
                    Ok(step) => {
                        consumed += step;
                        continue;
                    }
                    Err(err) if consumed >= view.len() => {
                        debug!("flag `{}` ran out of values: {}", flag.dest, err.message);
                        failure = Some(
                            ParseError::syntax("option requires more arguments")
                                .with_token(Token::end_of_input(self.command))
                                .with_command(self.command),
                        );
                    }
                    Err(err) => failure = Some(err),
                }
            }

            // An inline `=value` must be accepted by the first argument
            if arg_def.required || (pos == 0 && has_equals) {
                if let Some(err) = failure {
                    return Err(err);
                }
            }

            result.insert(arg_def.dest.clone(), arg_def.default_or_null());
        }

        Ok(idx + consumed.saturating_sub(injected))
    }

    /// Selects the sub-command the token at `idx` belongs to.
    fn dispatch_sub(
        &mut self,
        idx: usize,
        def: &SubDef,
        result: &mut ParseResult,
    ) -> Result<usize, ParseError> {
        let tokens = self.tokens;
        let token = &tokens[idx];

        if def.subs.is_empty() {
            return Err(ParseError::syntax("too many arguments")
                .with_token(token.clone())
                .with_offsets(0, -(self.command.len() as isize))
                .with_command(self.command));
        }

        if let Some(sub) = def.subs.iter().find(|sub| sub.matches(&token.text)) {
            debug!("entering sub-command `{}`", sub.name);
            return self.process_sub(idx + 1, sub, result);
        }

        let mut first_failure = None;

        for sub in def.subs.iter().filter(|sub| !sub.is_named()) {
            match self.attempt(idx, sub) {
                Ok((next, sub_result)) => {
                    debug!("unnamed sub-command `{}` matched", sub.dest);
                    result.merge(sub_result);
                    return Ok(next);
                }
                Err(err) => {
                    debug!("unnamed sub-command `{}` rejected: {}", sub.dest, err.message);
                    first_failure.get_or_insert(err);
                }
            }
        }

        Err(first_failure.unwrap_or_else(|| {
            ParseError::syntax(format!("unknown sub-command: {}", token.text))
                .with_token(token.clone())
                .with_command(self.command)
        }))
    }

    /// Tries `sub` at `idx` on a scratch result, undoing flag state on failure.
    fn attempt(&mut self, idx: usize, sub: &SubDef) -> Result<(usize, ParseResult), ParseError> {
        let use_flags = self.use_flags;
        let mut sub_result = ParseResult::new();

        match self.process_sub(idx, sub, &mut sub_result) {
            Ok(next) => Ok((next, sub_result)),
            Err(err) => {
                self.use_flags = use_flags;
                Err(err)
            }
        }
    }
}
