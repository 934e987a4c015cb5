//! Type parsers for argument values.
//!
//! A type parser turns the tokens at the current position into a [`Value`].
//! Parsers are looked up by name in a [`TypeRegistry`], which comes with the
//! `string`, `int` and `boolean` built-ins. Host code registers its own
//! parsers at startup, before any command referencing them is parsed.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, LazyLock},
};

use regex::Regex;

use crate::parser::{
    error::ParseError,
    grammar::{ArgDef, TypeRef},
    token::Token,
};

/// A parsed argument value.
pub type Value = serde_json::Value;

/// Signature of a type parser.
///
/// Receives the tokens from the current position to the end of the line and
/// the definition of the argument being parsed. User input errors are
/// reported by returning a [`ParseError`]; any other error is treated as an
/// internal failure of the parser.
pub type TypeParserFn = dyn Fn(&[Token], &ArgDef) -> anyhow::Result<Parsed> + Send + Sync;

static RE_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(0|[1-9][0-9]*)$").unwrap());
static RE_BOOLEAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(true|false)$").unwrap());

/// Output of a type parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub value: Value,
    /// Number of tokens consumed, one when unset
    pub step: Option<usize>,
}

impl Parsed {
    pub fn new(value: impl Into<Value>) -> Self {
        Parsed {
            value: value.into(),
            step: None,
        }
    }

    pub fn with_step(value: impl Into<Value>, step: usize) -> Self {
        Parsed {
            value: value.into(),
            step: Some(step),
        }
    }

    /// Tokens consumed, never less than one.
    pub fn step(&self) -> usize {
        self.step.unwrap_or(1).max(1)
    }
}

/// Type parser given inline in a grammar instead of by name.
#[derive(Clone)]
pub struct InlineParser {
    name: String,
    parser: Arc<TypeParserFn>,
}

impl InlineParser {
    /// Wraps `parser`; `name` is what usage lines show as the argument type.
    pub fn new<F>(name: impl Into<String>, parser: F) -> Self
    where
        F: Fn(&[Token], &ArgDef) -> anyhow::Result<Parsed> + Send + Sync + 'static,
    {
        InlineParser {
            name: name.into(),
            parser: Arc::new(parser),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for InlineParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineParser")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Registry of named type parsers.
///
/// Populated once at startup, then only read while parsing.
#[derive(Clone)]
pub struct TypeRegistry {
    parsers: HashMap<String, Arc<TypeParserFn>>,
}

impl TypeRegistry {
    /// Creates a registry holding the built-in parsers.
    pub fn new() -> Self {
        let mut registry = TypeRegistry::empty();
        registry.register("string", parse_string);
        registry.register("int", parse_int);
        registry.register("boolean", parse_boolean);
        registry
    }

    /// Creates a registry without any parser, not even the built-ins.
    pub fn empty() -> Self {
        TypeRegistry {
            parsers: HashMap::new(),
        }
    }

    /// Registers `parser` under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, parser: F)
    where
        F: Fn(&[Token], &ArgDef) -> anyhow::Result<Parsed> + Send + Sync + 'static,
    {
        self.parsers.insert(name.into(), Arc::new(parser));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parsers.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<TypeParserFn>> {
        self.parsers.get(name).cloned()
    }

    /// Finds the parser a grammar type refers to.
    pub fn resolve(&self, type_ref: &TypeRef) -> Option<Arc<TypeParserFn>> {
        match type_ref {
            TypeRef::Named(name) => self.get(name),
            TypeRef::Inline(inline) => Some(inline.parser.clone()),
        }
    }

    /// Names of every registered parser, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("parsers", &self.names())
            .finish()
    }
}

fn first_token(tokens: &[Token]) -> Result<&Token, ParseError> {
    tokens
        .first()
        .ok_or_else(|| ParseError::syntax("unexpected end of input"))
}

/// Takes the token text as is.
pub fn parse_string(tokens: &[Token], _def: &ArgDef) -> anyhow::Result<Parsed> {
    let token = first_token(tokens)?;
    Ok(Parsed::new(token.text.clone()))
}

/// Decimal integer without leading zeros, optionally signed.
pub fn parse_int(tokens: &[Token], _def: &ArgDef) -> anyhow::Result<Parsed> {
    let token = first_token(tokens)?;

    if !RE_INT.is_match(&token.text) {
        return Err(ParseError::bad_value("not a valid integer", token).into());
    }

    let value: i64 = token
        .text
        .parse()
        .map_err(|_| ParseError::bad_value("integer out of range", token))?;

    Ok(Parsed::new(value))
}

/// Either `true` or `false`.
pub fn parse_boolean(tokens: &[Token], _def: &ArgDef) -> anyhow::Result<Parsed> {
    let token = first_token(tokens)?;

    if !RE_BOOLEAN.is_match(&token.text) {
        return Err(ParseError::bad_value("not a valid boolean", token).into());
    }

    Ok(Parsed::new(token.text == "true"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::error::ParseErrorKind;

    fn tokens(texts: &[&str]) -> Vec<Token> {
        texts.iter().map(|t| Token::new(*t, 0, t.len())).collect()
    }

    fn def() -> ArgDef {
        ArgDef::new("value", "string")
    }

    fn parse_error(err: anyhow::Error) -> ParseError {
        err.downcast::<ParseError>().unwrap()
    }

    #[test]
    fn test_parse_string_verbatim() {
        let parsed = parse_string(&tokens(&["-5x", "rest"]), &def()).unwrap();
        assert_eq!(parsed.value, Value::from("-5x"));
        assert_eq!(parsed.step(), 1);
    }

    #[test]
    fn test_parse_int_accepts_signed() {
        for (text, expected) in [("0", 0), ("42", 42), ("+7", 7), ("-13", -13)] {
            let parsed = parse_int(&tokens(&[text]), &def()).unwrap();
            assert_eq!(parsed.value, Value::from(expected), "for {text}");
        }
    }

    #[test]
    fn test_parse_int_rejects_invalid() {
        for text in ["five", "007", "1.5", "", "-", "1e3"] {
            let err = parse_error(parse_int(&tokens(&[text]), &def()).unwrap_err());
            assert_eq!(err.kind, ParseErrorKind::BadValue, "for {text}");
            assert_eq!(err.token.unwrap().text, text);
        }
    }

    #[test]
    fn test_parse_int_out_of_range() {
        let err = parse_error(parse_int(&tokens(&["99999999999999999999"]), &def()).unwrap_err());
        assert_eq!(err.message, "integer out of range");
    }

    #[test]
    fn test_parse_boolean() {
        let parsed = parse_boolean(&tokens(&["true"]), &def()).unwrap();
        assert_eq!(parsed.value, Value::Bool(true));
        let parsed = parse_boolean(&tokens(&["false"]), &def()).unwrap();
        assert_eq!(parsed.value, Value::Bool(false));

        let err = parse_error(parse_boolean(&tokens(&["yes"]), &def()).unwrap_err());
        assert_eq!(err.message, "not a valid boolean");
    }

    #[test]
    fn test_builtins_fail_on_empty_input() {
        let err = parse_error(parse_string(&[], &def()).unwrap_err());
        assert_eq!(err.message, "unexpected end of input");
        assert!(err.token.is_none());
    }

    #[test]
    fn test_registry_builtins_and_custom() {
        let mut registry = TypeRegistry::new();
        assert_eq!(registry.names(), vec!["boolean", "int", "string"]);

        registry.register("pair", |tokens: &[Token], _: &ArgDef| {
            let texts: Vec<&str> = tokens.iter().take(2).map(|t| t.text.as_str()).collect();
            Ok(Parsed::with_step(texts.join(","), 2))
        });

        let parser = registry.resolve(&TypeRef::from("pair")).unwrap();
        let parsed = parser(&tokens(&["a", "b", "c"]), &def()).unwrap();
        assert_eq!(parsed.value, Value::from("a,b"));
        assert_eq!(parsed.step(), 2);

        assert!(registry.resolve(&TypeRef::from("missing")).is_none());
        assert!(TypeRegistry::empty().get("string").is_none());
    }

    #[test]
    fn test_registry_resolves_inline() {
        let registry = TypeRegistry::empty();
        let type_ref = TypeRef::inline("upper", |tokens: &[Token], _: &ArgDef| {
            Ok(Parsed::new(tokens[0].text.to_uppercase()))
        });

        let parser = registry.resolve(&type_ref).unwrap();
        let parsed = parser(&tokens(&["steve"]), &def()).unwrap();
        assert_eq!(parsed.value, Value::from("STEVE"));
        assert_eq!(type_ref.name(), "upper");
    }

    #[test]
    fn test_parsed_step_never_zero() {
        assert_eq!(Parsed::with_step(1, 0).step(), 1);
        assert_eq!(Parsed::with_step(1, 3).step(), 3);
    }
}
