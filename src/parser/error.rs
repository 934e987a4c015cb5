//! Parse errors and their caret-style rendering.
//!
//! A [`ParseError`] optionally carries the offending [`Token`] and the full
//! command line. When both are present, [`Display`](fmt::Display) renders the
//! message followed by the column and an excerpt of the command where the
//! faulty part is wrapped in `>>` and `<<`:
//!
//! ```text
//! not a valid integer
//!     at column 6
//!     give >>five<<
//! ```

use std::fmt;

use crate::parser::token::Token;

/// Characters of context shown on each side of the faulty span.
pub const DEFAULT_CONTEXT: usize = 10;

/// Category of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// The input does not match the grammar
    Syntax,
    /// A token was found where expected but its value is invalid
    BadValue,
    /// The grammar itself is broken, or a type parser failed unexpectedly
    Internal,
}

/// Error produced while parsing a command line against a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Token the error points at
    pub token: Option<Token>,
    /// Full command line the token offsets refer to
    pub command: Option<String>,
    /// Correction added to the token start
    pub start: isize,
    /// Correction subtracted from the token end
    pub end: isize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
            token: None,
            command: None,
            start: 0,
            end: 0,
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::Syntax, message)
    }

    /// Invalid value for `token`, typically raised by a type parser.
    pub fn bad_value(message: impl Into<String>, token: &Token) -> Self {
        Self::new(ParseErrorKind::BadValue, message).with_token(token.clone())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::Internal, message)
    }

    #[must_use]
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    /// Narrows (or widens, with negative values) the highlighted span.
    ///
    /// `start` is added to the token start and `end` is subtracted from the
    /// token end.
    #[must_use]
    pub fn with_offsets(mut self, start: isize, end: isize) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Sets the command line only when none is attached yet.
    #[must_use]
    pub fn or_command(mut self, command: &str) -> Self {
        if self.command.is_none() {
            self.command = Some(command.to_owned());
        }
        self
    }

    pub fn is_internal(&self) -> bool {
        self.kind == ParseErrorKind::Internal
    }

    /// Byte range of the faulty span inside the command, clamped to it.
    pub fn span(&self) -> Option<(usize, usize)> {
        let token = self.token.as_ref()?;
        let command = self.command.as_deref()?;

        let start = clamp_offset(token.start, self.start, command);
        let end = clamp_offset(token.end, -self.end, command).max(start);
        Some((start, end))
    }

    /// One-based column of the faulty span, counted in characters.
    ///
    /// Only known once both the token and the command are attached.
    pub fn column(&self) -> Option<usize> {
        let command = self.command.as_deref()?;
        let (start, _) = self.span()?;
        Some(command[..start].chars().count() + 1)
    }

    /// Renders the error with `context` characters around the faulty span.
    ///
    /// Without a token or a command there is nothing to point at and only the
    /// message is rendered.
    pub fn render(&self, context: usize) -> String {
        let (Some(command), Some((start, end)), Some(column)) =
            (self.command.as_deref(), self.span(), self.column())
        else {
            return self.message.clone();
        };

        let before = &command[..start];
        let excerpt_start = before
            .char_indices()
            .rev()
            .nth(context.saturating_sub(1))
            .map_or(0, |(i, _)| i);
        let excerpt_start = if context == 0 { start } else { excerpt_start };

        let after = &command[end..];
        let excerpt_end = after
            .char_indices()
            .nth(context)
            .map_or(command.len(), |(i, _)| end + i);

        format!(
            "{}\n    at column {}\n    {}>>{}<<{}",
            self.message,
            column,
            &command[excerpt_start..start],
            &command[start..end],
            &command[end..excerpt_end],
        )
    }
}

fn clamp_offset(base: usize, delta: isize, command: &str) -> usize {
    let mut offset = (base as isize + delta).clamp(0, command.len() as isize) as usize;
    while !command.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_CONTEXT))
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_without_token_is_message_only() {
        let err = ParseError::internal("internal error: boom").with_command("cmd x");
        assert_eq!(err.to_string(), "internal error: boom");
    }

    #[test]
    fn test_render_wraps_token() {
        let err = ParseError::syntax("too many arguments")
            .with_token(Token::new("value", 4, 9))
            .with_command("cmd value extra");

        assert_eq!(
            err.to_string(),
            "too many arguments\n    at column 5\n    cmd >>value<< extra"
        );
    }

    #[test]
    fn test_render_limits_context() {
        let command = "0123456789abcdefghij TOKEN klmnopqrstuvwxyz";
        let err = ParseError::syntax("bad")
            .with_token(Token::new("TOKEN", 21, 26))
            .with_command(command);

        assert_eq!(
            err.render(DEFAULT_CONTEXT),
            "bad\n    at column 22\n    bcdefghij >>TOKEN<< klmnopqrs"
        );
        assert_eq!(err.render(0), "bad\n    at column 22\n    >>TOKEN<<");
    }

    #[test]
    fn test_render_applies_offsets() {
        // Points at `c` inside the `-abc` cluster
        let err = ParseError::syntax("unknown flag: -c")
            .with_token(Token::new("-abc", 4, 8))
            .with_offsets(3, 0)
            .with_command("cmd -abc");

        assert_eq!(err.span(), Some((7, 8)));
        assert!(err.to_string().ends_with("cmd -ab>>c<<"));
        assert!(err.to_string().contains("at column 8"));
    }

    #[test]
    fn test_render_negative_end_extends_to_command_end() {
        let command = "cmd a b c";
        let err = ParseError::syntax("too many arguments")
            .with_token(Token::new("b", 6, 7))
            .with_offsets(0, -(command.len() as isize))
            .with_command(command);

        assert_eq!(err.span(), Some((6, 9)));
        assert!(err.to_string().ends_with("cmd a >>b c<<"));
    }

    #[test]
    fn test_render_end_of_input() {
        let command = "cmd --count";
        let err = ParseError::syntax("option requires more arguments")
            .with_token(Token::end_of_input(command))
            .with_command(command);

        assert!(err.to_string().ends_with("cmd --count>><<"));
    }

    #[test]
    fn test_render_snaps_to_char_boundaries() {
        let command = "msg é x";
        // Offset 5 falls inside `é`
        let err = ParseError::syntax("bad")
            .with_token(Token::new("x", 5, 8))
            .with_command(command);

        assert_eq!(err.span(), Some((4, 8)));
    }

    #[test]
    fn test_render_without_command_is_message_only() {
        let err = ParseError::syntax("bad").with_token(Token::new("x", 4, 5));
        assert_eq!(err.column(), None);
        assert_eq!(err.to_string(), "bad");
    }

    #[test]
    fn test_column_counts_characters() {
        let err = ParseError::bad_value("not a valid integer", &Token::new("deux", 9, 13))
            .with_command("tp été deux");

        assert_eq!(err.column(), Some(8));
        assert!(err.to_string().starts_with("not a valid integer\n    at column 8\n"));
        assert!(err.to_string().ends_with(">>deux<<"));
    }

    #[test]
    fn test_or_command_keeps_existing() {
        let err = ParseError::syntax("bad")
            .with_command("first")
            .or_command("second");
        assert_eq!(err.command.as_deref(), Some("first"));

        let err = ParseError::syntax("bad").or_command("second");
        assert_eq!(err.command.as_deref(), Some("second"));
    }
}
