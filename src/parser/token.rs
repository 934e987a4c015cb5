//! Command line tokenization.
//!
//! Splits a raw chat line into [`Token`]s. Tokens remember where they came
//! from in the input line so that errors can later point at them.
//!
//! Rules:
//! - whitespace outside of quotes separates tokens and is dropped
//! - `"` toggles quoting; the quote itself is never part of a token
//! - `\` escapes the next character, which is taken literally
//! - an unterminated quote is closed at the end of the input

/// A lexical unit of a command line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// Unescaped token payload
    pub text: String,
    /// Byte offset of the first character, including the opening quote when quoted
    pub start: usize,
    /// Byte offset past the last character, including the closing quote when quoted
    pub end: usize,
    /// Whether the token was written between double quotes
    pub quoted: bool,
}

impl Token {
    /// Creates an unquoted token.
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Token {
            text: text.into(),
            start,
            end,
            quoted: false,
        }
    }

    /// Empty token sitting right after the last character of `command`.
    ///
    /// Used to anchor "unexpected end of input" style errors.
    pub fn end_of_input(command: &str) -> Self {
        Token::new("", command.len(), command.len())
    }
}

/// Splits `input` into tokens, starting at byte offset `start_index`.
///
/// `start_index` lets the caller skip a command prefix while keeping every
/// offset relative to the full input. An index that is out of range or not on
/// a character boundary yields no tokens.
///
/// # Examples
///
/// ```
/// # use chatcmd::parser::tokenize;
/// let tokens = tokenize("!say \"hello world\"", 1);
/// assert_eq!(tokens[0].text, "say");
/// assert_eq!(tokens[1].text, "hello world");
/// assert!(tokens[1].quoted);
/// ```
pub fn tokenize(input: &str, start_index: usize) -> Vec<Token> {
    let Some(rest) = input.get(start_index..) else {
        return Vec::new();
    };

    let mut tokenizer = Tokenizer {
        input,
        tokens: Vec::new(),
        text: String::new(),
        start: start_index,
        quoted: false,
    };
    let mut escaped = false;

    for (offset, ch) in rest.char_indices() {
        let i = start_index + offset;

        // The start follows the scan until the token gets its first character
        if tokenizer.text.is_empty() {
            tokenizer.start = i;
        }

        if escaped {
            escaped = false;
            tokenizer.text.push(ch);
            continue;
        }

        match ch {
            '\\' => escaped = true,
            '"' => {
                tokenizer.flush(i);
                tokenizer.quoted = !tokenizer.quoted;
            }
            c if c.is_whitespace() && !tokenizer.quoted => tokenizer.flush(i),
            c => tokenizer.text.push(c),
        }
    }

    tokenizer.flush(input.len());
    tokenizer.tokens
}

struct Tokenizer<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    text: String,
    start: usize,
    quoted: bool,
}

impl Tokenizer<'_> {
    /// Emits the token being built, `end` being the offset of the delimiter.
    fn flush(&mut self, end: usize) {
        if self.text.is_empty() {
            return;
        }

        let (start, end) = if self.quoted {
            (
                self.start.saturating_sub(1),
                (end + 1).min(self.input.len()),
            )
        } else {
            (self.start, end)
        };

        self.tokens.push(Token {
            text: std::mem::take(&mut self.text),
            start,
            end,
            quoted: self.quoted,
        });
    }
}
