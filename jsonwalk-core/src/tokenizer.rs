//! Byte-at-a-time JSON tokenizer.
//!
//! A constant-memory state machine: feed it one byte, it updates its
//! [`State`] and reports at most two structural [`Token`]s. Nothing is
//! buffered - string and number contents are only counted, never stored.
//!
//! # Token Sequences
//!
//! ```text
//! [1, true]   ArrayBegin, Number{count: 1}, True, ArrayEnd
//! {"a": null} ObjectBegin, String{count: 1}, Null, ObjectEnd
//! ```
//!
//! Numbers have no closing delimiter, so their token is emitted by the
//! first byte *after* the numeral. When that byte also closes a container
//! (`1]`), `feed` returns both tokens at once. That is the only case where
//! the second slot is filled.
//!
//! # Nesting
//!
//! Open containers are tracked in a fixed 256-bit stack (one bit per level,
//! set for objects), so memory use does not grow with document depth.

/// Capacity of the nesting bit stack.
pub const MAX_DEPTH: u16 = 256;

const STACK_WORDS: usize = MAX_DEPTH as usize / 64;

/// Syntax error codes reported by the tokenizer.
///
/// Like the tokenizer itself these carry no position; [`Stream`](crate::Stream)
/// attaches the byte offset when it surfaces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SyntaxError {
    /// Byte cannot start a value
    InvalidValue = 0,
    /// Expected `,` or a closing bracket after a value
    ExpectedCommaOrClose,
    /// Expected `"` to start an object key
    ExpectedKey,
    /// Expected `:` after an object key
    ExpectedColon,
    /// Literal `true`, `false` or `null` misspelled
    InvalidLiteral,
    /// Numeral violates the JSON number grammar
    InvalidNumber,
    /// Unknown escape after `\`
    InvalidEscape,
    /// Non-hex digit in a `\u` escape
    InvalidUnicodeEscape,
    /// Malformed UTF-8 sequence inside a string
    InvalidUtf8,
    /// Unescaped control character inside a string
    ControlCharacter,
    /// Non-whitespace after the top-level value
    TrailingCharacters,
    /// Nesting deeper than the configured maximum
    TooDeep,
    /// Input ended inside a value
    UnexpectedEnd,
}

impl SyntaxError {
    /// Get a human-readable message for this error code.
    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidValue => "invalid value",
            Self::ExpectedCommaOrClose => "expected comma or closing bracket",
            Self::ExpectedKey => "expected object key",
            Self::ExpectedColon => "expected colon",
            Self::InvalidLiteral => "invalid literal",
            Self::InvalidNumber => "invalid number",
            Self::InvalidEscape => "invalid escape",
            Self::InvalidUnicodeEscape => "invalid unicode escape",
            Self::InvalidUtf8 => "invalid utf-8",
            Self::ControlCharacter => "control character in string",
            Self::TrailingCharacters => "trailing characters",
            Self::TooDeep => "nesting too deep",
            Self::UnexpectedEnd => "unexpected end of input",
        }
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Keyword literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    True,
    False,
    Null,
}

impl Literal {
    /// The full spelling of the literal.
    #[inline]
    pub fn bytes(self) -> &'static [u8] {
        match self {
            Literal::True => b"true",
            Literal::False => b"false",
            Literal::Null => b"null",
        }
    }

    fn token(self) -> Token {
        match self {
            Literal::True => Token::True,
            Literal::False => Token::False,
            Literal::Null => Token::Null,
        }
    }
}

/// Tokenizer state, observable between bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    // ========== Value Boundaries ==========

    /// Nothing read yet
    AwaitingTopLevelValue,
    /// Directly after `[`; `]` is still allowed
    AwaitingValue,
    /// After `,` or `:`; a value is mandatory
    AwaitingValueNoClosing,
    /// Directly after `{`; `}` is still allowed
    AwaitingKey,
    /// After `,` inside an object
    AwaitingKeyNoClosing,
    /// After an object key
    AwaitingColon,
    /// A nested value finished; expecting `,` or a closing bracket
    ValueEnd,
    /// The top-level value finished; only whitespace may follow
    TopLevelEnd,

    // ========== Strings ==========

    String,
    /// After `\`
    StringEscape,
    /// Inside `\uXXXX`, hex digits still expected
    StringUnicodeEscape { remaining: u8 },
    /// Inside a multi-byte UTF-8 sequence, continuation bytes still expected.
    /// The next one must fall in `low..=high`.
    StringUtf8 { remaining: u8, low: u8, high: u8 },

    // ========== Numbers ==========

    /// After `-`
    NumberSign,
    /// After a leading `0`; only `.`, exponent or the end may follow
    NumberLeadingZero,
    /// Integer digits; may take more digits, `.` or an exponent
    NumberInteger,
    /// After `.`
    NumberFractionStart,
    NumberFraction,
    /// After `e` or `E`
    NumberExponentStart,
    /// After the exponent sign
    NumberExponentSign,
    NumberExponent,

    // ========== Literals ==========

    /// `matched` bytes of `literal` consumed so far
    Literal { literal: Literal, matched: u8 },
}

impl State {
    /// Inside a numeral.
    #[inline]
    pub fn is_number(self) -> bool {
        matches!(
            self,
            State::NumberSign
                | State::NumberLeadingZero
                | State::NumberInteger
                | State::NumberFractionStart
                | State::NumberFraction
                | State::NumberExponentStart
                | State::NumberExponentSign
                | State::NumberExponent
        )
    }

    /// Inside a string, including escapes and multi-byte sequences.
    #[inline]
    pub fn is_string(self) -> bool {
        matches!(
            self,
            State::String
                | State::StringEscape
                | State::StringUnicodeEscape { .. }
                | State::StringUtf8 { .. }
        )
    }

    /// Partway through a scalar value whose token has not been emitted yet.
    #[inline]
    pub fn in_scalar(self) -> bool {
        self.is_string() || self.is_number() || matches!(self, State::Literal { .. })
    }

    /// A numeral may legally end here.
    fn number_may_end(self) -> bool {
        matches!(
            self,
            State::NumberLeadingZero
                | State::NumberInteger
                | State::NumberFraction
                | State::NumberExponent
        )
    }
}

/// Structural tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    ArrayBegin,
    ArrayEnd,
    ObjectBegin,
    ObjectEnd,
    /// String (value or key). `count` is the raw byte length between the
    /// quotes; `escaped` is set if it contains any `\` escape.
    String { count: usize, escaped: bool },
    /// Numeral of `count` bytes. `integer` is false if it has a fraction or
    /// exponent.
    Number { count: usize, integer: bool },
    True,
    False,
    Null,
}

/// Tokens produced by a single byte.
pub type Tokens = (Option<Token>, Option<Token>);

/// Incremental JSON tokenizer.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    state: State,
    /// One bit per nesting level, set for objects
    stack: [u64; STACK_WORDS],
    depth: u16,
    max_depth: u16,
    /// Bytes in the current string or numeral
    count: usize,
    escaped: bool,
    integer: bool,
    /// The current string is an object key
    key: bool,
}

impl Tokenizer {
    /// Create a tokenizer with the full nesting capacity.
    pub fn new() -> Self {
        Self::with_max_depth(MAX_DEPTH)
    }

    /// Create a tokenizer rejecting documents nested deeper than `max_depth`.
    /// Values above [`MAX_DEPTH`] are clamped.
    pub fn with_max_depth(max_depth: u16) -> Self {
        Self {
            state: State::AwaitingTopLevelValue,
            stack: [0; STACK_WORDS],
            depth: 0,
            max_depth: max_depth.min(MAX_DEPTH),
            count: 0,
            escaped: false,
            integer: true,
            key: false,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// Number of currently open containers.
    #[inline]
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Configured nesting limit.
    #[inline]
    pub fn max_depth(&self) -> u16 {
        self.max_depth
    }

    /// Advance by one byte.
    ///
    /// On error the state is left unchanged; the input is invalid JSON and
    /// there is no resynchronization.
    pub fn feed(&mut self, byte: u8) -> Result<Tokens, SyntaxError> {
        match self.state {
            State::AwaitingTopLevelValue | State::AwaitingValue | State::AwaitingValueNoClosing => {
                self.value_begin(byte).map(|t| (t, None))
            }
            State::AwaitingKey | State::AwaitingKeyNoClosing => self.key_begin(byte).map(|t| (t, None)),
            State::AwaitingColon => match byte {
                _ if is_whitespace(byte) => Ok((None, None)),
                b':' => {
                    self.state = State::AwaitingValueNoClosing;
                    Ok((None, None))
                }
                _ => Err(SyntaxError::ExpectedColon),
            },
            State::ValueEnd => self.value_end(byte).map(|t| (t, None)),
            State::TopLevelEnd => self.top_level_end(byte).map(|t| (t, None)),
            State::String
            | State::StringEscape
            | State::StringUnicodeEscape { .. }
            | State::StringUtf8 { .. } => self.string(byte).map(|t| (t, None)),
            State::Literal { literal, matched } => self.literal(literal, matched, byte).map(|t| (t, None)),
            _ => self.number(byte),
        }
    }

    /// Signal end of input.
    ///
    /// Flushes a top-level numeral still waiting for its terminator. Fails
    /// unless the document is complete.
    pub fn end(&mut self) -> Result<Option<Token>, SyntaxError> {
        match self.state {
            State::TopLevelEnd => Ok(None),
            state if self.depth == 0 && state.number_may_end() => {
                self.state = State::TopLevelEnd;
                Ok(Some(self.number_token()))
            }
            _ => Err(SyntaxError::UnexpectedEnd),
        }
    }

    fn value_begin(&mut self, byte: u8) -> Result<Option<Token>, SyntaxError> {
        match byte {
            _ if is_whitespace(byte) => Ok(None),
            b'[' => {
                self.push(false)?;
                self.state = State::AwaitingValue;
                Ok(Some(Token::ArrayBegin))
            }
            b'{' => {
                self.push(true)?;
                self.state = State::AwaitingKey;
                Ok(Some(Token::ObjectBegin))
            }
            b']' if self.state == State::AwaitingValue && !self.top_is_object() => {
                self.pop();
                Ok(Some(Token::ArrayEnd))
            }
            b'"' => {
                self.begin_string(false);
                Ok(None)
            }
            b'-' => {
                self.begin_number(State::NumberSign);
                Ok(None)
            }
            b'0' => {
                self.begin_number(State::NumberLeadingZero);
                Ok(None)
            }
            b'1'..=b'9' => {
                self.begin_number(State::NumberInteger);
                Ok(None)
            }
            b't' => self.begin_literal(Literal::True),
            b'f' => self.begin_literal(Literal::False),
            b'n' => self.begin_literal(Literal::Null),
            _ => Err(SyntaxError::InvalidValue),
        }
    }

    fn key_begin(&mut self, byte: u8) -> Result<Option<Token>, SyntaxError> {
        match byte {
            _ if is_whitespace(byte) => Ok(None),
            b'"' => {
                self.begin_string(true);
                Ok(None)
            }
            b'}' if self.state == State::AwaitingKey => {
                self.pop();
                Ok(Some(Token::ObjectEnd))
            }
            _ => Err(SyntaxError::ExpectedKey),
        }
    }

    fn value_end(&mut self, byte: u8) -> Result<Option<Token>, SyntaxError> {
        match byte {
            _ if is_whitespace(byte) => Ok(None),
            b',' => {
                self.state = if self.top_is_object() {
                    State::AwaitingKeyNoClosing
                } else {
                    State::AwaitingValueNoClosing
                };
                Ok(None)
            }
            b']' if !self.top_is_object() => {
                self.pop();
                Ok(Some(Token::ArrayEnd))
            }
            b'}' if self.top_is_object() => {
                self.pop();
                Ok(Some(Token::ObjectEnd))
            }
            _ => Err(SyntaxError::ExpectedCommaOrClose),
        }
    }

    fn top_level_end(&mut self, byte: u8) -> Result<Option<Token>, SyntaxError> {
        if is_whitespace(byte) {
            Ok(None)
        } else {
            Err(SyntaxError::TrailingCharacters)
        }
    }

    fn string(&mut self, byte: u8) -> Result<Option<Token>, SyntaxError> {
        let next = match self.state {
            State::String => match byte {
                b'"' => {
                    let token = Token::String { count: self.count, escaped: self.escaped };
                    self.state = if self.key { State::AwaitingColon } else { self.after_value() };
                    self.key = false;
                    return Ok(Some(token));
                }
                b'\\' => {
                    self.escaped = true;
                    State::StringEscape
                }
                0x00..=0x1F => return Err(SyntaxError::ControlCharacter),
                0x20..=0x7F => State::String,
                // Second-byte ranges from RFC 3629 section 4
                0xC2..=0xDF => utf8(1, 0x80, 0xBF),
                0xE0 => utf8(2, 0xA0, 0xBF),
                0xED => utf8(2, 0x80, 0x9F),
                0xE1..=0xEF => utf8(2, 0x80, 0xBF),
                0xF0 => utf8(3, 0x90, 0xBF),
                0xF1..=0xF3 => utf8(3, 0x80, 0xBF),
                0xF4 => utf8(3, 0x80, 0x8F),
                _ => return Err(SyntaxError::InvalidUtf8),
            },
            State::StringEscape => match byte {
                b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => State::String,
                b'u' => State::StringUnicodeEscape { remaining: 4 },
                _ => return Err(SyntaxError::InvalidEscape),
            },
            State::StringUnicodeEscape { remaining } => {
                if !byte.is_ascii_hexdigit() {
                    return Err(SyntaxError::InvalidUnicodeEscape);
                }
                match remaining {
                    1 => State::String,
                    n => State::StringUnicodeEscape { remaining: n - 1 },
                }
            }
            State::StringUtf8 { remaining, low, high } => {
                if !(low..=high).contains(&byte) {
                    return Err(SyntaxError::InvalidUtf8);
                }
                match remaining {
                    1 => State::String,
                    n => utf8(n - 1, 0x80, 0xBF),
                }
            }
            _ => unreachable!("string() called outside a string state"),
        };
        self.count += 1;
        self.state = next;
        Ok(None)
    }

    fn number(&mut self, byte: u8) -> Result<Tokens, SyntaxError> {
        let next = match (self.state, byte) {
            (State::NumberSign, b'0') => State::NumberLeadingZero,
            (State::NumberSign, b'1'..=b'9') => State::NumberInteger,
            (State::NumberLeadingZero, b'0'..=b'9') => return Err(SyntaxError::InvalidNumber),
            (State::NumberInteger, b'0'..=b'9') => State::NumberInteger,
            (State::NumberLeadingZero | State::NumberInteger, b'.') => {
                self.integer = false;
                State::NumberFractionStart
            }
            (State::NumberLeadingZero | State::NumberInteger | State::NumberFraction, b'e' | b'E') => {
                self.integer = false;
                State::NumberExponentStart
            }
            (State::NumberFractionStart | State::NumberFraction, b'0'..=b'9') => State::NumberFraction,
            (State::NumberExponentStart, b'+' | b'-') => State::NumberExponentSign,
            (
                State::NumberExponentStart | State::NumberExponentSign | State::NumberExponent,
                b'0'..=b'9',
            ) => State::NumberExponent,
            (state, _) if state.number_may_end() => return self.end_number(byte),
            _ => return Err(SyntaxError::InvalidNumber),
        };
        self.count += 1;
        self.state = next;
        Ok((None, None))
    }

    /// `byte` terminates the numeral; it is then processed as the byte
    /// following a complete value.
    fn end_number(&mut self, byte: u8) -> Result<Tokens, SyntaxError> {
        let saved = self.state;
        self.state = self.after_value();
        let next = match self.state {
            State::TopLevelEnd => self.top_level_end(byte),
            _ => self.value_end(byte),
        };
        match next {
            Ok(second) => Ok((Some(self.number_token()), second)),
            Err(err) => {
                self.state = saved;
                Err(err)
            }
        }
    }

    fn number_token(&self) -> Token {
        Token::Number { count: self.count, integer: self.integer }
    }

    fn literal(&mut self, literal: Literal, matched: u8, byte: u8) -> Result<Option<Token>, SyntaxError> {
        let spelling = literal.bytes();
        if spelling[matched as usize] != byte {
            return Err(SyntaxError::InvalidLiteral);
        }
        let matched = matched + 1;
        if matched as usize == spelling.len() {
            self.state = self.after_value();
            Ok(Some(literal.token()))
        } else {
            self.state = State::Literal { literal, matched };
            Ok(None)
        }
    }

    fn begin_string(&mut self, key: bool) {
        self.state = State::String;
        self.count = 0;
        self.escaped = false;
        self.key = key;
    }

    fn begin_number(&mut self, state: State) {
        self.state = state;
        self.count = 1;
        self.integer = true;
    }

    fn begin_literal(&mut self, literal: Literal) -> Result<Option<Token>, SyntaxError> {
        self.state = State::Literal { literal, matched: 1 };
        Ok(None)
    }

    #[inline]
    fn after_value(&self) -> State {
        if self.depth == 0 {
            State::TopLevelEnd
        } else {
            State::ValueEnd
        }
    }

    fn push(&mut self, object: bool) -> Result<(), SyntaxError> {
        if self.depth >= self.max_depth {
            return Err(SyntaxError::TooDeep);
        }
        let (word, bit) = (self.depth as usize / 64, self.depth % 64);
        if object {
            self.stack[word] |= 1 << bit;
        } else {
            self.stack[word] &= !(1 << bit);
        }
        self.depth += 1;
        Ok(())
    }

    /// Close the innermost container and move past it.
    fn pop(&mut self) {
        self.depth -= 1;
        self.state = self.after_value();
    }

    #[inline]
    fn top_is_object(&self) -> bool {
        match self.depth.checked_sub(1) {
            Some(level) => self.stack[level as usize / 64] & (1 << (level % 64)) != 0,
            None => false,
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn utf8(remaining: u8, low: u8, high: u8) -> State {
    State::StringUtf8 { remaining, low, high }
}

#[inline]
fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}
