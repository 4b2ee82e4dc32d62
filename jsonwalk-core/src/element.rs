//! Element cursors.
//!
//! An [`Element`] is a view of exactly one JSON value, positioned by the
//! [`Stream`] it borrows. Its kind is decided once, at classification, by
//! watching the tokenizer react to the value's first bytes:
//!
//! ```text
//! byte   token / state change          kind
//! [      ArrayBegin                    Array
//! {      ObjectBegin                   Object
//! "      -> String                     String
//! - 0-9  -> Number*                    Number (byte kept for decoding)
//! t f    -> Literal{True|False}        Boolean
//! n      -> Literal{Null}              Null
//! ```
//!
//! Only those bytes are consumed. The typed accessors then read the rest of
//! the value and nothing more.
//!
//! # Cursor Validity
//!
//! All elements of a stream share one position. A child returned by
//! [`Element::array_next`] mutably borrows its parent, so the parent cannot
//! advance while the child is alive. Each element supports one accessor
//! round: decoding the same element twice finds the tokenizer past the
//! value and panics as a protocol violation.

use std::fmt;
use std::io::Read;

use log::trace;

use crate::error::{protocol_violation, Error, Result};
use crate::integer::Integer;
use crate::stream::Stream;
use crate::tokenizer::{Literal, State, Token};

/// Kind of a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::Null => "null",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification result. Numbers keep the byte consumed while
/// classifying, since it is the first character of the numeral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElementType {
    Object,
    Array,
    String,
    Number { first_char: u8 },
    Boolean,
    Null,
}

impl ElementType {
    fn kind(self) -> Kind {
        match self {
            ElementType::Object => Kind::Object,
            ElementType::Array => Kind::Array,
            ElementType::String => Kind::String,
            ElementType::Number { .. } => Kind::Number,
            ElementType::Boolean => Kind::Boolean,
            ElementType::Null => Kind::Null,
        }
    }
}

/// Classify the value starting at the stream's position.
///
/// Returns `None` if, instead of a value, the enclosing array closes (`[]`).
pub(crate) fn classify<R: Read>(stream: &mut Stream<R>) -> Result<Option<ElementType>> {
    let entry = stream.state();
    if !matches!(
        entry,
        State::AwaitingTopLevelValue | State::AwaitingValue | State::AwaitingValueNoClosing
    ) {
        protocol_violation("classify", entry);
    }

    loop {
        let byte = stream.next_byte()?;
        match stream.feed(byte)? {
            Some(Token::ArrayBegin) => return Ok(Some(classified(stream, ElementType::Array))),
            Some(Token::ObjectBegin) => return Ok(Some(classified(stream, ElementType::Object))),
            Some(Token::ArrayEnd) if entry == State::AwaitingValue => return Ok(None),
            Some(token) => protocol_violation("classify", token),
            None => {}
        }

        let ty = match stream.state() {
            state if state == entry => continue,
            State::String => ElementType::String,
            state if state.is_number() => ElementType::Number { first_char: byte },
            State::Literal { literal: Literal::True | Literal::False, .. } => ElementType::Boolean,
            State::Literal { literal: Literal::Null, .. } => ElementType::Null,
            state => protocol_violation("classify", state),
        };
        return Ok(Some(classified(stream, ty)));
    }
}

fn classified<R: Read>(stream: &Stream<R>, ty: ElementType) -> ElementType {
    trace!("classified {:?} at offset {}", ty, stream.offset());
    ty
}

/// Cursor over one JSON value.
pub struct Element<'s, R> {
    stream: &'s mut Stream<R>,
    ty: ElementType,
    /// Nesting depth of the container holding this value
    depth: u16,
}

impl<'s, R: Read> Element<'s, R> {
    pub(crate) fn new(stream: &'s mut Stream<R>, ty: ElementType, depth: u16) -> Self {
        Self { stream, ty, depth }
    }

    /// Kind decided at classification.
    #[inline]
    pub fn kind(&self) -> Kind {
        self.ty.kind()
    }

    fn expect(&self, expected: Kind) -> Result<()> {
        let found = self.kind();
        if found == expected {
            Ok(())
        } else {
            Err(Error::WrongElementType { expected, found })
        }
    }

    /// Feed bytes until the tokenizer emits a token.
    fn next_token(&mut self) -> Result<Token> {
        loop {
            if let Some(token) = self.stream.step()? {
                return Ok(token);
            }
        }
    }

    // ========== Scalars ==========

    /// Decode a `true` or `false` literal.
    pub fn boolean(&mut self) -> Result<bool> {
        self.expect(Kind::Boolean)?;
        let state = self.stream.state();
        if !matches!(state, State::Literal { literal: Literal::True | Literal::False, .. }) {
            protocol_violation("boolean", state);
        }
        match self.next_token()? {
            Token::True => Ok(true),
            Token::False => Ok(false),
            token => protocol_violation("boolean", token),
        }
    }

    /// Like [`boolean`](Self::boolean), but `null` decodes as `None`.
    pub fn optional_boolean(&mut self) -> Result<Option<bool>> {
        if self.check_optional()? {
            Ok(None)
        } else {
            self.boolean().map(Some)
        }
    }

    /// Decode a numeral into an integer of type `T`.
    ///
    /// The numeral is read into a stack buffer sized for `T`. If it runs
    /// longer than `T` can possibly be, the remaining digits are drained and
    /// [`Error::Overflow`] is returned, so iteration may continue with the
    /// next sibling.
    ///
    /// ```
    /// use jsonwalk_core::{Error, Stream};
    ///
    /// let mut stream = Stream::new(&b"[255, 256]"[..]);
    /// let mut root = stream.root().unwrap();
    /// assert_eq!(root.array_next().unwrap().unwrap().number::<u8>().unwrap(), 255);
    /// let err = root.array_next().unwrap().unwrap().number::<u8>().unwrap_err();
    /// assert!(matches!(err, Error::Overflow));
    /// ```
    pub fn number<T: Integer>(&mut self) -> Result<T> {
        let first_char = match self.ty {
            ElementType::Number { first_char } => first_char,
            _ => return Err(Error::WrongElementType { expected: Kind::Number, found: self.kind() }),
        };
        let state = self.stream.state();
        if !state.is_number() {
            protocol_violation("number", state);
        }

        let mut buffer = T::buffer();
        let buf = buffer.as_mut();
        buf[0] = first_char;
        for i in 1..buf.len() {
            let token = match self.stream.read_byte()? {
                Some(byte) => {
                    buf[i] = byte;
                    self.stream.feed(byte)?
                }
                None => Some(self.stream.end_of_input()?),
            };
            match token {
                None => {}
                Some(Token::Number { count, integer }) => {
                    if count != i {
                        protocol_violation("number", (count, i));
                    }
                    if !integer {
                        return Err(Error::NotAnInteger);
                    }
                    return parse_integer(&buf[..i]);
                }
                Some(token) => protocol_violation("number", token),
            }
        }

        trace!("numeral longer than {} digits, draining", T::MAX_DIGITS);
        match self.next_token()? {
            Token::Number { .. } => Err(Error::Overflow),
            token => protocol_violation("number", token),
        }
    }

    /// Like [`number`](Self::number), but `null` decodes as `None`.
    pub fn optional_number<T: Integer>(&mut self) -> Result<Option<T>> {
        if self.check_optional()? {
            Ok(None)
        } else {
            self.number().map(Some)
        }
    }

    /// If this is `null`, consume it and return true. Anything else is left
    /// untouched.
    pub fn check_optional(&mut self) -> Result<bool> {
        if self.ty != ElementType::Null {
            return Ok(false);
        }
        let state = self.stream.state();
        if !matches!(state, State::Literal { literal: Literal::Null, .. }) {
            protocol_violation("check_optional", state);
        }
        match self.next_token()? {
            Token::Null => Ok(true),
            token => protocol_violation("check_optional", token),
        }
    }

    /// Consume a `null` literal.
    pub fn null(&mut self) -> Result<()> {
        self.expect(Kind::Null)?;
        self.check_optional()?;
        Ok(())
    }

    // ========== Containers ==========

    /// Next element of this array, or `None` once it is exhausted.
    ///
    /// The previous child must have been fully consumed (decoded or
    /// [skipped](Self::skip)). After the end, further calls keep returning
    /// `None`.
    pub fn array_next(&mut self) -> Result<Option<Element<'_, R>>> {
        self.expect(Kind::Array)?;
        let inner = self.depth + 1;
        loop {
            // A close may have been consumed by a child: either as its own
            // token or as the hidden second token of a trailing numeral.
            let depth = self.stream.depth();
            if depth < inner {
                return Ok(None);
            }
            if depth > inner {
                protocol_violation("array_next", depth);
            }

            match self.stream.state() {
                State::AwaitingValue | State::AwaitingValueNoClosing => {
                    return match classify(&mut *self.stream)? {
                        Some(ty) => Ok(Some(Element::new(&mut *self.stream, ty, inner))),
                        None => {
                            trace!("empty array at offset {}", self.stream.offset());
                            Ok(None)
                        }
                    };
                }
                State::ValueEnd => match self.stream.step()? {
                    Some(Token::ArrayEnd) => {
                        trace!("array end at offset {}", self.stream.offset());
                        return Ok(None);
                    }
                    Some(token) => protocol_violation("array_next", token),
                    None => {}
                },
                state => protocol_violation("array_next", state),
            }
        }
    }

    /// Consume the rest of this value without decoding it.
    ///
    /// Works for every kind, including strings and objects. Containers are
    /// skipped by nesting depth, so skipping needs no extra memory. Skipping
    /// a container that is already exhausted does nothing.
    pub fn skip(&mut self) -> Result<()> {
        match self.ty {
            ElementType::Array | ElementType::Object => {
                while self.stream.depth() > self.depth {
                    self.stream.step()?;
                }
            }
            _ => {
                let state = self.stream.state();
                if !state.in_scalar() {
                    protocol_violation("skip", state);
                }
                self.next_token()?;
            }
        }
        Ok(())
    }
}

impl<R> fmt::Debug for Element<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("kind", &self.ty.kind())
            .field("depth", &self.depth)
            .finish()
    }
}

fn parse_integer<T: Integer>(digits: &[u8]) -> Result<T> {
    if let (false, Some((b'-', magnitude))) = (T::SIGNED, digits.split_first()) {
        // `-0` is zero in any width
        if magnitude.iter().all(|&b| b == b'0') {
            return parse_integer(magnitude);
        }
        return Err(Error::Overflow);
    }
    lexical_core::parse::<T>(digits).map_err(|err| match err {
        lexical_core::Error::Overflow(_) | lexical_core::Error::Underflow(_) => Error::Overflow,
        err => protocol_violation("number", err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(input: &[u8]) -> Stream<&[u8]> {
        Stream::new(input)
    }

    #[test]
    fn test_classify_each_kind() {
        for (input, kind) in [
            ("[]", Kind::Array),
            ("{}", Kind::Object),
            ("\"x\"", Kind::String),
            ("-1 ", Kind::Number),
            ("7 ", Kind::Number),
            ("true", Kind::Boolean),
            ("false", Kind::Boolean),
            ("null", Kind::Null),
        ] {
            let mut s = stream(input.as_bytes());
            assert_eq!(s.root().unwrap().kind(), kind, "input {:?}", input);
        }
    }

    #[test]
    fn test_classify_keeps_first_numeral_byte() {
        let mut s = stream(b"  -5 ");
        assert_eq!(s.root().unwrap().kind(), Kind::Number);
        assert_eq!(s.offset(), 3);
        assert_eq!(s.root().unwrap().number::<i8>().unwrap(), -5);
    }

    #[test]
    fn test_wrong_element_type() {
        let mut s = stream(b"true");
        let mut root = s.root().unwrap();
        assert!(matches!(
            root.number::<u8>(),
            Err(Error::WrongElementType { expected: Kind::Number, found: Kind::Boolean })
        ));
        assert!(matches!(
            root.array_next(),
            Err(Error::WrongElementType { expected: Kind::Array, found: Kind::Boolean })
        ));
        assert!(matches!(root.null(), Err(Error::WrongElementType { .. })));
        // Nothing was consumed by the failed calls
        assert!(root.boolean().unwrap());
    }

    #[test]
    fn test_check_optional_leaves_non_null() {
        let mut s = stream(b"[7]");
        let mut root = s.root().unwrap();
        let mut item = root.array_next().unwrap().unwrap();
        assert!(!item.check_optional().unwrap());
        assert_eq!(item.number::<u8>().unwrap(), 7);
    }

    #[test]
    fn test_not_an_integer() {
        let mut s = stream(b"[1.5, 2e3, 3]");
        let mut root = s.root().unwrap();
        for _ in 0..2 {
            let mut item = root.array_next().unwrap().unwrap();
            assert!(matches!(item.number::<u32>(), Err(Error::NotAnInteger)));
        }
        assert_eq!(root.array_next().unwrap().unwrap().number::<u32>().unwrap(), 3);
        assert!(root.array_next().unwrap().is_none());
    }

    #[test]
    fn test_negative_into_unsigned() {
        let mut s = stream(b"[-0, -1, -0]");
        let mut root = s.root().unwrap();
        assert_eq!(root.array_next().unwrap().unwrap().number::<u8>().unwrap(), 0);
        let mut item = root.array_next().unwrap().unwrap();
        assert!(matches!(item.number::<u32>(), Err(Error::Overflow)));
        assert_eq!(root.array_next().unwrap().unwrap().number::<u64>().unwrap(), 0);
        assert!(root.array_next().unwrap().is_none());
    }

    #[test]
    fn test_negative_zero_top_level() {
        assert_eq!(stream(b"-0").root().unwrap().number::<i8>().unwrap(), 0);
        assert_eq!(stream(b"-0").root().unwrap().number::<u16>().unwrap(), 0);
    }

    #[test]
    fn test_skip_scalar_and_containers() {
        let mut s = stream(br#"["str\"ing", {"a": [1, {"b": 2}]}, [[3], 4], 5, true]"#);
        let mut root = s.root().unwrap();
        for kind in [Kind::String, Kind::Object, Kind::Array, Kind::Number] {
            let mut item = root.array_next().unwrap().unwrap();
            assert_eq!(item.kind(), kind);
            item.skip().unwrap();
        }
        assert!(root.array_next().unwrap().unwrap().boolean().unwrap());
        assert!(root.array_next().unwrap().is_none());
    }

    #[test]
    fn test_skip_partially_iterated_array() {
        let mut s = stream(b"[[1, 2, 3], 4]");
        let mut root = s.root().unwrap();
        {
            let mut inner = root.array_next().unwrap().unwrap();
            let mut first = inner.array_next().unwrap().unwrap();
            assert_eq!(first.number::<u8>().unwrap(), 1);
            inner.skip().unwrap();
            inner.skip().unwrap();
            assert!(inner.array_next().unwrap().is_none());
        }
        assert_eq!(root.array_next().unwrap().unwrap().number::<u8>().unwrap(), 4);
    }

    #[test]
    #[should_panic(expected = "protocol violation in boolean")]
    fn test_decoding_twice_panics() {
        let mut s = stream(b"[true, false]");
        let mut root = s.root().unwrap();
        let mut item = root.array_next().unwrap().unwrap();
        item.boolean().unwrap();
        let _ = item.boolean();
    }

    #[test]
    #[should_panic(expected = "protocol violation in array_next")]
    fn test_unconsumed_child_panics() {
        let mut s = stream(b"[true, false]");
        let mut root = s.root().unwrap();
        root.array_next().unwrap().unwrap();
        let _ = root.array_next();
    }
}
