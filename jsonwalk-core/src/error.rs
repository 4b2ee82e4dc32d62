//! Error types.
//!
//! Two failure categories are kept apart:
//!
//! - [`Error`] values are recoverable from the caller's point of view: a
//!   schema mismatch, an integer that does not fit, or input that is not
//!   valid JSON. They are always returned, never swallowed.
//! - Protocol violations (the cursor driven outside its state machine, e.g.
//!   an accessor called twice on the same element) panic via
//!   [`protocol_violation`]. They are bugs in the calling code, not data
//!   errors, so they are not representable as `Error`.

use std::fmt;
use std::io;

use crate::element::Kind;
use crate::tokenizer::SyntaxError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Why the input could not be read as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    /// The byte source ended before the value was complete
    UnexpectedEof,
    /// The tokenizer rejected a byte
    Syntax(SyntaxError),
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Malformed::UnexpectedEof => f.write_str("unexpected end of input"),
            Malformed::Syntax(code) => f.write_str(code.message()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Accessor does not match the element's kind
    #[error("expected {expected}, found {found}")]
    WrongElementType { expected: Kind, found: Kind },

    /// Numeral does not fit the requested integer type
    #[error("number does not fit the requested integer type")]
    Overflow,

    /// Numeral has a fraction or exponent
    #[error("number is not an integer")]
    NotAnInteger,

    /// Input is not valid JSON; the stream cannot be resumed
    #[error("malformed input at byte {offset}: {reason}")]
    MalformedInput { offset: u64, reason: Malformed },

    /// The byte source failed
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// True for errors that leave the stream position unusable.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::MalformedInput { .. })
    }

    pub(crate) fn malformed(offset: u64, reason: Malformed) -> Self {
        Error::MalformedInput { offset, reason }
    }
}

/// Abort on a cursor/tokenizer disagreement.
#[cold]
#[track_caller]
pub(crate) fn protocol_violation(operation: &str, observed: impl fmt::Debug) -> ! {
    panic!("jsonwalk protocol violation in {operation}: unexpected {observed:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = Error::WrongElementType { expected: Kind::Number, found: Kind::Boolean };
        assert_eq!(err.to_string(), "expected number, found boolean");

        let err = Error::malformed(7, Malformed::Syntax(SyntaxError::InvalidLiteral));
        assert_eq!(err.to_string(), "malformed input at byte 7: invalid literal");
        assert!(err.is_malformed());

        let err = Error::malformed(0, Malformed::UnexpectedEof);
        assert_eq!(err.to_string(), "malformed input at byte 0: unexpected end of input");
        assert!(!Error::Overflow.is_malformed());
    }

    #[test]
    #[should_panic(expected = "protocol violation in boolean")]
    fn test_protocol_violation_panics() {
        protocol_violation("boolean", Kind::Null);
    }
}
