//! Byte source plus tokenizer: the shared cursor position.
//!
//! A [`Stream`] reads one byte at a time from any [`io::Read`] and never
//! reads ahead. Every byte read is fed to the tokenizer immediately, so the
//! tokenizer state always describes exactly how far the source has been
//! consumed. Wrap unbuffered sources (sockets, files) in a
//! [`BufReader`](std::io::BufReader); the stream itself holds no buffer.
//!
//! # Example
//!
//! ```
//! use jsonwalk_core::Stream;
//!
//! let mut stream = Stream::new(&b"[1, 2, 3]"[..]);
//! let mut root = stream.root().unwrap();
//! let mut sum = 0u32;
//! while let Some(mut item) = root.array_next().unwrap() {
//!     sum += item.number::<u32>().unwrap();
//! }
//! assert_eq!(sum, 6);
//! ```

use std::io::{self, Read};

use log::debug;

use crate::config::Config;
use crate::element::{self, Element, ElementType};
use crate::error::{protocol_violation, Error, Malformed, Result};
use crate::tokenizer::{State, Token, Tokenizer};

/// Owns the byte source and tokenizer; hands out the root [`Element`].
#[derive(Debug)]
pub struct Stream<R> {
    reader: R,
    tokenizer: Tokenizer,
    /// Classification of the top-level value, once known
    root: Option<ElementType>,
    /// Bytes consumed so far
    offset: u64,
}

impl<R: Read> Stream<R> {
    /// Create a stream with the default [`Config`].
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, Config::default())
    }

    pub fn with_config(reader: R, config: Config) -> Self {
        Self {
            reader,
            tokenizer: Tokenizer::with_max_depth(config.max_depth),
            root: None,
            offset: 0,
        }
    }

    /// The top-level value.
    ///
    /// The first call reads just enough bytes to classify it; later calls
    /// return a cursor of the same kind without reading. The returned
    /// element borrows the stream, so only one cursor is live at a time.
    pub fn root(&mut self) -> Result<Element<'_, R>> {
        let ty = match self.root {
            Some(ty) => ty,
            None => {
                let ty = match element::classify(self)? {
                    Some(ty) => ty,
                    None => protocol_violation("root", Token::ArrayEnd),
                };
                self.root = Some(ty);
                ty
            }
        };
        Ok(Element::new(self, ty, 0))
    }

    /// Bytes consumed from the source so far.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Verify the rest of the input is whitespace and return the source.
    ///
    /// Fails if the document is incomplete or followed by anything else.
    /// Whatever part of the document was not navigated is validated too.
    pub fn finish(mut self) -> Result<R> {
        while let Some(byte) = self.read_byte()? {
            self.feed(byte)?;
        }
        match self.tokenizer.end() {
            Ok(_) => Ok(self.reader),
            Err(_) => Err(self.unexpected_eof()),
        }
    }

    // ========== Cursor Plumbing ==========

    #[inline]
    pub(crate) fn state(&self) -> State {
        self.tokenizer.state()
    }

    #[inline]
    pub(crate) fn depth(&self) -> u16 {
        self.tokenizer.depth()
    }

    /// Next byte, or `None` at end of input.
    pub(crate) fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(Error::Io(err)),
            }
        }
    }

    /// Next byte; end of input is an error.
    pub(crate) fn next_byte(&mut self) -> Result<u8> {
        match self.read_byte()? {
            Some(byte) => Ok(byte),
            None => Err(self.unexpected_eof()),
        }
    }

    /// Advance the tokenizer by one byte.
    ///
    /// Only the first token is surfaced. A second token can only be the
    /// close of a container ended by the same byte as a numeral (`1]`);
    /// element cursors detect that close through [`depth`](Self::depth)
    /// instead of the token.
    pub(crate) fn feed(&mut self, byte: u8) -> Result<Option<Token>> {
        match self.tokenizer.feed(byte) {
            Ok((first, _)) => {
                self.offset += 1;
                Ok(first)
            }
            Err(code) => {
                debug!("rejected byte {:#04x} at offset {}: {}", byte, self.offset, code);
                Err(Error::malformed(self.offset, Malformed::Syntax(code)))
            }
        }
    }

    /// Read and feed one byte. At end of input, flush the tokenizer: a
    /// pending top-level numeral still yields its token.
    pub(crate) fn step(&mut self) -> Result<Option<Token>> {
        match self.read_byte()? {
            Some(byte) => self.feed(byte),
            None => self.end_of_input().map(Some),
        }
    }

    /// The source ended while more of the current value was needed.
    pub(crate) fn end_of_input(&mut self) -> Result<Token> {
        match self.tokenizer.end() {
            Ok(Some(token)) => Ok(token),
            Ok(None) | Err(_) => Err(self.unexpected_eof()),
        }
    }

    fn unexpected_eof(&self) -> Error {
        debug!("input ended at offset {} in state {:?}", self.offset, self.tokenizer.state());
        Error::malformed(self.offset, Malformed::UnexpectedEof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Kind;
    use crate::tokenizer::SyntaxError;

    /// A source that fails every read after the first `ok` bytes.
    struct Flaky<'a> {
        data: &'a [u8],
        ok: usize,
    }

    impl Read for Flaky<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.ok == 0 {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            self.ok -= 1;
            let n = self.data.len().min(buf.len()).min(1);
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_root_is_memoized() {
        let mut stream = Stream::new(&b"  [true]"[..]);
        assert_eq!(stream.root().unwrap().kind(), Kind::Array);
        assert_eq!(stream.offset(), 3);
        assert_eq!(stream.root().unwrap().kind(), Kind::Array);
        assert_eq!(stream.offset(), 3);
    }

    #[test]
    fn test_root_reads_only_what_classification_needs() {
        let mut stream = Stream::new(&b"null garbage"[..]);
        assert_eq!(stream.root().unwrap().kind(), Kind::Null);
        assert_eq!(stream.offset(), 1);
    }

    #[test]
    fn test_root_on_empty_input() {
        let mut stream = Stream::new(&b" \n"[..]);
        let err = stream.root().unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedInput { offset: 2, reason: Malformed::UnexpectedEof }
        ));
    }

    #[test]
    fn test_root_on_invalid_byte() {
        let mut stream = Stream::new(&b" x"[..]);
        let err = stream.root().unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedInput { offset: 1, reason: Malformed::Syntax(SyntaxError::InvalidValue) }
        ));
    }

    #[test]
    fn test_io_error_is_not_malformed() {
        let mut stream = Stream::new(Flaky { data: b"[1]", ok: 1 });
        let mut root = stream.root().unwrap();
        let err = root.array_next().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_malformed());
    }

    #[test]
    fn test_finish_returns_source() {
        let mut stream = Stream::new(&b"true \n"[..]);
        assert!(stream.root().unwrap().boolean().unwrap());
        let rest = stream.finish().unwrap();
        assert!(rest.is_empty());
    }

    #[test]
    fn test_finish_validates_unread_input() {
        let stream = Stream::new(&b"[1, {\"a\": [null]}] "[..]);
        assert!(stream.finish().is_ok());

        let stream = Stream::new(&b"[1, 2"[..]);
        assert!(matches!(
            stream.finish(),
            Err(Error::MalformedInput { offset: 5, reason: Malformed::UnexpectedEof })
        ));

        let mut stream = Stream::new(&b"true x"[..]);
        stream.root().unwrap().boolean().unwrap();
        assert!(matches!(
            stream.finish(),
            Err(Error::MalformedInput { offset: 5, reason: Malformed::Syntax(SyntaxError::TrailingCharacters) })
        ));
    }

    #[test]
    fn test_depth_limit_from_config() {
        let mut stream = Stream::with_config(&b"[[[1]]]"[..], Config::default().with_max_depth(2));
        let mut root = stream.root().unwrap();
        let mut inner = root.array_next().unwrap().unwrap();
        assert!(matches!(
            inner.array_next(),
            Err(Error::MalformedInput { reason: Malformed::Syntax(SyntaxError::TooDeep), .. })
        ));
    }
}
