//! jsonwalk Core
//!
//! Pull-based, constant-memory cursor over a JSON byte stream.
//! Reads one byte at a time and only as far as the current value requires;
//! the document is never materialized.
//!
//! # Architecture
//!
//! - **tokenizer.rs** - Byte-at-a-time JSON state machine (states + tokens)
//! - **stream.rs** - Byte source, tokenizer and the memoized root element
//! - **element.rs** - Element cursor: classification, typed decoding, array iteration
//! - **integer.rs** - Integer widths and their fixed numeral buffers
//! - **config.rs** - Stream options
//! - **error.rs** - Recoverable errors and protocol-violation panics
//!
//! # Example
//!
//! ```
//! use jsonwalk_core::{Kind, Stream};
//!
//! let mut stream = Stream::new(&b"[false, true, null]"[..]);
//! let mut root = stream.root().unwrap();
//! assert_eq!(root.kind(), Kind::Array);
//!
//! let mut flags = Vec::new();
//! while let Some(mut item) = root.array_next().unwrap() {
//!     flags.push(item.optional_boolean().unwrap());
//! }
//! assert_eq!(flags, [Some(false), Some(true), None]);
//! ```

pub mod config;
pub mod element;
pub mod error;
pub mod integer;
pub mod stream;
pub mod tokenizer;

pub use config::Config;
pub use element::{Element, Kind};
pub use error::{Error, Malformed, Result};
pub use integer::Integer;
pub use stream::Stream;
pub use tokenizer::{Literal, State, SyntaxError, Token, Tokenizer};
