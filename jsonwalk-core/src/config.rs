//! Stream configuration.

use crate::tokenizer::MAX_DEPTH;

/// Options for a [`Stream`](crate::Stream).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Deepest container nesting accepted before the input is rejected
    pub max_depth: u16,
}

impl Config {
    /// Set the nesting limit. Values above [`MAX_DEPTH`] are clamped.
    pub fn with_max_depth(mut self, max_depth: u16) -> Self {
        self.max_depth = max_depth.min(MAX_DEPTH);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { max_depth: MAX_DEPTH }
    }
}
