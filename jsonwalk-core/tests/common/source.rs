//! Instrumented byte sources

use std::cell::Cell;
use std::io::{self, Read};
use std::rc::Rc;

/// Byte source that records how many bytes were handed out.
///
/// Returns at most one byte per `read`, like a socket delivering tiny
/// segments, and exposes the running count through a shared handle so it
/// can be inspected while the stream owns the source.
#[allow(dead_code)]
pub struct Tracked<'a> {
    data: &'a [u8],
    consumed: Rc<Cell<usize>>,
}

impl<'a> Tracked<'a> {
    #[allow(dead_code)]
    pub fn new(data: &'a [u8]) -> (Self, Rc<Cell<usize>>) {
        let consumed = Rc::new(Cell::new(0));
        (Self { data, consumed: Rc::clone(&consumed) }, consumed)
    }
}

impl Read for Tracked<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.data.is_empty() || buf.is_empty() {
            return Ok(0);
        }
        buf[0] = self.data[0];
        self.data = &self.data[1..];
        self.consumed.set(self.consumed.get() + 1);
        Ok(1)
    }
}
