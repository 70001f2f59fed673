//! Save-points for backtracking.
//!
//! A [`ParseBuffer`] records, in order, every symbol consumed during the
//! current attempt. Composite parsers that may have to abandon a partial
//! match evaluate their child against a [`prepare`](ParseBuffer::prepare)d
//! buffer and then either [`commit`](ParseBuffer::commit) it into the parent
//! or [`recover`](ParseBuffer::recover) it, which pushes the symbols back onto
//! the stream in reverse and exactly undoes the attempt.
//!
//! Child buffers share the parent's [`Captures`]; only the consumed symbols
//! are private to the attempt.

use crate::capture::Captures;
use crate::stream::TokenStream;

#[derive(Debug)]
pub struct ParseBuffer<T> {
    consumed: Vec<T>,
    captures: Captures<T>,
}

impl<T: 'static> ParseBuffer<T> {
    pub fn new() -> Self {
        Self::with_captures(Captures::new())
    }

    pub fn with_captures(captures: Captures<T>) -> Self {
        Self {
            consumed: Vec::new(),
            captures,
        }
    }

    /// An empty child buffer sharing this buffer's captures.
    pub fn prepare(&self) -> Self {
        Self::with_captures(self.captures.clone())
    }

    /// Splice a successful child attempt into this buffer.
    pub fn commit(&mut self, child: ParseBuffer<T>) {
        self.consumed.extend(child.consumed);
    }

    /// Undo a failed attempt: every consumed symbol goes back onto the
    /// stream, most recent first.
    pub fn recover(self, stream: &mut TokenStream<T>) {
        for token in self.consumed.into_iter().rev() {
            stream.unshift(token);
        }
    }

    /// Note that `token` was taken from the stream.
    pub fn record(&mut self, token: T) {
        self.consumed.push(token);
    }

    pub fn consumed(&self) -> &[T] {
        &self.consumed
    }

    pub fn len(&self) -> usize {
        self.consumed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }

    pub fn captures(&self) -> &Captures<T> {
        &self.captures
    }
}

impl<T: 'static> Default for ParseBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}
