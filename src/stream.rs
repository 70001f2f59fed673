//! Token sources.
//!
//! A [`TokenStream`] pulls symbols lazily from an underlying producer and keeps
//! a pushback stack in front of it. Backtracking relies on that stack:
//! `unshift` puts a symbol back so that the next `shift` returns it again, and
//! pushing back a run of symbols in reverse consumption order restores the
//! original order exactly.
//!
//! Streams can be built from any iterable, from a push-style generator
//! callback, or from a [`Feeder`] driven by another thread (see [`feed`]).

pub mod feed;

pub use feed::Feeder;

use std::fmt;

pub struct TokenStream<T> {
    pushback: Vec<T>,
    producer: Box<dyn Iterator<Item = T>>,
}

impl<T: 'static> TokenStream<T> {
    pub fn new<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        Self {
            pushback: Vec::new(),
            producer: Box::new(tokens.into_iter()),
        }
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// Build a stream from a callback that emits symbols one at a time.
    ///
    /// The callback runs to completion before the first symbol is read; use
    /// [`TokenStream::feed`] when symbols arrive incrementally.
    pub fn generate(f: impl FnOnce(&mut Emitter<T>)) -> Self {
        let mut emitter = Emitter { tokens: Vec::new() };
        f(&mut emitter);
        Self::new(emitter.tokens)
    }

    /// Remove and return the next symbol, or `None` at end of input.
    pub fn shift(&mut self) -> Option<T> {
        match self.pushback.pop() {
            Some(token) => Some(token),
            None => self.producer.next(),
        }
    }

    /// Push a symbol back onto the front of the stream.
    pub fn unshift(&mut self, token: T) {
        self.pushback.push(token);
    }

    /// Push several symbols back so that they are shifted again in the given
    /// order.
    pub fn unshift_all<I>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: DoubleEndedIterator,
    {
        for token in tokens.into_iter().rev() {
            self.unshift(token);
        }
    }

    /// Look at the next symbol without consuming it.
    pub fn peek(&mut self) -> Option<&T> {
        if self.pushback.is_empty() {
            let token = self.producer.next()?;
            self.pushback.push(token);
        }
        self.pushback.last()
    }

    pub fn is_exhausted(&mut self) -> bool {
        self.peek().is_none()
    }

    /// Drain everything that is left.
    pub fn remaining(&mut self) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(token) = self.shift() {
            out.push(token);
        }
        out
    }
}

impl<T: 'static + Send> TokenStream<T> {
    /// A stream fed from elsewhere, usually another thread.
    ///
    /// `shift` on the returned stream spins until the [`Feeder`] pushes a
    /// symbol or is terminated; after termination the queued symbols are
    /// still delivered, then the stream reports end of input.
    pub fn feed() -> (Feeder<T>, Self) {
        let (feeder, receiver) = feed::channel();
        (feeder, Self::new(receiver))
    }
}

impl<T: 'static> From<Vec<T>> for TokenStream<T> {
    fn from(tokens: Vec<T>) -> Self {
        Self::new(tokens)
    }
}

impl<T: 'static> Iterator for TokenStream<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.shift()
    }
}

impl<T: fmt::Debug> fmt::Debug for TokenStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStream")
            .field("pushback", &self.pushback)
            .finish_non_exhaustive()
    }
}

/// Sink handed to [`TokenStream::generate`] callbacks.
pub struct Emitter<T> {
    tokens: Vec<T>,
}

impl<T> Emitter<T> {
    pub fn emit(&mut self, token: T) {
        self.tokens.push(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_and_unshift_restore_order() {
        let mut ts = TokenStream::new(vec![1, 2, 3]);
        let a = ts.shift().unwrap();
        let b = ts.shift().unwrap();
        ts.unshift(b);
        ts.unshift(a);
        assert_eq!(ts.remaining(), vec![1, 2, 3]);
    }

    #[test]
    fn test_unshift_all() {
        let mut ts = TokenStream::new(vec![3]);
        ts.unshift_all(vec![1, 2]);
        assert_eq!(ts.remaining(), vec![1, 2, 3]);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut ts = TokenStream::new(vec!["a", "b"]);
        assert_eq!(ts.peek(), Some(&"a"));
        assert_eq!(ts.shift(), Some("a"));
        assert_eq!(ts.peek(), Some(&"b"));
        ts.shift();
        assert!(ts.is_exhausted());
        assert_eq!(ts.shift(), None);
    }

    #[test]
    fn test_generate() {
        let mut ts = TokenStream::generate(|out| {
            for t in ["a", "b", "c"] {
                out.emit(t);
            }
        });
        assert_eq!(ts.remaining(), vec!["a", "b", "c"]);
    }
}
