//! Incrementally fed token sources.
//!
//! The producing side holds a [`Feeder`] and pushes symbols as they become
//! available; the consuming side is an ordinary
//! [`TokenStream`](super::TokenStream) whose `shift` spins cooperatively
//! (crossbeam's `Backoff`) until a symbol arrives or the feeder terminates.
//! Spinning is the only suspension point in the engine.

use crossbeam::queue::SegQueue;
use crossbeam::utils::Backoff;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct Shared<T> {
    queue: SegQueue<T>,
    terminated: AtomicBool,
}

/// Producer half of a fed stream.
pub struct Feeder<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Feeder<T> {
    pub fn push(&self, token: T) {
        self.shared.queue.push(token);
    }

    pub fn extend(&self, tokens: impl IntoIterator<Item = T>) {
        for token in tokens {
            self.push(token);
        }
    }

    /// Signal end of input. Symbols already pushed are still delivered.
    pub fn terminate(&self) {
        self.shared.terminated.store(true, Ordering::Release);
    }

    pub fn is_terminated(&self) -> bool {
        self.shared.terminated.load(Ordering::Acquire)
    }
}

impl<T> Clone for Feeder<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Consumer half; the producer behind a fed `TokenStream`.
pub(crate) struct Receiver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Iterator for Receiver<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let backoff = Backoff::new();
        loop {
            if let Some(token) = self.shared.queue.pop() {
                return Some(token);
            }
            if self.shared.terminated.load(Ordering::Acquire) {
                // a push may have landed between the pop and the load
                return self.shared.queue.pop();
            }
            backoff.snooze();
        }
    }
}

pub(crate) fn channel<T>() -> (Feeder<T>, Receiver<T>) {
    let shared = Arc::new(Shared {
        queue: SegQueue::new(),
        terminated: AtomicBool::new(false),
    });
    (
        Feeder {
            shared: Arc::clone(&shared),
        },
        Receiver { shared },
    )
}
