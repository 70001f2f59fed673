//! Named captures and capture stacks.
//!
//! [`Captures`] is the store every buffer of one parse shares: a label map
//! written by labeled parsers and conditions, plus a reserved state slot.
//! Child buffers hold a handle to the same store, so a label set inside an
//! uncommitted branch is visible to its siblings.
//!
//! A [`Stack`] is owned by the caller and referenced from the grammar; it
//! outlives individual parses, which is what allows a value pushed during one
//! parse to be matched by a stack reference in a later one.

use crate::value::{Seq, Value};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Label map plus the reserved state slot.
///
/// Every write that changes a value bumps [`Labels::revision`]; writing a
/// value that is already there does not.
#[derive(Debug, Clone)]
pub struct Labels<T> {
    map: HashMap<String, Value<T>>,
    state: Value<T>,
    revision: u64,
}

impl<T> Default for Labels<T> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            state: Value::Nil,
            revision: 0,
        }
    }
}

impl<T: PartialEq> PartialEq for Labels<T> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map && self.state == other.state
    }
}

impl<T> Labels<T> {
    pub fn get(&self, name: &str) -> Option<&Value<T>> {
        self.map.get(name)
    }

    /// Store `value` under `name` and return it, so conditions can write and
    /// succeed in one expression.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value<T>>) -> Value<T>
    where
        T: Clone + PartialEq,
    {
        let value = value.into();
        self.store(name.into(), value.clone());
        value
    }

    fn store(&mut self, name: String, value: Value<T>)
    where
        T: PartialEq,
    {
        if self.map.get(&name) != Some(&value) {
            self.map.insert(name, value);
            self.revision += 1;
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value<T>> {
        let removed = self.map.remove(name);
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn state(&self) -> &Value<T> {
        &self.state
    }

    pub fn set_state(&mut self, state: impl Into<Value<T>>)
    where
        T: PartialEq,
    {
        let state = state.into();
        if self.state != state {
            self.state = state;
            self.revision += 1;
        }
    }

    pub fn clear(&mut self) {
        if !self.map.is_empty() || !self.state.is_nil() {
            self.revision += 1;
        }
        self.map.clear();
        self.state = Value::Nil;
    }

    /// Count of changing writes so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Shared handle to one parse's [`Labels`].
pub struct Captures<T> {
    inner: Rc<RefCell<Labels<T>>>,
}

impl<T> Captures<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Labels::default())),
        }
    }

    pub fn labels(&self) -> Ref<'_, Labels<T>> {
        self.inner.borrow()
    }

    pub fn labels_mut(&self) -> RefMut<'_, Labels<T>> {
        self.inner.borrow_mut()
    }

    pub fn get(&self, name: &str) -> Option<Value<T>>
    where
        T: Clone,
    {
        self.inner.borrow().get(name).cloned()
    }

    pub fn record(&self, name: &str, capture: Option<&Seq<T>>)
    where
        T: Clone + PartialEq,
    {
        let value = capture.map_or(Value::Nil, |xs| Value::List(xs.clone()));
        self.inner.borrow_mut().store(name.to_string(), value);
    }

    pub fn state(&self) -> Value<T>
    where
        T: Clone,
    {
        self.inner.borrow().state.clone()
    }

    pub fn set_state(&self, state: impl Into<Value<T>>)
    where
        T: PartialEq,
    {
        self.inner.borrow_mut().set_state(state);
    }

    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision()
    }

    /// True if both handles point at the same store.
    pub fn shares(&self, other: &Captures<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Default for Captures<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Captures<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Captures<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Captures").field(&*self.inner.borrow()).finish()
    }
}

/// Caller-owned LIFO of captured sequences. `None` entries record failed
/// captures.
pub struct Stack<T> {
    inner: Rc<RefCell<Vec<Option<Seq<T>>>>>,
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn push(&self, entry: Option<Seq<T>>) {
        self.inner.borrow_mut().push(entry);
    }

    pub fn pop(&self) -> Option<Option<Seq<T>>> {
        self.inner.borrow_mut().pop()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }

    /// Copy of the entries, bottom first.
    pub fn entries(&self) -> Vec<Option<Seq<T>>>
    where
        T: Clone,
    {
        self.inner.borrow().clone()
    }

    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Stack<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.borrow().iter()).finish()
    }
}
