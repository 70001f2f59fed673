//! Input units the engine can match.
//!
//! The engine is generic over its input: anything implementing [`Symbol`] can
//! flow through a [`TokenStream`](crate::stream::TokenStream). Terminal
//! matchers only ever look at two facets of a symbol, its *kind* and its
//! *text*, which is what lets the same grammar run over raw strings (where
//! both facets are the string itself) and over tokenizer output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unit of input: something with a kind and a textual value.
pub trait Symbol: Clone + PartialEq + fmt::Debug + 'static {
    /// The classification of this symbol (`"int"`, `"op"`, ...).
    fn kind(&self) -> &str;

    /// The literal text of this symbol.
    fn text(&self) -> &str;
}

impl Symbol for String {
    fn kind(&self) -> &str {
        self
    }

    fn text(&self) -> &str {
        self
    }
}

impl Symbol for &'static str {
    fn kind(&self) -> &str {
        self
    }

    fn text(&self) -> &str {
        self
    }
}

/// A classified piece of source text, as produced by the
/// [`Tokenizer`](crate::tokenizer::Tokenizer).
///
/// Two tokens are equal iff both kind and value match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub kind: String,
    pub value: String,
}

impl Token {
    /// Kind given to single characters no tokenizer rule accepted.
    pub const CHAR_KIND: &'static str = "char";

    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// True if this token belongs to `kind`.
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

impl Symbol for Token {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn text(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.value)
    }
}
