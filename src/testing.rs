//! Helpers for tests of grammars over plain strings.
//!
//! Most grammar tests run over `String` symbols, where a symbol's kind and
//! text are the string itself. These factories keep such tests short:
//!
//! ```text
//! let p = token("a") - token("b");
//! assert_eq!(p.parse(chars("ab")), Some(tok("a")));
//! assert_eq!(p.parse_sequence(&mut chars("ab").into()), Some(toks(&["a", "b"])));
//! ```

use crate::value::{Seq, Value};

/// One symbol per character of `input`.
pub fn chars(input: &str) -> Vec<String> {
    input.chars().map(String::from).collect()
}

/// One symbol per element of `items`.
pub fn strs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Whitespace-separated words as symbols.
pub fn words(input: &str) -> Vec<String> {
    input.split_whitespace().map(String::from).collect()
}

/// A token value over a string symbol.
pub fn tok(text: &str) -> Value<String> {
    Value::Token(text.to_string())
}

/// A sequence of token values.
pub fn toks(texts: &[&str]) -> Seq<String> {
    texts.iter().map(|t| tok(t)).collect()
}
