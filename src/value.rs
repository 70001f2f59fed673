//! Parse results.
//!
//! Every parser produces a [`Seq`], an ordered list of [`Value`]s. Tokens
//! appear as [`Value::Token`], nested results (iterations, parallel pairs,
//! negative lookahead) as [`Value::List`], and semantic actions are free to
//! return any of the scalar variants. [`Value::Nil`] means "matched, but
//! produced nothing".

use crate::symbol::Symbol;
use serde::Serialize;
use std::fmt;

/// The sequence a parser yields on success.
pub type Seq<T> = Vec<Value<T>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value<T> {
    Nil,
    Token(T),
    List(Vec<Value<T>>),
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl<T> Value<T> {
    /// Everything except `Nil` and `Bool(false)` counts as a successful
    /// condition.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_token(&self) -> Option<&T> {
        match self {
            Value::Token(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value<T>]> {
        match self {
            Value::List(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<Vec<Value<T>>> {
        match self {
            Value::List(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Wrap a sequence as a nested list value.
    pub fn list(xs: impl IntoIterator<Item = Value<T>>) -> Self {
        Value::List(xs.into_iter().collect())
    }
}

impl<T: Symbol> Value<T> {
    /// The text of a token or string value.
    pub fn text(&self) -> Option<&str> {
        match self {
            Value::Token(t) => Some(t.text()),
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Concatenated text of every token and string in this value, depth first.
    pub fn joined(&self) -> String {
        let mut out = String::new();
        self.join_into(&mut out);
        out
    }

    fn join_into(&self, out: &mut String) {
        match self {
            Value::List(xs) => xs.iter().for_each(|x| x.join_into(out)),
            other => {
                if let Some(text) = other.text() {
                    out.push_str(text);
                }
            }
        }
    }
}

impl<T> From<i64> for Value<T> {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl<T> From<i32> for Value<T> {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl<T> From<f64> for Value<T> {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl<T> From<bool> for Value<T> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T> From<String> for Value<T> {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T> From<&str> for Value<T> {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl<T> From<Vec<Value<T>>> for Value<T> {
    fn from(xs: Vec<Value<T>>) -> Self {
        Value::List(xs)
    }
}

impl<T> From<Option<Value<T>>> for Value<T> {
    fn from(v: Option<Value<T>>) -> Self {
        v.unwrap_or(Value::Nil)
    }
}

impl<T: fmt::Debug> fmt::Display for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Token(t) => write!(f, "{:?}", t),
            Value::List(xs) => {
                write!(f, "[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", x)?;
                }
                write!(f, "]")
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type V = Value<String>;

    #[test]
    fn test_truthiness() {
        assert!(!V::Nil.is_truthy());
        assert!(!V::Bool(false).is_truthy());
        assert!(V::Bool(true).is_truthy());
        assert!(V::Int(0).is_truthy());
        assert!(V::List(vec![]).is_truthy());
    }

    #[test]
    fn test_joined_walks_nested_lists() {
        let v = V::list(vec![
            Value::Token("a".to_string()),
            V::list(vec![Value::Token("b".to_string()), Value::Nil]),
            Value::Str("c".to_string()),
        ]);
        assert_eq!(v.joined(), "abc");
    }

    #[test]
    fn test_display() {
        let v = V::list(vec![Value::Token("a".to_string()), Value::Nil, Value::Int(3)]);
        assert_eq!(v.to_string(), "[\"a\", nil, 3]");
    }
}
