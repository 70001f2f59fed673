//! Terminal specifiers.
//!
//! A [`Matcher`] decides whether a single input symbol is acceptable for a
//! terminal. Matching is one-directional: the specifier inspects the
//! candidate, never the other way around.

use crate::error::{Error, Result};
use crate::symbol::Symbol;
use regex::Regex;
use std::fmt;
use std::rc::Rc;

/// How a captured symbol is compared with upcoming input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Equality {
    /// Full equality of the symbols (kind and value).
    #[default]
    Value,
    /// Same text, any kind.
    Text,
    /// Same kind, any text.
    Kind,
}

impl Equality {
    pub fn holds<T: Symbol>(self, expected: &T, candidate: &T) -> bool {
        match self {
            Equality::Value => expected == candidate,
            Equality::Text => expected.text() == candidate.text(),
            Equality::Kind => expected.kind() == candidate.kind(),
        }
    }
}

#[derive(Clone)]
pub enum Matcher<T> {
    /// Candidate text equals the string.
    Text(String),
    /// Candidate kind equals the string.
    Kind(String),
    /// Candidate compares to the symbol under the given equality.
    Token(T, Equality),
    /// Candidate text contains a match of the expression.
    Regex(Regex),
    /// Arbitrary test. Never structurally equal to another matcher.
    Predicate(Rc<dyn Fn(&T) -> bool>),
}

impl<T: Symbol> Matcher<T> {
    pub fn text(text: impl Into<String>) -> Self {
        Matcher::Text(text.into())
    }

    pub fn kind(kind: impl Into<String>) -> Self {
        Matcher::Kind(kind.into())
    }

    pub fn token(token: T) -> Self {
        Matcher::Token(token, Equality::default())
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Matcher::Regex(regex))
    }

    pub fn predicate(f: impl Fn(&T) -> bool + 'static) -> Self {
        Matcher::Predicate(Rc::new(f))
    }

    pub fn matches(&self, candidate: &T) -> bool {
        match self {
            Matcher::Text(text) => candidate.text() == text,
            Matcher::Kind(kind) => candidate.kind() == kind,
            Matcher::Token(expected, equality) => equality.holds(expected, candidate),
            Matcher::Regex(regex) => regex.is_match(candidate.text()),
            Matcher::Predicate(f) => f(candidate),
        }
    }

    /// Structural equality used by the optimizer.
    pub(crate) fn same(&self, other: &Matcher<T>) -> bool {
        match (self, other) {
            (Matcher::Text(a), Matcher::Text(b)) => a == b,
            (Matcher::Kind(a), Matcher::Kind(b)) => a == b,
            (Matcher::Token(a, ea), Matcher::Token(b, eb)) => a == b && ea == eb,
            (Matcher::Regex(a), Matcher::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl<T: Symbol> From<&str> for Matcher<T> {
    fn from(text: &str) -> Self {
        Matcher::Text(text.to_string())
    }
}

impl<T: Symbol> From<String> for Matcher<T> {
    fn from(text: String) -> Self {
        Matcher::Text(text)
    }
}

impl<T: Symbol> From<Regex> for Matcher<T> {
    fn from(regex: Regex) -> Self {
        Matcher::Regex(regex)
    }
}

impl<T: fmt::Debug> fmt::Debug for Matcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Matcher::Kind(s) => f.debug_tuple("Kind").field(s).finish(),
            Matcher::Token(t, eq) => f.debug_tuple("Token").field(t).field(eq).finish(),
            Matcher::Regex(r) => f.debug_tuple("Regex").field(&r.as_str()).finish(),
            Matcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl<T: fmt::Debug> fmt::Display for Matcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Text(s) => write!(f, "{}", s),
            Matcher::Kind(s) => write!(f, ":{}", s),
            Matcher::Token(t, _) => write!(f, "{:?}", t),
            Matcher::Regex(r) => write!(f, "/{}/", r.as_str()),
            Matcher::Predicate(_) => write!(f, "<predicate>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Token;

    #[test]
    fn test_text_and_kind() {
        let plus = Token::new("op", "+");
        assert!(Matcher::text("+").matches(&plus));
        assert!(Matcher::kind("op").matches(&plus));
        assert!(!Matcher::kind("int").matches(&plus));
    }

    #[test]
    fn test_token_equality_modes() {
        let one = Token::new("int", "1");
        let other = Token::new("real", "1");
        assert!(!Matcher::Token(one.clone(), Equality::Value).matches(&other));
        assert!(Matcher::Token(one.clone(), Equality::Text).matches(&other));
        assert!(Matcher::Token(one, Equality::Kind).matches(&Token::new("int", "7")));
    }

    #[test]
    fn test_regex_is_unanchored() {
        let digits = Matcher::<String>::regex(r"\d+").unwrap();
        assert!(digits.matches(&"10".to_string()));
        assert!(digits.matches(&"a1".to_string()));
        assert!(!digits.matches(&"ab".to_string()));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(matches!(
            Matcher::<String>::regex("("),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_predicates_are_never_the_same() {
        let p = Matcher::<String>::predicate(|s| s.is_empty());
        assert!(!p.same(&p.clone()));
        assert!(Matcher::<String>::text("a").same(&Matcher::text("a")));
    }
}
