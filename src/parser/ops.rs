//! Operator sugar for building parser trees.
//!
//!     a - b       concatenation
//!     a | b       ordered choice (shared prefixes factored)
//!     a + b       parallel choice
//!     !a          negative lookahead
//!     a >> f      semantic action
//!     a / "x"     label

use super::{Matched, Parser};
use crate::symbol::Symbol;
use crate::value::Value;
use std::ops::{Add, BitOr, Div, Not, Shr, Sub};

impl<T: Symbol> Sub for Parser<T> {
    type Output = Parser<T>;

    fn sub(self, rhs: Parser<T>) -> Parser<T> {
        self.concat(rhs)
    }
}

impl<T: Symbol> BitOr for Parser<T> {
    type Output = Parser<T>;

    fn bitor(self, rhs: Parser<T>) -> Parser<T> {
        self.or(rhs)
    }
}

impl<T: Symbol> Add for Parser<T> {
    type Output = Parser<T>;

    fn add(self, rhs: Parser<T>) -> Parser<T> {
        self.parallel(rhs)
    }
}

impl<T: Symbol> Not for Parser<T> {
    type Output = Parser<T>;

    fn not(self) -> Parser<T> {
        self.negate()
    }
}

impl<T, F, V> Shr<F> for Parser<T>
where
    T: Symbol,
    F: Fn(Matched<T>) -> V + 'static,
    V: Into<Value<T>>,
{
    type Output = Parser<T>;

    fn shr(self, f: F) -> Parser<T> {
        self.map(f)
    }
}

impl<T: Symbol> Div<&str> for Parser<T> {
    type Output = Parser<T>;

    fn div(self, name: &str) -> Parser<T> {
        self.label(name)
    }
}
