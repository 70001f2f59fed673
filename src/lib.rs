//! # descent
//!
//! A top-down parser-combinator engine with backtracking.
//!
//! Grammars are trees of [`Parser`] nodes built from a small algebra:
//! terminals, sequence (`-`), ordered choice (`|`), parallel choice (`+`),
//! repetition, negative lookahead (`!`) and semantic actions (`>>`). A parse
//! consumes symbols from a [`TokenStream`] and pushes them back whenever an
//! alternative is abandoned, so every choice point sees the input exactly as
//! it was.
//!
//! Rules that refer to each other are collected in a [`Grammar`]; left
//! recursion is expressed with the folds in [`recursion`]. The
//! [`tokenizer`] turns text into [`Token`]s for grammars that work on
//! classified input.
//!
//! ```text
//! use descent::prelude::*;
//!
//! let tokenizer = Tokenizer::new([(r"\d+", "int"), (r"[+\-]", "op")])?;
//! let num = kind("int").map(|m| m[0].text().unwrap_or("0").parse::<i64>().unwrap_or(0));
//! let expr = chainl(num, [kind("op")], |x| match x[1].text() {
//!     Some("+") => x[0].as_int().unwrap_or(0) + x[2].as_int().unwrap_or(0),
//!     _ => x[0].as_int().unwrap_or(0) - x[2].as_int().unwrap_or(0),
//! });
//! assert_eq!(expr.parse_stream(&mut tokenizer.tokenize("1 + 10")), Some(Value::Int(11)));
//! ```
//!
//! ## Testing
//!
//! Small symbol factories for tests live in the [testing module](testing).

pub mod buffer;
pub mod capture;
pub mod config;
pub mod error;
pub mod grammar;
pub mod matcher;
pub mod parser;
pub mod recursion;
pub mod stream;
pub mod symbol;
pub mod testing;
pub mod tokenizer;
pub mod value;

pub use crate::buffer::ParseBuffer;
pub use crate::capture::{Captures, Labels, Stack};
pub use crate::config::{OptimizeMode, Options};
pub use crate::error::{Error, Result};
pub use crate::grammar::Grammar;
pub use crate::matcher::{Equality, Matcher};
pub use crate::parser::{Matched, Parser};
pub use crate::stream::{Feeder, TokenStream};
pub use crate::symbol::{Symbol, Token};
pub use crate::tokenizer::Tokenizer;
pub use crate::value::{Seq, Value};

/// Everything needed to write a grammar.
pub mod prelude {
    pub use crate::capture::{Labels, Stack};
    pub use crate::grammar::Grammar;
    pub use crate::matcher::{Equality, Matcher};
    pub use crate::parser::{
        any, backref, backref_with, choice, concat, condition, empty, fail, kind, negate, none,
        parallel, stackref, stackref_with, state, token, Matched, Parser,
    };
    pub use crate::recursion::{chainl, chainr, leftrec, rightrec};
    pub use crate::stream::TokenStream;
    pub use crate::symbol::{Symbol, Token};
    pub use crate::tokenizer::Tokenizer;
    pub use crate::value::{Seq, Value};
}
