//! Regex rule tokenizer.
//!
//! Rules pair a pattern with a token kind. At each position the rules are
//! tried in the order they were added and the first one that matches a
//! non-empty prefix wins, so put longer forms first (`\d+\.\d+` before
//! `\d+`). Input between tokens that matches the ignore pattern is skipped;
//! by default that is whitespace.
//!
//! When no rule matches, the next character is emitted as a token of kind
//! [`Token::CHAR_KIND`], so a parser can still report where it stopped.
//!
//! Patterns compile with `regex` when they can. Those using lookaround or
//! backreferences (`\d+(?!\.\d)`) fall back to `fancy-regex`.

use crate::error::{Error, Result};
use crate::stream::TokenStream;
use crate::symbol::Token;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A\s+").expect("whitespace pattern compiles"));

/// A compiled, start-anchored pattern.
#[derive(Debug, Clone)]
enum Pattern {
    Plain(Regex),
    Lookaround(fancy_regex::Regex),
}

impl Pattern {
    /// Length of the match at the start of `input`, if any.
    fn prefix(&self, input: &str) -> Option<usize> {
        match self {
            Pattern::Plain(regex) => regex.find(input).map(|m| m.end()),
            // backtrack limit exceeded counts as no match
            Pattern::Lookaround(regex) => regex.find(input).ok().flatten().map(|m| m.end()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    rules: Vec<(Pattern, String)>,
    ignore: Option<Pattern>,
}

impl Tokenizer {
    /// A tokenizer over `rules` that skips whitespace.
    pub fn new<I, P, K>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, K)>,
        P: AsRef<str>,
        K: Into<String>,
    {
        rules
            .into_iter()
            .fold(Self::builder(), |builder, (pattern, kind)| builder.rule(pattern, kind))
            .build()
    }

    pub fn builder() -> TokenizerBuilder {
        TokenizerBuilder::default()
    }

    /// Lazily split `input` into tokens.
    pub fn tokens<'a>(&'a self, input: &'a str) -> Tokens<'a> {
        Tokens {
            tokenizer: self,
            rest: input,
        }
    }

    /// A token stream over `input`.
    pub fn tokenize(&self, input: &str) -> TokenStream<Token> {
        TokenStream::generate(|out| {
            for token in self.tokens(input) {
                out.emit(token);
            }
        })
    }

    fn skip_ignored<'a>(&self, input: &'a str) -> &'a str {
        match self.ignore.as_ref().and_then(|ignore| ignore.prefix(input)) {
            Some(end) => &input[end..],
            None => input,
        }
    }

    fn next_token<'a>(&self, input: &'a str) -> Option<(Token, &'a str)> {
        for (rule, kind) in &self.rules {
            match rule.prefix(input) {
                Some(end) if end > 0 => {
                    let (text, rest) = input.split_at(end);
                    return Some((Token::new(kind.as_str(), text), rest));
                }
                _ => {}
            }
        }
        let ch = input.chars().next()?;
        let (text, rest) = input.split_at(ch.len_utf8());
        debug!(text, "no tokenizer rule matched; emitting a single character");
        Some((Token::new(Token::CHAR_KIND, text), rest))
    }
}

#[derive(Debug, Clone, Default)]
enum Ignore {
    #[default]
    Whitespace,
    Pattern(String),
    Nothing,
}

/// Collects rules before compiling them.
#[derive(Debug, Clone, Default)]
pub struct TokenizerBuilder {
    rules: Vec<(String, String)>,
    ignore: Ignore,
}

impl TokenizerBuilder {
    /// Emit tokens of `kind` for text matching `pattern`.
    pub fn rule(mut self, pattern: impl AsRef<str>, kind: impl Into<String>) -> Self {
        self.rules.push((pattern.as_ref().to_string(), kind.into()));
        self
    }

    /// Skip text matching `pattern` between tokens; `None` skips nothing.
    pub fn ignore(mut self, pattern: Option<&str>) -> Self {
        self.ignore = match pattern {
            Some(pattern) => Ignore::Pattern(pattern.to_string()),
            None => Ignore::Nothing,
        };
        self
    }

    pub fn build(self) -> Result<Tokenizer> {
        let rules = self
            .rules
            .into_iter()
            .map(|(pattern, kind)| anchored(&pattern).map(|rule| (rule, kind)))
            .collect::<Result<Vec<_>>>()?;
        let ignore = match self.ignore {
            Ignore::Whitespace => Some(Pattern::Plain(WHITESPACE.clone())),
            Ignore::Pattern(pattern) => Some(anchored(&pattern)?),
            Ignore::Nothing => None,
        };
        Ok(Tokenizer { rules, ignore })
    }
}

fn anchored(pattern: &str) -> Result<Pattern> {
    let source = format!(r"\A(?:{})", pattern);
    match Regex::new(&source) {
        Ok(regex) => Ok(Pattern::Plain(regex)),
        Err(plain_error) => match fancy_regex::Regex::new(&source) {
            Ok(regex) => {
                debug!(pattern, "pattern needs lookaround support");
                Ok(Pattern::Lookaround(regex))
            }
            Err(_) => Err(Error::InvalidPattern {
                pattern: pattern.to_string(),
                source: plain_error,
            }),
        },
    }
}

/// Iterator returned by [`Tokenizer::tokens`].
#[derive(Debug)]
pub struct Tokens<'a> {
    tokenizer: &'a Tokenizer,
    rest: &'a str,
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let input = self.tokenizer.skip_ignored(self.rest);
        let (token, rest) = self.tokenizer.next_token(input)?;
        self.rest = rest;
        Some(token)
    }
}
