//! Errors for grammar construction and configuration.
//!
//! A parse that does not match is not an error: evaluation reports it as
//! `None`. The variants here are programming errors, caught before any input
//! is read.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("rule '{0}' is referenced but never defined")]
    UndefinedRule(String),

    #[error("rule '{0}' is already defined")]
    DuplicateRule(String),

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}
