//! Engine options and their loader.
//!
//! `defaults/descent.default.toml` is embedded into the library so the
//! documented defaults and [`Options::default`] stay in sync. Applications
//! layer their own files, environment variables (prefix `DESCENT`) and single
//! overrides on top via [`Loader`].

use crate::error::Result;
use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/descent.default.toml");

/// Knobs that change how grammars are built and parses are driven.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    pub optimize: OptimizeMode,
    pub memoize_rules: bool,
    pub restore_on_failure: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            optimize: OptimizeMode::Eager,
            memoize_rules: false,
            restore_on_failure: true,
        }
    }
}

/// When shared prefixes of alternatives are factored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizeMode {
    /// At construction, for every choice.
    #[default]
    Eager,
    /// Only when [`Parser::optimize`](crate::parser::Parser::optimize) is
    /// called.
    Explicit,
}

/// Layers option sources over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a TOML file. Missing files make [`build`](Self::build) fail.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer a TOML file if it exists.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer `DESCENT_*` environment variables, e.g. `DESCENT_OPTIMIZE=explicit`.
    pub fn with_env(mut self) -> Self {
        let source = Environment::with_prefix("DESCENT").try_parsing(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the layers and deserialize them.
    pub fn build(self) -> Result<Options> {
        Ok(self.builder.build()?.try_deserialize()?)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Options as shipped, without any user layers.
pub fn load_defaults() -> Result<Options> {
    Loader::new().build()
}
