//! Transpiler configuration (`qsa.toml`)

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// QS global name to host expression; read-only for the duration of a batch
pub type KnownSymbols = BTreeMap<String, String>;

const IDENT_PATTERN: &str = r"^[A-Za-z_$][A-Za-z0-9_$]*$";
const MODULE_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$";

/// Errors that can occur when loading a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Text encoding of QS sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "latin-1")]
    Latin1,
}

impl Encoding {
    /// Name as written in configuration files
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Latin1 => "latin-1",
        }
    }

    /// Decode raw file bytes
    ///
    /// # Errors
    ///
    /// Returns the UTF-8 error for invalid UTF-8 input. Latin-1 decoding
    /// cannot fail.
    pub fn decode(self, bytes: &[u8]) -> Result<String, std::str::Utf8Error> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes).map(str::to_string),
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

/// Settings for QS to Python transpilation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranspileConfig {
    /// Host module providing `ustr`, `Array`, `RegExp` and `typeof`
    pub runtime_module: String,

    /// Lines written at the top of every generated file
    pub header: Vec<String>,

    /// Globals rendered as a fixed host expression
    #[serde(rename = "known-symbols")]
    pub known_symbols: KnownSymbols,

    /// Lines written since the last indent change before a blank line is inserted
    #[serde(rename = "blank-line-threshold")]
    pub blank_line_threshold: usize,

    pub encoding: Encoding,

    #[serde(rename = "output-extension")]
    pub output_extension: String,

    /// Also write the XML view of the AST next to each output
    #[serde(rename = "dump-ast")]
    pub dump_ast: bool,

    /// Worker threads for batch runs; `None` uses the rayon default
    pub workers: Option<usize>,
}

impl Default for TranspileConfig {
    fn default() -> Self {
        Self {
            runtime_module: "qsa".to_string(),
            header: vec![
                "# -*- coding: utf-8 -*-".to_string(),
                "from pineboolib.qsa import qsa".to_string(),
                "import traceback".to_string(),
            ],
            known_symbols: KnownSymbols::new(),
            blank_line_threshold: 4,
            encoding: Encoding::Utf8,
            output_extension: "py".to_string(),
            dump_ast: false,
            workers: None,
        }
    }
}

impl TranspileConfig {
    /// Load a configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid config.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a value fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the type system does not
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let module = compile(MODULE_PATTERN)?;
        if !module.is_match(&self.runtime_module) {
            return Err(ConfigError::Invalid(format!(
                "runtime-module '{}' is not a Python module path",
                self.runtime_module
            )));
        }

        let ident = compile(IDENT_PATTERN)?;
        if let Some(name) = self.known_symbols.keys().find(|name| !ident.is_match(name)) {
            return Err(ConfigError::Invalid(format!(
                "known symbol '{name}' is not a QS identifier"
            )));
        }

        if self.output_extension.is_empty() || self.output_extension.contains(['.', '/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "output-extension '{}' must be a bare extension",
                self.output_extension
            )));
        }

        if self.workers == Some(0) {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        Ok(())
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::Invalid(e.to_string()))
}
