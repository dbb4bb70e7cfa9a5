//! Compiler configuration.
//!
//! An optional `xmlang.toml` next to the invocation can adjust the surface
//! dialect and the output artifact; everything falls back to the richer
//! built-in dialect.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Tag keywords every dialect understands.
pub const BASE_KEYWORDS: [&str; 6] = ["arg", "call", "function", "let", "program", "return"];

/// Additional keywords of the richer dialect.
pub const EXTENDED_KEYWORDS: [&str; 6] = ["class", "new", "ctor", "dtor", "if", "else"];

/// Surface-syntax dialect: which tag names are keywords and whether
/// single-quoted property values are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dialect {
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_single_quotes")]
    pub single_quotes: bool,
}

fn default_keywords() -> Vec<String> {
    BASE_KEYWORDS
        .iter()
        .chain(EXTENDED_KEYWORDS.iter())
        .map(|&k| k.to_string())
        .collect()
}

fn default_single_quotes() -> bool {
    true
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            single_quotes: default_single_quotes(),
        }
    }
}

impl Dialect {
    pub fn is_keyword(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| k == text)
    }
}

/// Output artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    "lmx".to_string()
}

impl Default for Output {
    fn default() -> Self {
        Self {
            extension: default_extension(),
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dialect: Dialect,
    #[serde(default)]
    pub output: Output,
}

/// An error loading or parsing the configuration file.
#[derive(Debug)]
pub enum ConfigError {
    Read(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(e) => write!(f, "failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "failed to parse config file: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(ConfigError::Read)?;
        toml::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Try to load from `xmlang.toml` in the current directory, fall back
    /// to defaults.
    pub fn load_or_default() -> Self {
        Self::from_file("xmlang.toml").unwrap_or_default()
    }
}
