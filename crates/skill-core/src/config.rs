//! Configuration parsing for the skill engine.
//!
//! Files are `key=value` lines with `#` comments.
//! Precedence: CLI flags > `--config` file > `./skills.conf` > defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Default acceptance threshold for fuzzy matches.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Default number of records kept by ranking.
pub const DEFAULT_TOP_N: usize = 20;

/// Config file picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "skills.conf";

/// Fatal configuration and taxonomy load errors.
///
/// This is the only error kind the engine surfaces; everything after load is total.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("invalid config line: {0}")]
    InvalidLine(String),
    #[error("invalid boolean value for {key}: {value}")]
    InvalidBool { key: String, value: String },
    #[error("invalid integer value for {key}: {value}")]
    InvalidInt { key: String, value: String },
    #[error("invalid float value for {key}: {value}")]
    InvalidFloat { key: String, value: String },
    #[error("threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),
    #[error("malformed taxonomy: {0}")]
    MalformedTaxonomy(String),
    #[error("taxonomy contains no skills")]
    EmptyTaxonomy,
    #[error("unsupported taxonomy format: {0}")]
    UnsupportedFormat(String),
}

/// Which tokenizer the extractor should use for the single-token pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    /// Linguistic when compiled in, regex otherwise.
    #[default]
    Auto,
    Regex,
    Linguistic,
}

impl TokenizerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Regex => "regex",
            Self::Linguistic => "linguistic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(Self::Auto),
            "regex" => Some(Self::Regex),
            "linguistic" => Some(Self::Linguistic),
            _ => None,
        }
    }
}

/// How the containment stage picks among candidates that clear the threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainmentPolicy {
    /// First candidate in taxonomy order whose ratio clears the threshold.
    #[default]
    First,
    /// Highest ratio among all candidates; ties keep taxonomy order.
    Best,
}

impl ContainmentPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Best => "best",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "first" => Some(Self::First),
            "best" => Some(Self::Best),
            _ => None,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Taxonomy file (JSON or YAML). `None` uses the built-in taxonomy.
    pub taxonomy_path: Option<PathBuf>,
    /// Minimum confidence for the fuzzy matching stages (default: 0.5).
    pub threshold: f64,
    /// Number of records kept by ranking (default: 20).
    pub top_n: usize,
    pub tokenizer: TokenizerKind,
    pub containment_policy: ContainmentPolicy,
    /// Run the phrase-chunk pass when the tokenizer supplies phrases (default: true).
    pub phrase_chunks: bool,
    /// Stop-word list used by the linguistic tokenizer (default: en).
    pub stopword_language: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            taxonomy_path: None,
            threshold: DEFAULT_THRESHOLD,
            top_n: DEFAULT_TOP_N,
            tokenizer: TokenizerKind::Auto,
            containment_policy: ContainmentPolicy::First,
            phrase_chunks: true,
            stopword_language: "en".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load config from a file, merging with defaults.
    ///
    /// A relative `taxonomy_path` is resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.load_file(path)?;
        if let Some(parent) = path.parent() {
            config.resolve_paths(parent);
        }
        Ok(config)
    }

    /// Load and merge values from a config file.
    pub fn load_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)?;
        self.parse_content(&content)
    }

    /// Parse config content (key=value format).
    pub fn parse_content(&mut self, content: &str) -> Result<(), ConfigError> {
        for line in content.lines() {
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ConfigError::InvalidLine(line.to_string()));
            };

            let key = key.trim();
            let value = Self::unquote(value.trim());

            self.apply_value(key, &value)?;
        }
        Ok(())
    }

    /// Remove surrounding quotes from a value.
    fn unquote(value: &str) -> String {
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            return value[1..value.len() - 1].to_string();
        }
        value.to_string()
    }

    /// Apply a single config value.
    fn apply_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "taxonomy_path" => {
                self.taxonomy_path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                }
            }
            "threshold" => {
                let threshold: f64 = value.parse().map_err(|_| ConfigError::InvalidFloat {
                    key: key.to_string(),
                    value: value.to_string(),
                })?;
                self.threshold = validate_threshold(threshold)?;
            }
            "top_n" => {
                self.top_n = value.parse().map_err(|_| ConfigError::InvalidInt {
                    key: key.to_string(),
                    value: value.to_string(),
                })?;
            }
            "tokenizer" => {
                self.tokenizer = TokenizerKind::parse(value).ok_or_else(|| {
                    ConfigError::InvalidLine(format!(
                        "tokenizer must be 'auto', 'regex', or 'linguistic', got '{value}'"
                    ))
                })?;
            }
            "containment_policy" => {
                self.containment_policy = ContainmentPolicy::parse(value).ok_or_else(|| {
                    ConfigError::InvalidLine(format!(
                        "containment_policy must be 'first' or 'best', got '{value}'"
                    ))
                })?;
            }
            "phrase_chunks" => self.phrase_chunks = Self::parse_bool(key, value)?,
            "stopword_language" => self.stopword_language = value.to_string(),
            _ => {
                warn!(key, "unknown config key, ignoring");
            }
        }
        Ok(())
    }

    /// Parse a boolean value.
    fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "on" => Ok(true),
            "false" | "0" | "no" | "n" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Resolve a relative taxonomy path against a base directory.
    pub fn resolve_paths(&mut self, base: &Path) {
        if let Some(ref path) = self.taxonomy_path {
            if path.is_relative() && !base.as_os_str().is_empty() {
                self.taxonomy_path = Some(base.join(path));
            }
        }
    }
}

/// Reject thresholds outside `[0, 1]` (including NaN).
pub fn validate_threshold(threshold: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(ConfigError::ThresholdOutOfRange(threshold))
    }
}
