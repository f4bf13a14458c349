//! Configuration for keybridge embeddings and tooling.
//!
//! Configuration lives in `keybridge.toml`:
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "pretty"   # or "json"
//!
//! [symbols]
//! path = "symbols.txt"
//! ```
//!
//! Every section and field is optional.
//!
//! # Resolution Algorithm
//!
//! 1. `KEYBRIDGE_CONFIG` environment variable, if it names an existing file
//! 2. Current directory
//! 3. Parent directories (walk up to filesystem root)
//! 4. XDG config directory (`~/.config/keybridge/keybridge.toml`)
//!
//! A missing file is not an error; callers fall back to
//! [`Config::default`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::symbols::DEFAULT_SYMBOLS_FILE;

/// File name searched for during resolution.
pub const CONFIG_FILE_NAME: &str = "keybridge.toml";

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "KEYBRIDGE_CONFIG";

/// Errors that can occur during configuration resolution or loading.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// I/O error when reading a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error when a config file is malformed.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file not found.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// Config parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level `keybridge.toml` contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Logging setup for embedders and the CLI.
    pub logging: LoggingConfig,

    /// Symbol list used for validity filtering.
    pub symbols: SymbolsConfig,

    /// Directory of the file this config was loaded from.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// `[symbols]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SymbolsConfig {
    /// Path to the symbol list, relative to the config file when not absolute.
    pub path: PathBuf,
}

impl Default for SymbolsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SYMBOLS_FILE),
        }
    }
}

impl Config {
    /// Loads and parses a config file from the given path.
    ///
    /// # Errors
    ///
    /// Returns `Err(ConfigError)` if:
    /// - The file cannot be read (returns `NotFound` variant)
    /// - The file cannot be parsed as TOML
    /// - A field holds an unusable value
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|_e| ConfigError::NotFound(path.to_path_buf()))?;

        let mut config = Self::parse(&contents)?;
        config.base_dir = path.parent().map(Path::to_path_buf);

        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Parses config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Err(ConfigError)` if the text is not valid TOML for this
    /// schema or a field holds an unusable value.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Finds and loads a config file using the resolution algorithm.
    ///
    /// # Errors
    ///
    /// Returns `Err(ConfigError)` if a config file was found but could not be
    /// read or parsed.
    pub fn load_resolved() -> Result<Option<Self>, ConfigError> {
        let current = std::env::current_dir()?;
        let env_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        Self::resolve_from(
            Some(&current),
            env_path.as_deref(),
            xdg_config_path().as_deref(),
        )
    }

    /// Resolution with every input made explicit.
    ///
    /// `env_path` and `xdg_path` are only used if they name existing files.
    /// The directory walk is skipped when `start_dir` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `Err(ConfigError)` if a config file was found but could not be
    /// read or parsed.
    pub fn resolve_from(
        start_dir: Option<&Path>,
        env_path: Option<&Path>,
        xdg_path: Option<&Path>,
    ) -> Result<Option<Self>, ConfigError> {
        if let Some(path) = env_path
            && path.exists()
        {
            return Self::load(path).map(Some);
        }

        for dir in start_dir.into_iter().flat_map(Path::ancestors) {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Self::load(candidate).map(Some);
            }
        }

        if let Some(path) = xdg_path
            && path.exists()
        {
            return Self::load(path).map(Some);
        }

        Ok(None)
    }

    /// Symbol list path, resolved against the config file's directory.
    #[must_use]
    pub fn symbols_path(&self) -> PathBuf {
        match &self.base_dir {
            Some(base) if self.symbols.path.is_relative() => base.join(&self.symbols.path),
            _ => self.symbols.path.clone(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "logging.level must not be empty".to_string(),
            ));
        }
        if self.symbols.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "symbols.path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// XDG location of the config file.
fn xdg_config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("keybridge").join(CONFIG_FILE_NAME))
}
