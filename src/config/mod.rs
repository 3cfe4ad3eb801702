//! Configuration management for bashcomp
//!
//! This module handles loading, parsing, and managing configuration from various sources:
//! - Configuration files (TOML format)
//! - Environment variables
//! - Host editor settings passed in at request time
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values
//!
//! The engine never caches configuration across requests: the host holds the
//! `Config` behind a shared lock and the engine snapshots the relevant fields
//! each time a completion request is resolved, so changes take effect on the
//! next keystroke.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "BASHCOMP_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Completion behavior configuration
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Shell invocation configuration
    #[serde(default)]
    pub shell: ShellConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Completion behavior configuration
///
/// The selector strings are opaque to this crate: they are stored here and
/// handed to the host editor's scope-matching collaborator, which decides
/// whether a cursor position qualifies for each completion category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Offer shell command completions
    #[serde(default = "default_enabled")]
    pub enable_commands: bool,

    /// Offer filesystem entry completions
    #[serde(default = "default_enabled")]
    pub enable_files: bool,

    /// Offer environment variable completions
    #[serde(default = "default_enabled")]
    pub enable_variables: bool,

    /// Selector gating completion as a whole
    #[serde(default = "default_completion_selector")]
    pub completion_selector: String,

    /// Selector gating command completions
    #[serde(default = "default_command_selector")]
    pub command_selector: String,

    /// Selector gating filesystem completions
    #[serde(default = "default_file_selector")]
    pub file_selector: String,

    /// Selector gating variable completions
    #[serde(default)]
    pub variable_selector: String,
}

/// Shell invocation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Override for the shell executable
    ///
    /// `None` defers to the host-resolved default (`bash`). Locating a shell
    /// on exotic platforms is the host's job; whatever string ends up here is
    /// used verbatim as the command to spawn.
    #[serde(default)]
    pub interpreter: Option<String>,

    /// Per-query timeout in milliseconds
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_enabled() -> bool {
    true
}

fn default_completion_selector() -> String {
    "source.shell - comment - string.quoted".to_string()
}

fn default_command_selector() -> String {
    "meta.function-call.identifier".to_string()
}

fn default_file_selector() -> String {
    "- meta.function-call.identifier".to_string()
}

fn default_query_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            completion: CompletionConfig::default(),
            shell: ShellConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            enable_commands: default_enabled(),
            enable_files: default_enabled(),
            enable_variables: default_enabled(),
            completion_selector: default_completion_selector(),
            command_selector: default_command_selector(),
            file_selector: default_file_selector(),
            variable_selector: String::new(),
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            interpreter: None,
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: Config =
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from all sources with proper precedence
    ///
    /// Reads the default config file when present, then applies environment
    /// variable overrides on top.
    ///
    /// # Returns
    /// * `Result<Config>` - Merged configuration or error
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Variables are prefixed with BASHCOMP_
    /// Example: BASHCOMP_QUERY_TIMEOUT_MS=2000
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var(format!("{ENV_PREFIX}INTERPRETER")) {
            if !v.is_empty() {
                self.shell.interpreter = Some(v);
            }
        }
        if let Ok(v) = env::var(format!("{ENV_PREFIX}QUERY_TIMEOUT_MS")) {
            if let Ok(ms) = v.parse() {
                self.shell.query_timeout_ms = ms;
            }
        }
        if let Ok(v) = env::var(format!("{ENV_PREFIX}ENABLE_COMMANDS")) {
            if let Ok(b) = v.parse() {
                self.completion.enable_commands = b;
            }
        }
        if let Ok(v) = env::var(format!("{ENV_PREFIX}ENABLE_FILES")) {
            if let Ok(b) = v.parse() {
                self.completion.enable_files = b;
            }
        }
        if let Ok(v) = env::var(format!("{ENV_PREFIX}ENABLE_VARIABLES")) {
            if let Ok(b) = v.parse() {
                self.completion.enable_variables = b;
            }
        }
        if let Ok(v) = env::var(format!("{ENV_PREFIX}LOG_LEVEL")) {
            if let Some(level) = LogLevel::parse(&v) {
                self.logging.level = level;
            }
        }
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - Path to default configuration file
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bashcomp")
            .join("config.toml")
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if self.shell.query_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "shell.query_timeout_ms".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if let Some(interpreter) = &self.shell.interpreter {
            if interpreter.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "shell.interpreter".to_string(),
                    value: interpreter.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Get per-query timeout as Duration
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.shell.query_timeout_ms)
    }

    /// Get the shell command to spawn
    ///
    /// Falls back to plain `bash` when no interpreter override is configured.
    pub fn shell_command(&self) -> String {
        self.shell
            .interpreter
            .clone()
            .unwrap_or_else(|| "bash".to_string())
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse a level name, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Initialize logging based on the given configuration
///
/// Intended to be called once by the host at plugin activation. Errors from
/// double initialization are ignored so an embedding host that already set up
/// a subscriber keeps its own.
pub fn initialize_logging(config: &LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_max_level(config.level.to_tracing_level())
        .with_target(false);

    let result = if config.timestamps {
        builder.try_init()
    } else {
        builder.without_time().try_init()
    };

    if result.is_err() {
        tracing::debug!("logging already initialized by the host");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.completion.enable_commands);
        assert!(config.completion.enable_files);
        assert!(config.completion.enable_variables);
        assert_eq!(config.shell.interpreter, None);
        assert_eq!(config.shell.query_timeout_ms, 5000);
        assert_eq!(
            config.completion.completion_selector,
            "source.shell - comment - string.quoted"
        );
    }

    #[test]
    fn test_shell_command_fallback() {
        let config = Config::default();
        assert_eq!(config.shell_command(), "bash");

        let mut config = Config::default();
        config.shell.interpreter = Some("/usr/local/bin/bash".to_string());
        assert_eq!(config.shell_command(), "/usr/local/bin/bash");
    }

    #[test]
    fn test_query_timeout() {
        let config = Config::default();
        assert_eq!(config.query_timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn test_parse_toml() {
        let text = r#"
            [completion]
            enable_variables = false

            [shell]
            interpreter = "zsh"
            query_timeout_ms = 2500
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert!(config.completion.enable_commands);
        assert!(!config.completion.enable_variables);
        assert_eq!(config.shell.interpreter.as_deref(), Some("zsh"));
        assert_eq!(config.shell.query_timeout_ms, 2500);
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.shell.query_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_interpreter() {
        let mut config = Config::default();
        config.shell.interpreter = Some("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("warn"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("nope"), None);
    }

    #[test]
    fn test_log_level_to_tracing() {
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
