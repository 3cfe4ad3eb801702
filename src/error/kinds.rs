use std::{fmt, io};

/// Crate-wide `Result` type using [`BashcompError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, BashcompError>;

/// Top-level error type for bashcomp operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum BashcompError {
    /// Shell query errors.
    Query(QueryError),

    /// Configuration errors.
    Config(ConfigError),

    /// Background execution context errors.
    Runtime(RuntimeError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Errors produced by a single shell query.
///
/// Only `ShellNotFound` is terminal for the completion feature; every other
/// variant degrades one query to "no output" and leaves future requests
/// unaffected.
#[derive(Debug)]
pub enum QueryError {
    /// The configured shell executable does not exist.
    ///
    /// Terminal condition: the engine disables itself for the remaining
    /// process lifetime and never retries.
    ShellNotFound,

    /// The query did not complete within its bounded wait.
    Timeout,

    /// Spawning or reaping the shell process failed for another reason.
    Spawn(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    FileRead { path: String, reason: String },

    /// Config file could not be parsed.
    ParseFailed(String),

    /// A configuration value is out of range or malformed.
    InvalidValue { field: String, value: String },
}

/// Background execution context errors.
#[derive(Debug)]
pub enum RuntimeError {
    /// Work was submitted while the context was stopping or stopped.
    ///
    /// Submissions in that window are silently dropped; this variant exists
    /// for hosts that want to surface the condition in their own logs.
    SubmitAfterShutdown,

    /// The worker thread panicked and could not be joined cleanly.
    WorkerPanicked,
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for BashcompError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BashcompError::Query(e) => write!(f, "Query error: {e}"),
            BashcompError::Config(e) => write!(f, "Configuration error: {e}"),
            BashcompError::Runtime(e) => write!(f, "Runtime error: {e}"),
            BashcompError::Io(e) => write!(f, "I/O error: {e}"),
            BashcompError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::ShellNotFound => write!(f, "Shell executable not found"),
            QueryError::Timeout => write!(f, "Shell query timed out"),
            QueryError::Spawn(msg) => write!(f, "Failed to run shell query: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileRead { path, reason } => {
                write!(f, "Failed to read config file '{path}': {reason}")
            }
            ConfigError::ParseFailed(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::SubmitAfterShutdown => {
                write!(f, "Work submitted after shutdown began")
            }
            RuntimeError::WorkerPanicked => write!(f, "Background worker panicked"),
        }
    }
}

impl std::error::Error for BashcompError {}
impl std::error::Error for QueryError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for RuntimeError {}

/* ========================= Conversions to BashcompError ========================= */

impl From<io::Error> for BashcompError {
    fn from(err: io::Error) -> Self {
        BashcompError::Io(err)
    }
}

impl From<QueryError> for BashcompError {
    fn from(err: QueryError) -> Self {
        BashcompError::Query(err)
    }
}

impl From<ConfigError> for BashcompError {
    fn from(err: ConfigError) -> Self {
        BashcompError::Config(err)
    }
}

impl From<RuntimeError> for BashcompError {
    fn from(err: RuntimeError) -> Self {
        BashcompError::Runtime(err)
    }
}

impl From<String> for BashcompError {
    fn from(msg: String) -> Self {
        BashcompError::Generic(msg)
    }
}

impl From<&str> for BashcompError {
    fn from(msg: &str) -> Self {
        BashcompError::Generic(msg.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_display() {
        assert_eq!(
            QueryError::ShellNotFound.to_string(),
            "Shell executable not found"
        );
        assert_eq!(QueryError::Timeout.to_string(), "Shell query timed out");
    }

    #[test]
    fn test_error_conversion() {
        let err: BashcompError = QueryError::Timeout.into();
        assert!(matches!(err, BashcompError::Query(QueryError::Timeout)));

        let err: BashcompError = "something broke".into();
        assert_eq!(err.to_string(), "something broke");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "query_timeout_ms".to_string(),
            value: "0".to_string(),
        };
        assert!(err.to_string().contains("query_timeout_ms"));
    }
}
