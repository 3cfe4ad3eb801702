//! Error handling module for the completion engine.
//!
//! This module provides error handling for shell-backed completion with:
//! - A typed failure taxonomy for shell queries (missing shell, timeout)
//! - Configuration and runtime error kinds
//! - A crate-wide `Result` alias
//!
//! Failures are contained at the fetcher boundary: a failed query degrades
//! one fetcher to "no output" and is never allowed to abort sibling fetchers
//! or crash the background worker. Only a missing shell executable escalates,
//! and it does so as a feature-wide disable flag rather than an error that
//! reaches the host editor.

pub mod kinds;

// Re-export commonly used types
pub use kinds::{BashcompError, ConfigError, QueryError, Result, RuntimeError};
