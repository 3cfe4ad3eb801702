//! Shell Completion Engine
//!
//! This library supplements a text editor's inline completions for shell
//! scripts: as the user types, it queries a live login shell for matching
//! commands, filesystem paths and environment variables, without ever
//! blocking the editor's synchronous input-handling thread.
//!
//! # Modules
//!
//! - `config`: Configuration management
//! - `engine`: Completion orchestration, requests and response sinks
//! - `error`: Error types and handling
//! - `exclusion`: Words the editor already offers statically
//! - `executor`: Background execution context
//! - `fetcher`: Category fetchers (commands, files, variables)
//! - `shell`: Login shell query execution
//!
//! # Example
//!
//! ```no_run
//! use std::sync::{Arc, RwLock};
//!
//! use bashcomp::config::Config;
//! use bashcomp::engine::{CompletionEngine, CompletionRequest, response_channel};
//! use bashcomp::exclusion::ExclusionSet;
//! use bashcomp::executor::ExecutionContext;
//! use bashcomp::fetcher::CompletionCategory;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Plugin activation: one context for the process lifetime.
//!     let context = Arc::new(ExecutionContext::start()?);
//!     let engine = CompletionEngine::new(
//!         Arc::new(ExclusionSet::empty()),
//!         Arc::new(RwLock::new(Config::load()?)),
//!         Arc::clone(&context),
//!     );
//!
//!     // Per keystroke: build a request on the editor's callback thread
//!     // and return immediately; poll the slot when the editor is ready.
//!     let (response, slot) = response_channel();
//!     let request = CompletionRequest::new(6, "git ch")
//!         .with_category(CompletionCategory::Command);
//!     engine.resolve(request, response);
//!
//!     // Plugin deactivation.
//!     context.shutdown()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod exclusion;
pub mod executor;
pub mod fetcher;
pub mod shell;

// Re-export commonly used types
pub use config::Config;
pub use engine::{CompletionEngine, CompletionRequest, PendingResponse, ResponseSlot};
pub use error::{BashcompError, Result};
pub use exclusion::ExclusionSet;
pub use executor::ExecutionContext;
pub use fetcher::{CompletionCandidate, CompletionCategory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}
