//! Shell query execution
//!
//! This module runs single command lines inside the user's login shell and
//! captures their output. Queries are executed as `<shell> -l -c "<command>"`
//! so the user's normal startup environment (aliases, functions, exported
//! variables) is visible to `compgen`.
//!
//! Every query carries a bounded wait. A query that outlives its timeout is
//! killed and reported as [`QueryError::Timeout`]; a missing shell executable
//! latches a process-lifetime disable flag and is reported as
//! [`QueryError::ShellNotFound`]. A nonzero exit status is not an error: it
//! is indistinguishable from "no matches" for every caller in this crate.

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::QueryError;

/// Executes one shell command line with a bounded wait
///
/// The trait seam exists so fetchers can be exercised against canned output;
/// [`ShellQueryRunner`] is the only production implementation.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Run one command line, returning its stdout or a typed failure
    async fn run(
        &self,
        command_line: &str,
        working_dir: Option<&Path>,
        wait: Duration,
    ) -> Result<String, QueryError>;
}

/// Hide the console window of spawned shells on Windows.
///
/// Presentation-only: without it every completion query would flash a
/// command window in front of the editor.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Runs command lines inside a configured login shell
///
/// The runner is cheap to share behind an `Arc`; it owns no OS resources
/// between queries. The `disabled` flag is latched the first time the shell
/// executable turns out not to exist and is never reset: per the error
/// policy, a missing shell disables the feature for the rest of the process.
#[derive(Debug)]
pub struct ShellQueryRunner {
    /// Resolved shell command, used verbatim
    shell: String,

    /// Latched when the shell executable is missing
    disabled: AtomicBool,
}

impl ShellQueryRunner {
    /// Create a runner for the given shell command
    ///
    /// # Arguments
    /// * `shell` - Resolved shell executable (path or bare command name)
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            disabled: AtomicBool::new(false),
        }
    }

    /// Whether the runner has latched the feature-wide disable flag
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    /// The shell command this runner spawns
    pub fn shell(&self) -> &str {
        &self.shell
    }
}

#[async_trait]
impl QueryRunner for ShellQueryRunner {
    /// Run one command line in the login shell
    ///
    /// # Arguments
    /// * `command_line` - The command to run
    /// * `working_dir` - Working directory inherited by the shell, if any
    /// * `wait` - Bound on how long the query may take
    ///
    /// # Returns
    /// * `Ok(String)` - Captured stdout, whitespace-trimmed. Empty when the
    ///   command exited nonzero ("no matches").
    /// * `Err(QueryError)` - Timeout, missing shell, or spawn failure.
    async fn run(
        &self,
        command_line: &str,
        working_dir: Option<&Path>,
        wait: Duration,
    ) -> Result<String, QueryError> {
        if self.is_disabled() {
            return Err(QueryError::ShellNotFound);
        }

        let mut command = Command::new(&self.shell);
        command
            .arg("-l")
            .arg("-c")
            .arg(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }

        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // Log once; later calls short-circuit on the latched flag.
                self.disabled.store(true, Ordering::Release);
                warn!("shell '{}' not found, disabling completions", self.shell);
                return Err(QueryError::ShellNotFound);
            }
            Err(e) => return Err(QueryError::Spawn(e.to_string())),
        };

        match timeout(wait, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
                } else {
                    debug!("query '{command_line}' exited with {}", output.status);
                    Ok(String::new())
                }
            }
            Ok(Err(e)) => Err(QueryError::Spawn(e.to_string())),
            Err(_) => {
                // Dropping the timed-out future drops the child, and
                // kill_on_drop reclaims the process. No zombies.
                debug!("query '{command_line}' timed out after {wait:?}");
                Err(QueryError::Timeout)
            }
        }
    }
}
