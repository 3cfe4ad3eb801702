//! Shell command completion fetcher

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{CandidateFetcher, CompletionCandidate, CompletionCategory, query_words};
use crate::exclusion::ExclusionSet;
use crate::shell::QueryRunner;

/// Gathers shell commands, aliases, functions and executables on the search
/// path via `compgen -c`
pub struct CommandFetcher {
    runner: Arc<dyn QueryRunner>,
    exclusions: Arc<ExclusionSet>,
    wait: Duration,
}

impl CommandFetcher {
    /// Create a command fetcher
    ///
    /// # Arguments
    /// * `runner` - Shell query runner
    /// * `exclusions` - Words the editor already offers statically
    /// * `wait` - Per-query timeout
    pub fn new(
        runner: Arc<dyn QueryRunner>,
        exclusions: Arc<ExclusionSet>,
        wait: Duration,
    ) -> Self {
        Self {
            runner,
            exclusions,
            wait,
        }
    }
}

#[async_trait]
impl CandidateFetcher for CommandFetcher {
    fn category(&self) -> CompletionCategory {
        CompletionCategory::Command
    }

    async fn fetch(&self, prefix: &str, working_dir: Option<&Path>) -> Vec<CompletionCandidate> {
        if prefix.is_empty() {
            // An unfiltered listing of every executable on PATH is unusably
            // large; don't even ask.
            return Vec::new();
        }

        let command_line = format!("compgen -c {prefix}");
        query_words(
            &self.runner,
            &self.exclusions,
            &command_line,
            working_dir,
            self.wait,
        )
        .await
        .into_iter()
        .map(|word| CompletionCandidate::new(word, CompletionCategory::Command))
        .collect()
    }
}
