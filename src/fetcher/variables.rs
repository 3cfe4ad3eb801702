//! Environment variable completion fetcher

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{CandidateFetcher, CompletionCandidate, CompletionCategory, query_words};
use crate::exclusion::ExclusionSet;
use crate::shell::QueryRunner;

/// Gathers shell environment variables via `compgen -v`
///
/// The typed prefix is never forwarded to the shell; all variable names are
/// fetched and the editor narrows them down with its own prefix matching.
/// The prefix only decides the insertion text: when the user has already
/// typed the `$` sigil the bare name is inserted, otherwise the insertion is
/// `$`-prefixed.
pub struct VariableFetcher {
    runner: Arc<dyn QueryRunner>,
    exclusions: Arc<ExclusionSet>,
    wait: Duration,
}

impl VariableFetcher {
    /// Create a variable fetcher
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
impl CandidateFetcher for VariableFetcher {
    fn category(&self) -> CompletionCategory {
        CompletionCategory::Variable
    }

    async fn fetch(&self, prefix: &str, working_dir: Option<&Path>) -> Vec<CompletionCandidate> {
        let words = query_words(
            &self.runner,
            &self.exclusions,
            "compgen -v",
            working_dir,
            self.wait,
        )
        .await;

        let sigil_typed = prefix.starts_with('$');
        words
            .into_iter()
            .map(|word| {
                let insertion = if sigil_typed {
                    word.clone()
                } else {
                    format!("${word}")
                };
                CompletionCandidate::with_insertion(word, CompletionCategory::Variable, insertion)
            })
            .collect()
    }
}
