//! Filesystem entry completion fetcher

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{CandidateFetcher, CompletionCandidate, CompletionCategory, query_words};
use crate::exclusion::ExclusionSet;
use crate::shell::QueryRunner;

/// Gathers folders and files via `compgen -f`
///
/// The typed prefix is always forwarded to the shell; an empty prefix lists
/// the working directory, which is a useful result rather than a hazard.
pub struct FileFetcher {
    runner: Arc<dyn QueryRunner>,
    exclusions: Arc<ExclusionSet>,
    wait: Duration,
}

impl FileFetcher {
    /// Create a file fetcher
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
impl CandidateFetcher for FileFetcher {
    fn category(&self) -> CompletionCategory {
        CompletionCategory::File
    }

    async fn fetch(&self, prefix: &str, working_dir: Option<&Path>) -> Vec<CompletionCandidate> {
        let command_line = format!("compgen -f {prefix}");
        query_words(
            &self.runner,
            &self.exclusions,
            &command_line,
            working_dir,
            self.wait,
        )
        .await
        .into_iter()
        .map(|word| CompletionCandidate::new(word, CompletionCategory::File))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::fetcher::test_support::ScriptedRunner;

    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_empty_prefix_still_queries() {
        let runner = ScriptedRunner::returning("src\nCargo.toml");
        let fetcher = FileFetcher::new(runner.clone(), Arc::new(ExclusionSet::empty()), WAIT);

        let candidates = fetcher.fetch("", None).await;
        assert_eq!(candidates.len(), 2);
        assert_eq!(
            runner.seen.lock().unwrap().as_slice(),
            ["compgen -f ".to_string()]
        );
    }

    #[tokio::test]
    async fn test_prefix_forwarded() {
        let runner = ScriptedRunner::returning("src");
        let fetcher = FileFetcher::new(runner.clone(), Arc::new(ExclusionSet::empty()), WAIT);

        let candidates = fetcher.fetch("sr", None).await;
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].trigger, "src");
        assert_eq!(candidates[0].category, CompletionCategory::File);
        assert_eq!(
            runner.seen.lock().unwrap().as_slice(),
            ["compgen -f sr".to_string()]
        );
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_empty() {
        let runner = ScriptedRunner::new(vec![Err(QueryError::Timeout)]);
        let fetcher = FileFetcher::new(runner, Arc::new(ExclusionSet::empty()), WAIT);

        let candidates = fetcher.fetch("sr", None).await;
        assert!(candidates.is_empty());
    }
}
