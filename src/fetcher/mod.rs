//! Category fetchers for shell-derived completion candidates
//!
//! Each fetcher turns the word being typed into one `compgen` query against
//! the user's login shell and maps the surviving output words into completion
//! candidates:
//! - `commands`: executables, aliases and functions (`compgen -c`)
//! - `files`: folders and files (`compgen -f`)
//! - `variables`: environment variables (`compgen -v`)
//!
//! Output words are deduplicated and filtered against the exclusion set of
//! completions the editor already offers statically. A failed query (timeout,
//! missing shell) degrades that fetcher to an empty result; it never fails
//! the request it belongs to.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::exclusion::ExclusionSet;
use crate::shell::QueryRunner;

pub mod commands;
pub mod files;
pub mod variables;

pub use commands::CommandFetcher;
pub use files::FileFetcher;
pub use variables::VariableFetcher;

/// Completion category a candidate belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionCategory {
    /// Shell command, alias or function
    Command,

    /// Folder or file
    File,

    /// Environment variable
    Variable,
}

impl CompletionCategory {
    /// Short kind label shown next to the candidate
    pub fn label(&self) -> &'static str {
        match self {
            CompletionCategory::Command => "command",
            CompletionCategory::File => "filesystem",
            CompletionCategory::Variable => "variable",
        }
    }

    /// Human-readable detail text for the candidate
    pub fn description(&self) -> &'static str {
        match self {
            CompletionCategory::Command => "shell command",
            CompletionCategory::File => "folder or file",
            CompletionCategory::Variable => "global environment variable",
        }
    }
}

/// One suggested piece of text the editor may offer to insert
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompletionCandidate {
    /// Display and match text
    pub trigger: String,

    /// Category the candidate belongs to
    pub category: CompletionCategory,

    /// Text inserted when the candidate is accepted
    pub insertion: String,

    /// Detail text shown alongside the candidate
    pub description: String,
}

impl CompletionCandidate {
    /// Create a candidate whose insertion text equals its trigger
    pub fn new(trigger: impl Into<String>, category: CompletionCategory) -> Self {
        let trigger = trigger.into();
        Self {
            insertion: trigger.clone(),
            description: category.description().to_string(),
            trigger,
            category,
        }
    }

    /// Create a candidate with distinct insertion text
    pub fn with_insertion(
        trigger: impl Into<String>,
        category: CompletionCategory,
        insertion: impl Into<String>,
    ) -> Self {
        Self {
            trigger: trigger.into(),
            insertion: insertion.into(),
            description: category.description().to_string(),
            category,
        }
    }
}

/// Fetches completion candidates for one category
#[async_trait]
pub trait CandidateFetcher: Send + Sync {
    /// Category this fetcher produces
    fn category(&self) -> CompletionCategory;

    /// Fetch candidates for the word being typed
    ///
    /// # Arguments
    /// * `prefix` - The partial word immediately before the cursor
    /// * `working_dir` - Working directory of the edited file, if known
    ///
    /// # Returns
    /// * `Vec<CompletionCandidate>` - Deduplicated candidates; empty on any
    ///   query failure
    async fn fetch(&self, prefix: &str, working_dir: Option<&Path>) -> Vec<CompletionCandidate>;
}

/// Run one query and collect its output into a deduplicated word set
///
/// Splits the output into lines, drops blanks, removes words the exclusion
/// set already knows, and swallows query failures into an empty set so that
/// a broken query can never abort sibling fetchers.
pub(crate) async fn query_words(
    runner: &Arc<dyn QueryRunner>,
    exclusions: &ExclusionSet,
    command_line: &str,
    working_dir: Option<&Path>,
    wait: Duration,
) -> HashSet<String> {
    let text = match runner.run(command_line, working_dir, wait).await {
        Ok(text) => text,
        Err(e) => {
            debug!("query '{command_line}' degraded to empty: {e}");
            return HashSet::new();
        }
    };

    text.lines()
        .map(str::trim_end)
        .filter(|word| !word.is_empty())
        .filter(|word| !exclusions.contains(word))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::error::QueryError;
    use std::sync::Mutex;

    /// Scripted runner returning canned responses in order
    pub(crate) struct ScriptedRunner {
        responses: Mutex<Vec<Result<String, QueryError>>>,
        pub(crate) seen: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        pub(crate) fn new(responses: Vec<Result<String, QueryError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn returning(text: &str) -> Arc<Self> {
            Self::new(vec![Ok(text.to_string())])
        }
    }

    #[async_trait]
    impl QueryRunner for ScriptedRunner {
        async fn run(
            &self,
            command_line: &str,
            _working_dir: Option<&Path>,
            _wait: Duration,
        ) -> Result<String, QueryError> {
            self.seen.lock().unwrap().push(command_line.to_string());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(String::new())
            } else {
                responses.remove(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::ScriptedRunner;
    use super::*;
    use crate::error::QueryError;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_query_words_dedups_and_excludes() {
        let runner: Arc<dyn QueryRunner> = ScriptedRunner::returning("git\ngiphy\ngit\n\ngrep");
        let exclusions = ExclusionSet::load(
            vec![r#"{"scope": "source.shell.bash", "completions": ["grep"]}"#.to_string()],
            |_| true,
        );

        let words =
            tokio_test::block_on(query_words(&runner, &exclusions, "compgen -c g", None, WAIT));
        assert_eq!(words.len(), 2);
        assert!(words.contains("git"));
        assert!(words.contains("giphy"));
        assert!(!words.contains("grep"));
    }

    #[test]
    fn test_query_words_swallows_failures() {
        let runner: Arc<dyn QueryRunner> = ScriptedRunner::new(vec![Err(QueryError::Timeout)]);
        let words = tokio_test::block_on(query_words(
            &runner,
            &ExclusionSet::empty(),
            "compgen -v",
            None,
            WAIT,
        ));
        assert!(words.is_empty());
    }

    #[test]
    fn test_candidate_new_inserts_trigger() {
        let candidate = CompletionCandidate::new("giphy", CompletionCategory::Command);
        assert_eq!(candidate.trigger, "giphy");
        assert_eq!(candidate.insertion, "giphy");
        assert_eq!(candidate.description, "shell command");
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(CompletionCategory::Command.label(), "command");
        assert_eq!(CompletionCategory::File.label(), "filesystem");
        assert_eq!(CompletionCategory::Variable.label(), "variable");
    }
}
