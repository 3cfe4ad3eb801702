//! Completion orchestration
//!
//! This module ties the pieces together: it receives a completion request on
//! the host editor's synchronous thread, hands the work to the background
//! execution context, runs the applicable category fetchers concurrently,
//! merges their candidates and fulfills the request's sink exactly once.
//!
//! The caller thread never blocks. A request whose context is already
//! shutting down is abandoned silently, and a request whose shell turned out
//! to be missing is answered immediately with zero candidates.

use std::sync::{Arc, Mutex, RwLock};

use futures::future::join_all;
use tracing::debug;

use crate::config::Config;
use crate::exclusion::ExclusionSet;
use crate::executor::{ExecutionContext, TaskHandle};
use crate::fetcher::{
    CandidateFetcher, CommandFetcher, CompletionCandidate, CompletionCategory, FileFetcher,
    VariableFetcher,
};
use crate::shell::{QueryRunner, ShellQueryRunner};

pub mod prefix;
pub mod request;

pub use prefix::derive_prefix;
pub use request::{CompletionRequest, PendingResponse, ResponseSlot, response_channel};


/// Orchestrates shell-backed completion for one host editor
///
/// Owns the exclusion set and the shell query runner; dispatches every
/// request onto the shared [`ExecutionContext`]. Configuration is snapshotted
/// per request so host-side changes take effect on the next keystroke.
pub struct CompletionEngine {
    /// Words the editor already offers statically
    exclusions: Arc<ExclusionSet>,

    /// Host-shared configuration, read at query time
    config: Arc<RwLock<Config>>,

    /// Background worker all async work runs on
    context: Arc<ExecutionContext>,

    /// Current runner; replaced when the configured interpreter changes
    runner: Mutex<Arc<ShellQueryRunner>>,
}

impl CompletionEngine {
    /// Create a completion engine
    ///
    /// # Arguments
    /// * `exclusions` - Exclusion set loaded at plugin activation
    /// * `config` - Shared configuration, re-read on every request
    /// * `context` - Running background execution context
    pub fn new(
        exclusions: Arc<ExclusionSet>,
        config: Arc<RwLock<Config>>,
        context: Arc<ExecutionContext>,
    ) -> Self {
        let shell = config.read().unwrap().shell_command();
        Self {
            exclusions,
            config,
            context,
            runner: Mutex::new(Arc::new(ShellQueryRunner::new(shell))),
        }
    }

    /// Whether the feature has been disabled by a missing shell
    pub fn is_disabled(&self) -> bool {
        self.runner.lock().unwrap().is_disabled()
    }

    /// Resolve one completion request
    ///
    /// Callable from the host's synchronous thread; returns immediately.
    /// The merged candidate set is eventually delivered through `response`,
    /// exactly once, after every applicable fetcher has finished. When the
    /// request cannot run (context stopping) the sink is abandoned instead.
    ///
    /// # Arguments
    /// * `request` - The completion request
    /// * `response` - Sink receiving the final candidate set
    ///
    /// # Returns
    /// * `Option<TaskHandle>` - Handle to the scheduled work; `None` when the
    ///   request was answered inline or dropped
    pub fn resolve(
        &self,
        request: CompletionRequest,
        response: PendingResponse,
    ) -> Option<TaskHandle> {
        let config = self.config.read().unwrap().clone();
        let runner = self.runner_for(config.shell_command());

        if runner.is_disabled() {
            // Missing shell: the feature stays silent for the rest of the
            // process. Zero candidates, delivered inline.
            response.fulfill(Vec::new());
            return None;
        }

        let fetchers = self.build_fetchers(&request, &config, runner);
        if fetchers.is_empty() {
            response.fulfill(Vec::new());
            return None;
        }

        let prefix = derive_prefix(&request.raw_prefix_text).to_string();
        let working_dir = request.working_dir;

        let handle = self.context.submit(async move {
            let queries = fetchers
                .iter()
                .map(|fetcher| fetcher.fetch(&prefix, working_dir.as_deref()));

            // A fetcher can only degrade to empty, never fail, so the merge
            // always sees every category's outcome.
            let merged: Vec<CompletionCandidate> =
                join_all(queries).await.into_iter().flatten().collect();

            response.fulfill(merged);
        });

        if handle.is_none() {
            debug!("completion request abandoned: context is shutting down");
        }
        handle
    }

    /// Get the runner for the configured shell
    ///
    /// A changed interpreter produces a fresh runner on the next request. A
    /// disabled runner is kept as-is: the missing-shell condition is terminal
    /// and deliberately survives configuration changes.
    fn runner_for(&self, shell: String) -> Arc<ShellQueryRunner> {
        let mut runner = self.runner.lock().unwrap();
        if !runner.is_disabled() && runner.shell() != shell {
            debug!("interpreter changed to '{shell}'");
            *runner = Arc::new(ShellQueryRunner::new(shell));
        }
        Arc::clone(&runner)
    }

    /// Build the fetchers applicable to one request
    ///
    /// The request's categories come from the host's selector predicates;
    /// the per-category enable flags from the configuration are applied on
    /// top.
    fn build_fetchers(
        &self,
        request: &CompletionRequest,
        config: &Config,
        runner: Arc<ShellQueryRunner>,
    ) -> Vec<Box<dyn CandidateFetcher>> {
        let wait = config.query_timeout();
        let runner: Arc<dyn QueryRunner> = runner;

        let mut fetchers: Vec<Box<dyn CandidateFetcher>> = Vec::new();
        for category in &request.categories {
            let enabled = match category {
                CompletionCategory::Command => config.completion.enable_commands,
                CompletionCategory::File => config.completion.enable_files,
                CompletionCategory::Variable => config.completion.enable_variables,
            };
            if !enabled {
                continue;
            }

            fetchers.push(match category {
                CompletionCategory::Command => Box::new(CommandFetcher::new(
                    Arc::clone(&runner),
                    Arc::clone(&self.exclusions),
                    wait,
                )),
                CompletionCategory::File => Box::new(FileFetcher::new(
                    Arc::clone(&runner),
                    Arc::clone(&self.exclusions),
                    wait,
                )),
                CompletionCategory::Variable => Box::new(VariableFetcher::new(
                    Arc::clone(&runner),
                    Arc::clone(&self.exclusions),
                    wait,
                )),
            });
        }
        fetchers
    }
}
