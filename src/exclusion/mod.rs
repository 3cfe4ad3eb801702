//! Exclusion set of completions already known to the host editor
//!
//! Editors usually ship static completion lists for shell scripts: keywords,
//! built-in commands and variables. Offering those words again from a live
//! shell query would produce duplicates, so at plugin load the host hands
//! this module its static completion-definition resources and the words they
//! contain are collected into a read-only set that every fetcher subtracts
//! from its results.
//!
//! Loading is a one-time ETL step: parse each resource, keep the ones whose
//! scope matches the bash-like grammar, and record each entry's trigger word.
//! A missing or unparseable resource is skipped silently. After `load`
//! returns the set is never mutated, so reads are lock-free from any number
//! of threads.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::debug;

/// One structured completion-definition resource
///
/// Mirrors the JSON shape of static completion files: a scope selector plus
/// a list of entries, where each entry is either a bare word or an object
/// carrying a `trigger` field.
#[derive(Debug, Deserialize)]
pub struct CompletionResource {
    /// Scope selector the resource applies to
    pub scope: String,

    /// Completion entries
    #[serde(default)]
    pub completions: Vec<serde_json::Value>,
}

/// Immutable set of completion words known to the host's static tooling
#[derive(Debug, Default)]
pub struct ExclusionSet {
    words: HashSet<String>,
}

impl ExclusionSet {
    /// Create an empty exclusion set
    ///
    /// Useful for hosts without static completion resources and for tests.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the exclusion set from completion-definition resources
    ///
    /// # Arguments
    /// * `sources` - Raw JSON texts of the completion-definition resources
    /// * `scope_matches` - Host predicate deciding whether a scope selector
    ///   applies to the bash-like grammar; it receives the first
    ///   whitespace-separated token of each resource's scope
    ///
    /// # Returns
    /// * `ExclusionSet` - The populated set; sources that fail to parse are
    ///   skipped silently
    pub fn load<I, F>(sources: I, scope_matches: F) -> Self
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> bool,
    {
        let mut words = HashSet::new();

        for source in sources {
            let resource: CompletionResource = match serde_json::from_str(&source) {
                Ok(res) => res,
                Err(e) => {
                    debug!("skipping unparseable completion resource: {e}");
                    continue;
                }
            };

            let scope_head = resource.scope.split_whitespace().next().unwrap_or("");
            if !scope_matches(scope_head) {
                continue;
            }

            for entry in resource.completions {
                words.insert(entry_trigger(&entry));
            }
        }

        debug!("loaded {} known completion words", words.len());
        Self { words }
    }

    /// Check whether a word is already known to the host's static tooling
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Number of known words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Extract the trigger word from one completion entry
///
/// Entries are either bare strings or objects with a `trigger` field. An
/// object without a trigger falls back to the string form of the whole entry.
fn entry_trigger(entry: &serde_json::Value) -> String {
    match entry {
        serde_json::Value::String(word) => word.clone(),
        other => match other.get("trigger").and_then(|t| t.as_str()) {
            Some(trigger) => trigger.to_string(),
            None => other.to_string(),
        },
    }
}
