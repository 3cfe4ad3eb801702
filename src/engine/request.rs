//! Completion request and single-assignment response sink

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use tracing::debug;

use crate::fetcher::{CompletionCandidate, CompletionCategory};

/// One completion query, immutable once constructed
///
/// Created by the host per synchronous query and discarded after the
/// response is delivered. Which categories apply is decided by the host's
/// selector predicates, not by this crate.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Cursor position (byte index) in the edited line
    pub cursor_position: usize,

    /// Raw line text from its start to the cursor
    pub raw_prefix_text: String,

    /// Working directory for shell queries, if known
    pub working_dir: Option<PathBuf>,

    /// Categories the cursor position qualifies for
    pub categories: HashSet<CompletionCategory>,
}

impl CompletionRequest {
    /// Create a request with no applicable categories
    ///
    /// # Arguments
    /// * `cursor_position` - Cursor position (byte index)
    /// * `raw_prefix_text` - Line text from its start to the cursor
    pub fn new(cursor_position: usize, raw_prefix_text: impl Into<String>) -> Self {
        Self {
            cursor_position,
            raw_prefix_text: raw_prefix_text.into(),
            working_dir: None,
            categories: HashSet::new(),
        }
    }

    /// Set the working directory for shell queries
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Guess the working directory from the edited file's path
    ///
    /// Files without a parent directory (unsaved buffers) leave the working
    /// directory unset.
    pub fn with_file(mut self, file_path: &Path) -> Self {
        self.working_dir = file_path.parent().map(Path::to_path_buf);
        self
    }

    /// Mark a category as applicable
    pub fn with_category(mut self, category: CompletionCategory) -> Self {
        self.categories.insert(category);
        self
    }
}

/// Create a linked response sink and slot for one request
///
/// The [`PendingResponse`] travels to the background worker; the
/// [`ResponseSlot`] stays with the host's synchronous thread.
pub fn response_channel() -> (PendingResponse, ResponseSlot) {
    let (tx, rx) = mpsc::channel();
    (PendingResponse { tx }, ResponseSlot { rx })
}

/// Single-assignment sink for the eventual answer to one request
///
/// `fulfill` consumes the sink, so delivering twice is impossible by
/// construction. Dropping the sink without fulfilling it is the legal
/// outcome for a cancelled or superseded request: the slot simply never
/// produces candidates.
#[derive(Debug)]
pub struct PendingResponse {
    tx: mpsc::Sender<Vec<CompletionCandidate>>,
}

impl PendingResponse {
    /// Deliver the final candidate set
    ///
    /// Safe to call from the worker thread while the host observes the slot
    /// from its own thread. A host that already dropped its slot is ignored.
    pub fn fulfill(self, candidates: Vec<CompletionCandidate>) {
        if self.tx.send(candidates).is_err() {
            debug!("response slot dropped before fulfillment");
        }
    }
}

/// Host-side view of one pending response
#[derive(Debug)]
pub struct ResponseSlot {
    rx: mpsc::Receiver<Vec<CompletionCandidate>>,
}

impl ResponseSlot {
    /// Take the candidates if they have already been delivered
    pub fn try_take(&self) -> Option<Vec<CompletionCandidate>> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `wait` for the candidates
    ///
    /// Returns `None` on timeout and when the request was abandoned.
    pub fn wait_timeout(&self, wait: Duration) -> Option<Vec<CompletionCandidate>> {
        self.rx.recv_timeout(wait).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new(6, "cat sr")
            .with_working_dir("/tmp")
            .with_category(CompletionCategory::File)
            .with_category(CompletionCategory::File);

        assert_eq!(request.cursor_position, 6);
        assert_eq!(request.raw_prefix_text, "cat sr");
        assert_eq!(request.working_dir.as_deref(), Some(Path::new("/tmp")));
        assert_eq!(request.categories.len(), 1);
    }

    #[test]
    fn test_with_file_uses_parent() {
        let request =
            CompletionRequest::new(0, "").with_file(Path::new("/home/user/scripts/build.sh"));
        assert_eq!(
            request.working_dir.as_deref(),
            Some(Path::new("/home/user/scripts"))
        );
    }

    #[test]
    fn test_fulfill_delivers_once() {
        let (response, slot) = response_channel();
        assert!(slot.try_take().is_none());

        response.fulfill(vec![CompletionCandidate::new(
            "giphy",
            CompletionCategory::Command,
        )]);

        let candidates = slot.try_take().expect("candidates delivered");
        assert_eq!(candidates.len(), 1);
        // The sink is consumed; nothing further can arrive.
        assert!(slot.try_take().is_none());
    }

    #[test]
    fn test_abandoned_sink_never_delivers() {
        let (response, slot) = response_channel();
        drop(response);

        assert!(slot.try_take().is_none());
        assert!(slot.wait_timeout(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn test_fulfill_from_another_thread() {
        let (response, slot) = response_channel();

        std::thread::spawn(move || {
            response.fulfill(vec![CompletionCandidate::new(
                "PATH",
                CompletionCategory::Variable,
            )]);
        });

        let candidates = slot.wait_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(candidates[0].trigger, "PATH");
    }

    #[test]
    fn test_fulfill_ignores_dropped_slot() {
        let (response, slot) = response_channel();
        drop(slot);
        // Must not panic.
        response.fulfill(Vec::new());
    }
}
