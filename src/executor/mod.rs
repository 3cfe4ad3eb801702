//! Background execution context for completion work
//!
//! This module owns the concurrency substrate every asynchronous part of the
//! engine runs on: a single current-thread tokio runtime living on one
//! dedicated worker thread. The host editor's callback thread submits work
//! and returns immediately; it never blocks on the worker.
//!
//! The context is an explicit singleton resource with a state machine
//! `Stopped -> Starting -> Running -> Stopping -> Stopped`. Creating a second
//! context while one is live, or shutting down a context that is not running,
//! is a programming error and panics. Submitting work while the context is
//! stopping is not an error: the work is silently dropped, because the
//! feature is shutting down rather than broken.
//!
//! Shutdown is deterministic: every registered in-flight task is aborted,
//! the worker is signalled and joined, and dropping the runtime reclaims any
//! kill-on-drop subprocesses still attached to aborted tasks.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc};
use std::thread;

use tokio::runtime::Builder;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, RuntimeError};

/// Process-wide liveness guard: at most one context may be running.
static CONTEXT_LIVE: AtomicBool = AtomicBool::new(false);

/// Lifecycle states of the execution context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// No worker exists
    Stopped,

    /// Worker thread and runtime are being allocated
    Starting,

    /// Accepting work from any caller thread
    Running,

    /// Shutdown has begun; new work is dropped
    Stopping,
}

/// Registry of in-flight work, guarded together with the state so that a
/// submission can never race past the beginning of shutdown.
struct Registry {
    state: ContextState,
    tasks: HashMap<u64, AbortHandle>,
    next_id: u64,
}

/// Handle to one submitted unit of work
///
/// Aborting the handle cancels the task at its next suspension point; an
/// aborted task never fulfills whatever sink it carries.
pub struct TaskHandle {
    id: u64,
    registry: Arc<Mutex<Registry>>,
    abort: AbortHandle,
}

impl TaskHandle {
    /// Cancel the task and remove it from the in-flight registry
    pub fn abort(&self) {
        self.abort.abort();
        lock(&self.registry).tasks.remove(&self.id);
    }

    /// Whether the task has completed (or was aborted)
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

/// Persistent background worker owning the async substrate
///
/// Created at plugin activation, torn down at deactivation. Shared by every
/// request for the lifetime of the process; requests only dispatch onto it.
pub struct ExecutionContext {
    registry: Arc<Mutex<Registry>>,
    runtime: tokio::runtime::Handle,
    cancel: CancellationToken,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

/// Lock the registry, recovering from poisoning
///
/// A panicking task can poison the mutex; the registry data stays coherent
/// (state transitions and map edits are single operations), so recovery is
/// safe and keeps shutdown reachable.
fn lock(registry: &Arc<Mutex<Registry>>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ExecutionContext {
    /// Start the background worker
    ///
    /// Allocates the dedicated worker thread and its tokio runtime and
    /// transitions `Stopped -> Starting -> Running`.
    ///
    /// # Panics
    /// Panics if another `ExecutionContext` is already live in this process.
    ///
    /// # Returns
    /// * `Result<ExecutionContext>` - The running context, or an error when
    ///   the worker thread or runtime could not be created
    pub fn start() -> Result<Self> {
        if CONTEXT_LIVE.swap(true, Ordering::SeqCst) {
            panic!("an ExecutionContext is already running in this process");
        }

        let registry = Arc::new(Mutex::new(Registry {
            state: ContextState::Starting,
            tasks: HashMap::new(),
            next_id: 0,
        }));

        let (handle_tx, handle_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let spawn_result = thread::Builder::new()
            .name("bashcomp-worker".to_string())
            .spawn(move || {
                let runtime = match Builder::new_current_thread().enable_all().build() {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = handle_tx.send(Err(e));
                        return;
                    }
                };

                let _ = handle_tx.send(Ok(runtime.handle().clone()));

                // Park on the shutdown signal; spawned tasks run concurrently
                // on this same thread until then. Dropping the runtime
                // afterwards cancels whatever the shutdown sweep aborted.
                runtime.block_on(async move {
                    let _ = shutdown_rx.await;
                });
            });

        let worker = match spawn_result {
            Ok(worker) => worker,
            Err(e) => {
                CONTEXT_LIVE.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };

        let runtime = match handle_rx.recv() {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => {
                CONTEXT_LIVE.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
            Err(_) => {
                CONTEXT_LIVE.store(false, Ordering::SeqCst);
                return Err(RuntimeError::WorkerPanicked.into());
            }
        };

        lock(&registry).state = ContextState::Running;
        info!("background execution context running");

        Ok(Self {
            registry,
            runtime,
            cancel: CancellationToken::new(),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> ContextState {
        lock(&self.registry).state
    }

    /// Token cancelled when shutdown begins
    ///
    /// Long-running units of work can select on it to observe shutdown
    /// cooperatively instead of waiting to be aborted at a suspension point.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Submit one unit of work to the worker
    ///
    /// Returns immediately on every caller thread. While the context is
    /// `Running` the work is registered and scheduled; once `Stopping` has
    /// begun the work is dropped silently and `None` is returned.
    ///
    /// # Arguments
    /// * `work` - Future to run on the worker
    ///
    /// # Returns
    /// * `Option<TaskHandle>` - Cancellable handle, or `None` if dropped
    pub fn submit<F>(&self, work: F) -> Option<TaskHandle>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut registry = lock(&self.registry);
        if registry.state != ContextState::Running {
            debug!("dropping submitted work: context is shutting down");
            return None;
        }

        let id = registry.next_id;
        registry.next_id += 1;

        let deregister = Arc::clone(&self.registry);
        let join = self.runtime.spawn(async move {
            work.await;
            lock(&deregister).tasks.remove(&id);
        });

        let abort = join.abort_handle();
        registry.tasks.insert(id, abort.clone());

        Some(TaskHandle {
            id,
            registry: Arc::clone(&self.registry),
            abort,
        })
    }

    /// Shut the worker down
    ///
    /// Transitions `Running -> Stopping -> Stopped`: cancels the shared
    /// token, aborts every in-flight task, signals the worker loop and joins
    /// the worker thread.
    ///
    /// # Panics
    /// Panics if the context is not `Running` (shutting down twice is a
    /// usage error).
    ///
    /// # Returns
    /// * `Result<()>` - Ok on clean shutdown, error if the worker panicked
    pub fn shutdown(&self) -> Result<()> {
        {
            let mut registry = lock(&self.registry);
            match registry.state {
                ContextState::Running => registry.state = ContextState::Stopping,
                other => panic!("shutdown called on a context in state {other:?}"),
            }

            // Cooperative signal first, then the hard abort sweep.
            self.cancel.cancel();
            for (_, abort) in registry.tasks.drain() {
                abort.abort();
            }
        }

        let tx = self
            .shutdown_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = tx {
            let _ = tx.send(());
        }

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let result = match worker {
            Some(worker) => worker
                .join()
                .map_err(|_| RuntimeError::WorkerPanicked.into()),
            None => Ok(()),
        };

        lock(&self.registry).state = ContextState::Stopped;
        CONTEXT_LIVE.store(false, Ordering::SeqCst);
        info!("background execution context stopped");
        result
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        if lock(&self.registry).state == ContextState::Running {
            warn!("execution context dropped while running, shutting down");
            let _ = self.shutdown();
        }
    }
}

/// Serialize tests that create an `ExecutionContext`
///
/// The process-wide liveness guard allows only one live context, so tests
/// across the crate must not start contexts concurrently.
#[cfg(test)]
pub(crate) fn test_guard() -> MutexGuard<'static, ()> {
    static GUARD: Mutex<()> = Mutex::new(());
    GUARD.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::time::Duration;

    /// Sends on drop, so a receiver can observe task cancellation.
    struct DropSignal(Option<mpsc::Sender<()>>);

    impl Drop for DropSignal {
        fn drop(&mut self) {
            if let Some(tx) = self.0.take() {
                let _ = tx.send(());
            }
        }
    }

    #[test]
    fn test_submitted_work_runs() {
        let _serial = test_guard();
        let context = ExecutionContext::start().unwrap();
        assert_eq!(context.state(), ContextState::Running);

        let (tx, rx) = mpsc::channel();
        let handle = context.submit(async move {
            let _ = tx.send(42);
        });
        assert!(handle.is_some());
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);

        context.shutdown().unwrap();
        assert_eq!(context.state(), ContextState::Stopped);
    }

    #[test]
    fn test_submit_after_shutdown_is_dropped() {
        let _serial = test_guard();
        let context = ExecutionContext::start().unwrap();
        context.shutdown().unwrap();

        let handle = context.submit(async {});
        assert!(handle.is_none());
    }

    #[test]
    fn test_second_context_panics_while_one_is_live() {
        let _serial = test_guard();
        let context = ExecutionContext::start().unwrap();

        let result = catch_unwind(AssertUnwindSafe(ExecutionContext::start));
        assert!(result.is_err());

        context.shutdown().unwrap();

        // Once the first context is stopped a new one may be created.
        let next = ExecutionContext::start().unwrap();
        next.shutdown().unwrap();
    }

    #[test]
    fn test_shutdown_twice_panics() {
        let _serial = test_guard();
        let context = ExecutionContext::start().unwrap();
        context.shutdown().unwrap();

        let result = catch_unwind(AssertUnwindSafe(|| context.shutdown()));
        assert!(result.is_err());
    }

    #[test]
    fn test_shutdown_aborts_in_flight_work() {
        let _serial = test_guard();
        let context = ExecutionContext::start().unwrap();

        let (tx, rx) = mpsc::channel();
        let signal = DropSignal(Some(tx));
        context.submit(async move {
            let _signal = signal;
            std::future::pending::<()>().await;
        });

        context.shutdown().unwrap();

        // The blocked task was dropped, not left running.
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_task_handle_abort_cancels_work() {
        let _serial = test_guard();
        let context = ExecutionContext::start().unwrap();

        let (tx, rx) = mpsc::channel();
        let signal = DropSignal(Some(tx));
        let handle = context
            .submit(async move {
                let _signal = signal;
                std::future::pending::<()>().await;
            })
            .unwrap();

        handle.abort();
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());

        context.shutdown().unwrap();
    }

    #[test]
    fn test_cancellation_token_fires_on_shutdown() {
        let _serial = test_guard();
        let context = ExecutionContext::start().unwrap();
        let token = context.cancellation_token();

        let (tx, rx) = mpsc::channel();
        context.submit(async move {
            token.cancelled().await;
            let _ = tx.send(());
        });

        context.shutdown().unwrap();
        // The task observed the token or was aborted; either way it is gone.
        // The token itself must be cancelled.
        assert!(context.cancellation_token().is_cancelled());
        drop(rx);
    }
}
