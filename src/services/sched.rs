//! Task scheduling helpers: background spawning, delayed execution,
//! and call debouncing.

use crate::error::Result;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Spawn a task without waiting for it; failures are logged
pub fn run_in_background<F>(future: F)
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(error) = future.await {
            tracing::warn!("Background task failed: {}", error);
        }
    });
}

/// Run a task after a delay, without blocking the caller.
///
/// There is no cancellation handle: once scheduled, the task runs.
pub fn run_after<F>(delay: Duration, future: F)
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    run_in_background(async move {
        tokio::time::sleep(delay).await;
        future.await
    });
}

/// Collapses bursts of calls within a window to the last call.
///
/// Each call schedules its task to run after the window elapses and
/// aborts the previous call if that one is still waiting out its
/// window. A task that made it past the window withdraws its handle
/// before running, so started work is never cancelled.
pub struct Debouncer {
    window: Duration,
    generation: AtomicU64,
    pending: Arc<Mutex<Option<(u64, JoinHandle<()>)>>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: AtomicU64::new(0),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Schedule `future` to run after the window, cancelling a
    /// previously scheduled call that has not started yet
    pub fn call<F>(&self, future: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let window = self.window;
        let slot = Arc::clone(&self.pending);

        let mut pending = self.pending.lock().unwrap();
        if let Some((_, handle)) = pending.take() {
            handle.abort();
        }
        *pending = Some((
            generation,
            tokio::spawn(async move {
                tokio::time::sleep(window).await;
                // Window elapsed: leave the slot so later calls cannot
                // abort this task. A newer generation may already own
                // the slot; leave that one alone.
                {
                    let mut pending = slot.lock().unwrap();
                    if pending.as_ref().map(|(gen, _)| *gen) == Some(generation) {
                        pending.take();
                    }
                }
                if let Err(error) = future.await {
                    tracing::warn!("Debounced call failed: {}", error);
                }
            }),
        ));
    }
}
