//! Callback execution contexts
//!
//! Completions are never run directly by the fetch task; they are handed to a
//! [`CallbackContext`], which decides where they execute. A GUI host routes
//! them to its UI thread with [`UiContext`]; headless hosts use
//! [`InlineContext`].
//!
//! ```
//! use gallery_fetch::context::{CallbackContext, ui_context};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let (ctx, mut ui_loop) = ui_context();
//! let hits = Arc::new(AtomicUsize::new(0));
//! let h = Arc::clone(&hits);
//! ctx.dispatch(Box::new(move || {
//!     h.fetch_add(1, Ordering::SeqCst);
//! }));
//!
//! // Nothing runs until the owner of the loop drains it
//! assert_eq!(hits.load(Ordering::SeqCst), 0);
//! assert_eq!(ui_loop.drain_pending(), 1);
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

use tokio::sync::mpsc;

/// A unit of work handed to a callback context
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Where completion callbacks run
pub trait CallbackContext: Send + Sync {
    /// Schedule `job` to run once on this context
    fn dispatch(&self, job: Job);
}

/// Runs jobs immediately on the task that settled the fetch
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineContext;

impl CallbackContext for InlineContext {
    fn dispatch(&self, job: Job) {
        job();
    }
}

/// Sending half of a single-consumer job queue
///
/// Cloneable and cheap; every clone feeds the same [`UiLoop`].
#[derive(Clone, Debug)]
pub struct UiContext {
    tx: mpsc::UnboundedSender<Job>,
}

/// Receiving half of a [`UiContext`], driven by the presentation layer
///
/// Jobs run serially, in dispatch order, on whichever thread or task drives
/// the loop.
#[derive(Debug)]
pub struct UiLoop {
    rx: mpsc::UnboundedReceiver<Job>,
}

/// Create a connected context/loop pair
pub fn ui_context() -> (UiContext, UiLoop) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UiContext { tx }, UiLoop { rx })
}

impl CallbackContext for UiContext {
    fn dispatch(&self, job: Job) {
        if self.tx.send(job).is_err() {
            tracing::warn!("UI loop is gone; dropping callback");
        }
    }
}

impl UiLoop {
    /// Run jobs until every `UiContext` clone has been dropped
    pub async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            job();
        }
        tracing::debug!("UI loop finished");
    }

    /// Blocking variant of [`run`](Self::run) for a dedicated OS thread
    ///
    /// # Panics
    /// Panics if called from within an async runtime.
    pub fn run_blocking(mut self) {
        while let Some(job) = self.rx.blocking_recv() {
            job();
        }
        tracing::debug!("UI loop finished");
    }

    /// Wait for and run one job; false once all senders are gone
    pub async fn run_one(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run every job already queued without waiting; returns how many ran
    pub fn drain_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }
}
