//! Concurrent batch fetching with a single completion
//!
//! Every resource of a batch is fetched on its own task. Each task writes only
//! its own slot, then decrements the shared pending counter with one atomic
//! `fetch_sub`. Exactly one task sees the counter go from 1 to 0, and only that
//! task delivers the batch. An empty batch is delivered straight away.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::{Semaphore, broadcast, oneshot};

use super::FetchServices;
use crate::context::{CallbackContext, InlineContext};
use crate::decode::fetch_image;
use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::types::{BatchId, BatchReport, Event, Image, ResourceRef};

type BatchCompletion = Box<dyn FnOnce(Vec<Option<Image>>) + Send + 'static>;

/// Fetches a fixed list of resources concurrently and reports once, in request order
///
/// Clones share the batch id sequence and the concurrency cap.
#[derive(Clone)]
pub struct BatchFetchCoordinator {
    services: FetchServices,
    /// Bounds in-flight requests across all batches of this coordinator (None = unbounded)
    limit: Option<Arc<Semaphore>>,
    next_batch_id: Arc<AtomicU64>,
}

impl BatchFetchCoordinator {
    /// Create an unbounded coordinator on the current tokio runtime
    ///
    /// # Errors
    /// Returns error if no tokio runtime is running
    pub fn new(transport: Arc<dyn Transport>, context: Arc<dyn CallbackContext>) -> Result<Self> {
        Ok(Self::from_services(
            FetchServices::new(transport, context)?,
            None,
        ))
    }

    pub(crate) fn from_services(services: FetchServices, max_in_flight: Option<usize>) -> Self {
        Self {
            services,
            limit: max_in_flight.map(|n| Arc::new(Semaphore::new(n))),
            next_batch_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Allow at most `max_in_flight` requests at once
    ///
    /// # Errors
    /// Returns `Error::Config` if `max_in_flight` is zero
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Result<Self> {
        if max_in_flight == 0 {
            return Err(Error::config(
                "batch.max_concurrent_fetches",
                "max_concurrent_fetches must be greater than zero when set",
            ));
        }
        self.limit = Some(Arc::new(Semaphore::new(max_in_flight)));
        Ok(self)
    }

    /// Publish batch and item events on `event_tx`
    pub fn with_events(mut self, event_tx: broadcast::Sender<Event>) -> Self {
        self.services.event_tx = Some(event_tx);
        self
    }

    /// Spawn fetch tasks on `runtime` instead of the one captured at construction
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.services.runtime = runtime;
        self
    }

    /// Same cap and id sequence, completions routed to `context`
    pub(crate) fn with_context(mut self, context: Arc<dyn CallbackContext>) -> Self {
        self.services.context = context;
        self
    }

    /// Fetch every resource concurrently; `on_batch_complete` runs exactly once
    ///
    /// The callback runs on the callback context after the last fetch has
    /// settled, with one slot per resource in request order. Failed fetches
    /// leave their slot `None`. An empty `refs` completes immediately.
    ///
    /// Batches are independent: each call owns its slots and counter.
    pub fn fetch_all<F>(&self, refs: Vec<ResourceRef>, on_batch_complete: F) -> BatchId
    where
        F: FnOnce(Vec<Option<Image>>) + Send + 'static,
    {
        self.launch(
            refs,
            Box::new(on_batch_complete),
            Arc::clone(&self.services.context),
        )
    }

    /// Fetch every resource concurrently and await the ordered slots
    ///
    /// Same semantics as [`fetch_all`](Self::fetch_all), but the result is
    /// returned to the awaiting task instead of going through the callback context.
    ///
    /// # Errors
    /// Returns error if the runtime shut down before the batch settled
    pub async fn fetch_all_async(&self, refs: Vec<ResourceRef>) -> Result<Vec<Option<Image>>> {
        let (tx, rx) = oneshot::channel();
        let batch_id = self.launch(
            refs,
            Box::new(move |slots| {
                tx.send(slots).ok();
            }),
            Arc::new(InlineContext),
        );
        rx.await
            .map_err(|_| Error::Other(format!("batch {} was abandoned before settling", batch_id)))
    }

    fn launch(
        &self,
        refs: Vec<ResourceRef>,
        on_complete: BatchCompletion,
        context: Arc<dyn CallbackContext>,
    ) -> BatchId {
        let batch_id = BatchId(self.next_batch_id.fetch_add(1, Ordering::Relaxed) + 1);
        let total = refs.len();

        tracing::info!(batch_id = batch_id.0, total, "starting batch");
        self.services.emit(Event::BatchStarted { batch_id, total });

        let batch = Arc::new(Batch::new(batch_id, total, on_complete, context));

        if total == 0 {
            batch.finish(&self.services);
            return batch_id;
        }

        for (index, resource) in refs.into_iter().enumerate() {
            let batch = Arc::clone(&batch);
            let services = self.services.clone();
            let limit = self.limit.clone();
            self.services.runtime.spawn(async move {
                let result = {
                    // Semaphore is never closed, so acquire only fails if that changes
                    let _permit = match limit {
                        Some(sem) => sem.acquire_owned().await.ok(),
                        None => None,
                    };
                    fetch_image(services.transport.as_ref(), &resource).await
                };

                services.emit(Event::ItemSettled {
                    batch_id: Some(batch_id),
                    index: Some(index),
                    url: resource.to_string(),
                    outcome: result.outcome(),
                });

                if let Some(image) = result.into_image() {
                    batch.fill(index, image);
                }
                if batch.settle_one() {
                    batch.finish(&services);
                }
            });
        }

        batch_id
    }
}

/// State of one in-flight batch
struct Batch {
    id: BatchId,
    /// One slot per resource; each written at most once, by its own task
    slots: Vec<OnceLock<Image>>,
    /// Fetches not yet settled
    pending: AtomicUsize,
    started: Instant,
    /// Taken by the single task that drains `pending`
    on_complete: Mutex<Option<BatchCompletion>>,
    context: Arc<dyn CallbackContext>,
}

impl Batch {
    fn new(
        id: BatchId,
        total: usize,
        on_complete: BatchCompletion,
        context: Arc<dyn CallbackContext>,
    ) -> Self {
        Self {
            id,
            slots: (0..total).map(|_| OnceLock::new()).collect(),
            pending: AtomicUsize::new(total),
            started: Instant::now(),
            on_complete: Mutex::new(Some(on_complete)),
            context,
        }
    }

    fn fill(&self, index: usize, image: Image) {
        if self.slots[index].set(image).is_err() {
            tracing::error!(batch_id = self.id.0, index, "slot written twice; keeping first image");
        }
    }

    /// Record one settled fetch; true for exactly one caller, the last
    fn settle_one(&self) -> bool {
        // AcqRel: the last decrement must observe every earlier slot write
        self.pending.fetch_sub(1, Ordering::AcqRel) == 1
    }

    fn finish(&self, services: &FetchServices) {
        let slots: Vec<Option<Image>> = self.slots.iter().map(|s| s.get().cloned()).collect();
        let succeeded = slots.iter().filter(|s| s.is_some()).count();
        let report = BatchReport {
            batch_id: self.id,
            total: slots.len(),
            succeeded,
            failed: slots.len() - succeeded,
            elapsed_ms: millis(self.started.elapsed()),
        };

        tracing::info!(
            batch_id = self.id.0,
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            elapsed_ms = report.elapsed_ms,
            "batch complete"
        );

        let on_complete = self
            .on_complete
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match on_complete {
            Some(callback) => {
                services.emit(Event::BatchComplete(report));
                self.context.dispatch(Box::new(move || callback(slots)));
            }
            None => {
                tracing::error!(batch_id = self.id.0, "batch completion already delivered");
            }
        }
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
