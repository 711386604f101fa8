//! Single-resource fetching

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast;

use super::FetchServices;
use crate::context::CallbackContext;
use crate::decode::fetch_image;
use crate::error::Result;
use crate::transport::Transport;
use crate::types::{Event, FetchResult, ResourceRef};

/// Fetches one resource at a time without blocking the caller
///
/// There is no cancellation: once started, a fetch always calls back. A caller
/// that lost interest (a recycled grid cell, say) must treat the late result
/// as a no-op itself.
#[derive(Clone)]
pub struct ItemFetcher {
    services: FetchServices,
}

impl ItemFetcher {
    /// Create a fetcher on the current tokio runtime
    ///
    /// # Errors
    /// Returns error if no tokio runtime is running
    pub fn new(transport: Arc<dyn Transport>, context: Arc<dyn CallbackContext>) -> Result<Self> {
        Ok(Self::from_services(FetchServices::new(transport, context)?))
    }

    pub(crate) fn from_services(services: FetchServices) -> Self {
        Self { services }
    }

    /// Publish `ItemSettled` events on `event_tx`
    pub fn with_events(mut self, event_tx: broadcast::Sender<Event>) -> Self {
        self.services.event_tx = Some(event_tx);
        self
    }

    /// Spawn fetch tasks on `runtime` instead of the one captured at construction
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.services.runtime = runtime;
        self
    }

    /// Start fetching `resource`; `on_complete` runs exactly once on the callback context
    ///
    /// Returns immediately. The callback receives `Success(image)` when the
    /// bytes were retrieved and decoded, `Failure` otherwise.
    pub fn fetch<F>(&self, resource: ResourceRef, on_complete: F)
    where
        F: FnOnce(FetchResult) + Send + 'static,
    {
        let services = self.services.clone();
        self.services.runtime.spawn(async move {
            let result = settle(&services, &resource).await;
            services
                .context
                .dispatch(Box::new(move || on_complete(result)));
        });
    }

    /// Fetch `resource` on the calling task and return the result
    pub async fn fetch_async(&self, resource: &ResourceRef) -> FetchResult {
        settle(&self.services, resource).await
    }
}

async fn settle(services: &FetchServices, resource: &ResourceRef) -> FetchResult {
    let result = fetch_image(services.transport.as_ref(), resource).await;
    services.emit(Event::ItemSettled {
        batch_id: None,
        index: None,
        url: resource.to_string(),
        outcome: result.outcome(),
    });
    result
}
