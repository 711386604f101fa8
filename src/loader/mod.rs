//! Fetch orchestration split into focused submodules.
//!
//! - [`item`] - Single-resource fetching with a one-shot completion
//! - [`batch`] - Concurrent batch fetching with exactly-once batch completion
//!
//! [`ImageLoader`] owns the shared pieces (configuration, transport, callback
//! context, event channel, runtime handle) and hands out fetchers that reuse
//! them.

mod batch;
mod item;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use batch::BatchFetchCoordinator;
pub use item::ItemFetcher;

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::context::{CallbackContext, InlineContext};
use crate::error::{Error, Result};
use crate::provider::UrlProvider;
use crate::transport::{HttpTransport, Transport};
use crate::types::Event;

/// Pieces every fetcher needs (cloneable - all fields are Arc-wrapped or handles)
#[derive(Clone)]
pub(crate) struct FetchServices {
    /// Source of resource bytes
    pub(crate) transport: Arc<dyn Transport>,
    /// Where completions run
    pub(crate) context: Arc<dyn CallbackContext>,
    /// Event sink (None = events disabled)
    pub(crate) event_tx: Option<broadcast::Sender<Event>>,
    /// Runtime that fetch tasks are spawned on
    pub(crate) runtime: Handle,
}

impl FetchServices {
    /// Capture the ambient tokio runtime
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        context: Arc<dyn CallbackContext>,
    ) -> Result<Self> {
        let runtime = current_runtime()?;
        Ok(Self {
            transport,
            context,
            event_tx: None,
            runtime,
        })
    }

    /// Send an event; having no subscribers is not an error
    pub(crate) fn emit(&self, event: Event) {
        if let Some(tx) = &self.event_tx {
            tx.send(event).ok();
        }
    }
}

fn current_runtime() -> Result<Handle> {
    Handle::try_current().map_err(|e| {
        Error::Other(format!(
            "gallery-fetch must be set up inside a tokio runtime: {}",
            e
        ))
    })
}

/// Main entry point (cloneable - all fields are Arc-wrapped)
///
/// # Examples
///
/// ```no_run
/// use gallery_fetch::{Config, ImageLoader, UrlProvider};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config {
///         urls: vec![
///             "https://example.com/1.jpg".to_string(),
///             "https://example.com/2.jpg".to_string(),
///         ],
///         ..Default::default()
///     };
///     let loader = ImageLoader::new(config)?;
///     let urls = UrlProvider::from_config(loader.config())?;
///
///     let images = loader
///         .batch_coordinator()
///         .fetch_all_async(urls.into_refs())
///         .await?;
///     for (i, slot) in images.iter().enumerate() {
///         match slot {
///             Some(img) => println!("{i}: {}x{}", img.width(), img.height()),
///             None => println!("{i}: (no image)"),
///         }
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct ImageLoader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    config: Arc<Config>,
    /// Event broadcast channel sender (multiple subscribers supported)
    event_tx: broadcast::Sender<Event>,
    /// Shared fetch plumbing
    services: FetchServices,
    /// Coordinator shared by every batch this loader starts (one concurrency cap, one id sequence)
    coordinator: BatchFetchCoordinator,
}

impl ImageLoader {
    /// Create a loader with the HTTP transport and inline callbacks
    ///
    /// Must be called from within a tokio runtime; fetch tasks are spawned on it.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid, the HTTP client cannot be
    /// built, or no tokio runtime is running.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(HttpTransport::new(&config.transport)?);
        Self::with_parts(config, transport, Arc::new(InlineContext))
    }

    /// Create a loader around a custom transport and callback context
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or no tokio runtime is running.
    pub fn with_parts(
        config: Config,
        transport: Arc<dyn Transport>,
        context: Arc<dyn CallbackContext>,
    ) -> Result<Self> {
        config.validate()?;

        // Multiple subscribers receive every event independently
        let (event_tx, _rx) = broadcast::channel(config.event_buffer);

        let mut services = FetchServices::new(transport, context)?;
        services.event_tx = Some(event_tx.clone());

        let coordinator = BatchFetchCoordinator::from_services(
            services.clone(),
            config.batch.max_concurrent_fetches,
        );

        tracing::info!(
            transport = services.transport.name(),
            urls = config.urls.len(),
            mode = ?config.mode,
            max_concurrent_fetches = ?config.batch.max_concurrent_fetches,
            "image loader initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            event_tx,
            services,
            coordinator,
        })
    }

    /// Replace the callback context (e.g. with a [`UiContext`](crate::context::UiContext))
    pub fn with_context(mut self, context: Arc<dyn CallbackContext>) -> Self {
        self.services.context = Arc::clone(&context);
        self.coordinator = self.coordinator.with_context(context);
        self
    }

    /// Configuration this loader was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The configured URL list, parsed
    ///
    /// # Errors
    /// Returns `Error::InvalidUrl` for the first entry that does not parse
    pub fn url_provider(&self) -> Result<UrlProvider> {
        UrlProvider::from_config(&self.config)
    }

    /// Subscribe to fetch events
    ///
    /// Each subscriber receives all events independently. A subscriber that
    /// falls behind by more than `event_buffer` events receives
    /// `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Fetcher for per-item delivery, sharing this loader's plumbing
    pub fn item_fetcher(&self) -> ItemFetcher {
        ItemFetcher::from_services(self.services.clone())
    }

    /// Batch coordinator shared by this loader and its clones
    pub fn batch_coordinator(&self) -> BatchFetchCoordinator {
        self.coordinator.clone()
    }
}
