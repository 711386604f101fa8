//! # gallery-fetch
//!
//! Concurrent image fetching for grid galleries.
//!
//! A fixed, ordered list of image URLs is downloaded in one of two ways:
//! - **Per item** - [`ItemFetcher`] fetches one image without blocking and calls
//!   back exactly once with the decoded image or a failure.
//! - **Batch** - [`BatchFetchCoordinator`] fetches every image concurrently and
//!   calls back exactly once, after the last fetch settles, with results in
//!   request order.
//!
//! Failures are absorbed at the fetch boundary: a missing, broken or
//! undecodable image is simply an empty slot. There is no retry, no cache and
//! no cancellation.
//!
//! ## Quick Start
//!
//! ```no_run
//! use gallery_fetch::{Config, ImageLoader, ResourceRef};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = ImageLoader::new(Config::default())?;
//!
//!     // Subscribe to events
//!     let mut events = loader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let refs = vec![
//!         ResourceRef::parse("https://example.com/a.png")?,
//!         ResourceRef::parse("https://example.com/b.png")?,
//!     ];
//!     loader.batch_coordinator().fetch_all(refs, |slots| {
//!         println!("{} of {} images loaded", slots.iter().flatten().count(), slots.len());
//!     });
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Callback execution contexts
pub mod context;
/// Image decoding and the fetch boundary
pub mod decode;
/// Error types
pub mod error;
/// Presentation-neutral gallery model
pub mod gallery;
/// Per-item and batch fetchers
pub mod loader;
/// Ordered URL source
pub mod provider;
/// Resource transports
pub mod transport;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{BatchConfig, Config, TransportConfig};
pub use context::{CallbackContext, InlineContext, UiContext, UiLoop, ui_context};
pub use error::{Error, Result};
pub use gallery::GalleryModel;
pub use loader::{BatchFetchCoordinator, ImageLoader, ItemFetcher};
pub use provider::UrlProvider;
pub use transport::{HttpTransport, Transport};
pub use types::{BatchId, BatchReport, Event, FetchResult, Image, LoadMode, Outcome, ResourceRef};
