//! Resource transport
//!
//! The fetchers depend on a single primitive: "give me the bytes behind this
//! locator". [`Transport`] is that primitive. [`HttpTransport`] implements it
//! with one unconditional HTTP GET per call; tests and embedders can plug in
//! any other source.
//!
//! ## Usage
//!
//! ```no_run
//! use gallery_fetch::transport::{HttpTransport, Transport};
//! use gallery_fetch::config::TransportConfig;
//! use gallery_fetch::ResourceRef;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpTransport::new(&TransportConfig::default())?;
//!     let resource = ResourceRef::parse("https://example.com/cat.png")?;
//!     let bytes = transport.get(&resource).await?;
//!     println!("{} bytes", bytes.len());
//!     Ok(())
//! }
//! ```

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;

use crate::types::ResourceRef;

/// Fetch the raw bytes of a resource
///
/// Implementations must not retry and must settle every call: either bytes or
/// an error. A 2xx response with a non-empty body is the only success.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Retrieve the body behind `resource`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request cannot be sent or the connection fails
    /// - The response status is not 2xx
    /// - The body is empty
    async fn get(&self, resource: &ResourceRef) -> crate::Result<Bytes>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
