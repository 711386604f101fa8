//! Image decoding and the fetch boundary
//!
//! [`fetch_image`] is where transport and decode errors stop: every outcome
//! becomes a [`FetchResult`], and the cause of a failure is only logged.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::error::Result;
use crate::transport::Transport;
use crate::types::{FetchResult, Image, ResourceRef};

/// Decode an encoded image (format guessed from the bytes)
///
/// # Errors
/// Returns `Error::Decode` if the bytes are not a supported image
pub fn decode_image(bytes: &[u8]) -> Result<Image> {
    let decoded = image::load_from_memory(bytes)?;
    Ok(Image::new(decoded))
}

/// Fetch and decode one resource, collapsing every failure to `Failure`
///
/// Settles exactly once. A panicking transport or decoder is caught and
/// settles as `Failure` too, so a completion waiting on this call is never
/// stranded. Decoding runs on tokio's blocking pool so large images do not
/// hold up the worker threads driving other fetches.
pub async fn fetch_image(transport: &dyn Transport, resource: &ResourceRef) -> FetchResult {
    let fetched = AssertUnwindSafe(transport.get(resource))
        .catch_unwind()
        .await;

    let bytes = match fetched {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            tracing::warn!(url = %resource, transport = transport.name(), error = %e, "image fetch failed");
            return FetchResult::Failure;
        }
        Err(_) => {
            tracing::error!(url = %resource, transport = transport.name(), "image fetch panicked");
            return FetchResult::Failure;
        }
    };

    match tokio::task::spawn_blocking(move || decode_image(&bytes)).await {
        Ok(Ok(image)) => {
            tracing::debug!(
                url = %resource,
                width = image.width(),
                height = image.height(),
                "image fetched"
            );
            FetchResult::Success(image)
        }
        Ok(Err(e)) => {
            tracing::warn!(url = %resource, error = %e, "image decode failed");
            FetchResult::Failure
        }
        Err(e) => {
            tracing::error!(url = %resource, error = %e, "image decode task panicked");
            FetchResult::Failure
        }
    }
}
